//! 🏗 UDP transport
//!
//! A receive thread tags every datagram with its sender and pushes it onto a
//! bounded queue. When the queue is full the receive thread blocks; that is
//! the only back-pressure. A single consumer drains the queue in order and
//! hands each datagram to the [`RequestHandler`].

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use flight_booking_core::{Encoder, RawRequest, Request, RequestHandler, Status};
use tracing::{debug, info, warn};

/// Largest payload a UDP datagram can carry
const MAX_DATAGRAM: usize = 65_507;

/// How often the receive thread checks for shutdown
const POLL_INTERVAL: Duration = Duration::from_millis(100);

struct Datagram {
    origin: SocketAddr,
    payload: Vec<u8>,
}

struct UdpRequest {
    socket: Arc<UdpSocket>,
    origin: SocketAddr,
}

impl RawRequest for UdpRequest {
    fn origin(&self) -> Option<SocketAddr> {
        Some(self.origin)
    }

    fn respond(self: Box<Self>, sender: &str, response: Vec<u8>) {
        let (addr, datagram) = match resolve(sender) {
            Ok(addr) => (addr, response),
            Err(err) => {
                warn!(%sender, %err, "cannot resolve sender, answering origin with 400");
                (self.origin, resolution_failure(&response))
            }
        };
        if let Err(err) = self.socket.send_to(&datagram, addr) {
            warn!(%addr, %err, "failed to send response");
        }
    }
}

fn resolve(sender: &str) -> io::Result<SocketAddr> {
    sender
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "address did not resolve"))
}

/// `[requestId][400]`, keeping the request id of `response`
fn resolution_failure(response: &[u8]) -> Vec<u8> {
    let mut enc = Encoder::with_capacity(8);
    enc.put_raw(response.get(..4).unwrap_or(&[0u8; 4][..]))
        .put_u32(Status::BadRequest.code());
    enc.finish()
}

/// Stops a running [`UdpServer::serve`]
#[derive(Clone)]
pub struct ShutdownHandle(flume::Sender<()>);

impl ShutdownHandle {
    /// Ask the server to stop receiving
    pub fn shutdown(&self) {
        let _ = self.0.try_send(());
    }
}

/// Datagram server bound to one socket
pub struct UdpServer {
    socket: Arc<UdpSocket>,
    queue_capacity: usize,
    shutdown_sender: flume::Sender<()>,
    shutdown_receiver: flume::Receiver<()>,
}

impl UdpServer {
    /// Bind the socket
    pub fn bind(addr: impl ToSocketAddrs, queue_capacity: usize) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        let (shutdown_sender, shutdown_receiver) = flume::bounded(1);
        Ok(Self {
            socket: Arc::new(socket),
            queue_capacity: queue_capacity.max(1),
            shutdown_sender,
            shutdown_receiver,
        })
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Handle that stops [`UdpServer::serve`] from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(self.shutdown_sender.clone())
    }

    /// Serve requests until shut down
    ///
    /// Requests still queued at shutdown are handled before this returns.
    pub fn serve<H: RequestHandler>(&self, handler: &H) -> io::Result<()> {
        info!(addr = %self.local_addr()?, "serving datagrams");
        let (sender, receiver) = flume::bounded::<Datagram>(self.queue_capacity);

        thread::scope(|s| {
            thread::Builder::new()
                .name("udp_ingress".into())
                .spawn_scoped(s, move || self.ingress(sender))?;

            for datagram in receiver.iter() {
                let raw = Box::new(UdpRequest {
                    socket: self.socket.clone(),
                    origin: datagram.origin,
                });
                handler.handle(Request::from_raw(
                    datagram.origin.to_string(),
                    datagram.payload,
                    raw,
                ));
            }
            Ok(())
        })
    }

    /// Receive loop; exits on shutdown and drops `queue` so the consumer ends
    fn ingress(&self, queue: flume::Sender<Datagram>) {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        while self.shutdown_receiver.try_recv().is_err() {
            match self.socket.recv_from(&mut buf) {
                Ok((n, origin)) => {
                    debug!(%origin, len = n, "received datagram");
                    let datagram = Datagram {
                        origin,
                        payload: buf[..n].to_vec(),
                    };
                    if queue.send(datagram).is_err() {
                        break;
                    }
                }
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) => {}
                Err(err) => warn!(%err, "receive failed"),
            }
        }
        info!("receive loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_failure_keeps_request_id() {
        let out = resolution_failure(&[0, 0, 0, 9, 0, 0, 0, 200, 1, 2]);
        assert_eq!(out, vec![0, 0, 0, 9, 0, 0, 1, 144]);
    }

    #[test]
    fn unresolvable_sender() {
        assert!(resolve("not an address").is_err());
        assert_eq!(
            resolve("127.0.0.1:9000").unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
    }
}
