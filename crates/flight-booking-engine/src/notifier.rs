//! Implementation of the seat count notifier
//!
//! A fixed pool of worker threads drains an unbounded channel of sweeps. A
//! sweep pushes one datagram to every subscriber that has not expired at send
//! time. Publishing never blocks, and a failed send is logged and forgotten.

use std::io;
use std::net::{ToSocketAddrs, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::SystemTime;

use crossbeam::channel::{unbounded, Receiver, Sender};
use flight_booking_core::wire::Notification;
use tracing::{debug, warn};

use crate::flight::Subscription;

struct Sweep {
    flight: u32,
    seats_left: u32,
    subscriptions: Vec<Subscription>,
}

/// Fire-and-forget fan-out of seat count changes
pub struct Notifier {
    sender: Sender<Sweep>,
    workers: Vec<JoinHandle<()>>,
}

impl Notifier {
    /// Start `threads` workers, each with its own ephemeral UDP socket.
    pub fn new(threads: u32, tag: u32) -> io::Result<Self> {
        let (sender, receiver) = unbounded();
        let workers = (0..threads.max(1))
            .map(|i| {
                let socket = UdpSocket::bind("0.0.0.0:0")?;
                let receiver = receiver.clone();
                thread::Builder::new()
                    .name(format!("notifier_{i}"))
                    .spawn(move || run(socket, receiver, tag))
            })
            .collect::<io::Result<Vec<_>>>()?;
        Ok(Self { sender, workers })
    }

    /// Schedule a sweep over `subscriptions`; returns immediately.
    pub fn publish(&self, flight: u32, seats_left: u32, subscriptions: Vec<Subscription>) {
        if subscriptions.is_empty() {
            return;
        }
        let sweep = Sweep {
            flight,
            seats_left,
            subscriptions,
        };
        // Only fails once every worker is gone, i.e. during shutdown.
        if self.sender.send(sweep).is_err() {
            warn!(flight, "notifier stopped, dropping seat count update");
        }
    }

    /// Send every queued sweep, then stop the workers.
    pub fn shutdown(self) {
        drop(self.sender);
        for worker in self.workers {
            let _ = worker.join();
        }
    }
}

fn run(socket: UdpSocket, receiver: Receiver<Sweep>, tag: u32) {
    for sweep in receiver.iter() {
        let datagram = Notification {
            tag,
            flight: sweep.flight,
            seats_left: sweep.seats_left,
        }
        .encode();

        let now = SystemTime::now();
        for sub in sweep.subscriptions.iter().filter(|s| s.is_active_at(now)) {
            match send(&socket, &sub.listener, &datagram) {
                Ok(()) => debug!(listener = %sub.listener, flight = sweep.flight, "sent notification"),
                Err(err) => {
                    warn!(listener = %sub.listener, flight = sweep.flight, %err, "failed to send notification")
                }
            }
        }
    }
}

fn send(socket: &UdpSocket, listener: &str, datagram: &[u8]) -> io::Result<()> {
    let addr = listener
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "address did not resolve"))?;
    socket.send_to(datagram, addr)?;
    Ok(())
}
