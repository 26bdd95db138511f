use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::{Duration, SystemTime};

use eyre::{eyre, Result};
use flight_booking_core::wire::{self, Notification, RequestHeader, ResponseFrame};
use flight_booking_core::{CodecError, Decoder, Encoder, Function, Status};
use nanorand::Rng;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::debug;

pub mod mock;
pub mod udp;

/// How long a session waits for a response datagram
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
#[error("Error {}: {msg}", .status.code())]
pub struct ApiError {
    pub status: Status,
    pub msg: String,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

pub struct ApiResponse<T> {
    pub request_id: u32,
    pub status: Status,
    pub result: ApiResult<T>,
}

/// Departure, price and free seats of a flight
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FlightInfo {
    pub departure: i64,
    pub price: f64,
    pub seats_left: u32,
}

struct RequestMsg {
    sender: String,
    payload: Vec<u8>,
    response_channel: oneshot::Sender<Vec<u8>>,
}

enum Msg {
    Request(RequestMsg),
    Stop,
}

#[derive(Clone)]
enum Link {
    /// Channel to the in-process consumer
    Mock(flume::Sender<Msg>),
    /// Address of the UDP server
    Udp(SocketAddr),
}

/// Entry point for creating client sessions
#[derive(Clone)]
pub struct Api {
    link: Link,
}

impl Api {
    fn new(link: Link) -> Self {
        Self { link }
    }

    /// Create a client with its own UDP socket
    ///
    /// The socket address is the client's identity: it owns the seats it
    /// reserves and receives notifications for its subscriptions.
    pub async fn create_user_session(&self) -> Result<UserSession> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let identity = socket.local_addr()?.to_string();
        Ok(UserSession {
            link: self.link.clone(),
            socket,
            identity,
            next_request_id: nanorand::tls_rng().generate_range(1_000u32..1_000_000),
            notifications: VecDeque::new(),
        })
    }
}

pub struct UserSession {
    link: Link,
    socket: UdpSocket,
    identity: String,
    next_request_id: u32,
    notifications: VecDeque<Notification>,
}

impl UserSession {
    /// Address the service sees as sender of this session's requests
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn next_request_id(&mut self) -> u32 {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        id
    }

    /// Send a raw payload and wait for the raw response
    pub async fn send_raw(&mut self, payload: Vec<u8>) -> Result<Vec<u8>> {
        match self.link.clone() {
            Link::Mock(channel) => {
                let (sender, receiver) = oneshot::channel();
                let msg = RequestMsg {
                    sender: self.identity.clone(),
                    payload,
                    response_channel: sender,
                };
                channel.send_async(Msg::Request(msg)).await?;
                Ok(timeout(RESPONSE_TIMEOUT, receiver).await??)
            }
            Link::Udp(server) => {
                self.socket.send_to(&payload, server).await?;
                let expected = payload.get(..4);
                let mut buf = vec![0u8; 65_536];
                loop {
                    let (n, from) = timeout(RESPONSE_TIMEOUT, self.socket.recv_from(&mut buf)).await??;
                    let datagram = &buf[..n];
                    if from != server {
                        self.stash_notification(datagram);
                    } else if datagram.get(..4) == expected {
                        return Ok(datagram.to_vec());
                    }
                }
            }
        }
    }

    /// Send `body` to `function_id` under an explicit request id
    pub async fn call_with_id(
        &mut self,
        request_id: u32,
        function_id: u32,
        body: &[u8],
    ) -> Result<Vec<u8>> {
        let header = RequestHeader {
            request_id,
            function_id,
        };
        self.send_raw(header.encode(body)).await
    }

    async fn call<T>(
        &mut self,
        function: Function,
        body: Encoder,
        decode: impl FnOnce(&mut Decoder<'_>) -> std::result::Result<T, CodecError>,
    ) -> Result<ApiResponse<T>> {
        let request_id = self.next_request_id();
        let bytes = self
            .call_with_id(request_id, function.id(), &body.finish())
            .await?;
        parse_response(&bytes, request_id, decode)
    }

    pub async fn list_flights(
        &mut self,
        source: &str,
        destination: &str,
    ) -> Result<ApiResponse<Vec<u32>>> {
        let mut body = Encoder::new();
        body.put_str(source).put_str(destination);
        self.call(Function::ListFlights, body, |d| d.u32_array())
            .await
    }

    pub async fn get_flight(&mut self, id: u32) -> Result<ApiResponse<FlightInfo>> {
        let mut body = Encoder::new();
        body.put_u32(id);
        self.call(Function::GetFlightById, body, |d| {
            Ok(FlightInfo {
                departure: d.i64()?,
                price: d.f64()?,
                seats_left: d.u32()?,
            })
        })
        .await
    }

    pub async fn reserve(&mut self, id: u32, count: u32) -> Result<ApiResponse<Vec<u32>>> {
        let mut body = Encoder::new();
        body.put_u32(id).put_u32(count);
        self.call(Function::ReserveFlight, body, |d| d.u32_array())
            .await
    }

    pub async fn subscribe(&mut self, id: u32, until: SystemTime) -> Result<ApiResponse<u32>> {
        let mut body = Encoder::new();
        body.put_u32(id).put_i64(wire::to_unix_secs(until));
        self.call(Function::SubscribeFlightById, body, |d| d.u32())
            .await
    }

    pub async fn my_seats(&mut self, id: u32) -> Result<ApiResponse<Vec<u32>>> {
        let mut body = Encoder::new();
        body.put_u32(id);
        self.call(Function::GetSeatsById, body, |d| d.u32_array())
            .await
    }

    pub async fn refund(&mut self, id: u32, seat: u32) -> Result<ApiResponse<Vec<u32>>> {
        let mut body = Encoder::new();
        body.put_u32(id).put_u32(seat);
        self.call(Function::RefundSeatBySeatNum, body, |d| d.u32_array())
            .await
    }

    /// Wait up to `wait` for the next seat count notification
    pub async fn next_notification(&mut self, wait: Duration) -> Result<Option<Notification>> {
        if let Some(n) = self.notifications.pop_front() {
            return Ok(Some(n));
        }
        let mut buf = vec![0u8; 65_536];
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let received = tokio::time::timeout_at(deadline, self.socket.recv_from(&mut buf)).await;
            let Ok(received) = received else {
                return Ok(None);
            };
            let (n, from) = received?;
            if matches!(self.link, Link::Udp(server) if server == from) {
                // late response to an earlier request
                continue;
            }
            self.stash_notification(&buf[..n]);
            if let Some(n) = self.notifications.pop_front() {
                return Ok(Some(n));
            }
        }
    }

    fn stash_notification(&mut self, datagram: &[u8]) {
        match Notification::decode(datagram) {
            Ok(n) if datagram.len() == Notification::LEN => self.notifications.push_back(n),
            _ => debug!(len = datagram.len(), "dropping stray datagram"),
        }
    }
}

/// Split a response into status and decoded body
pub fn parse_response<T>(
    bytes: &[u8],
    request_id: u32,
    decode: impl FnOnce(&mut Decoder<'_>) -> std::result::Result<T, CodecError>,
) -> Result<ApiResponse<T>> {
    let frame = ResponseFrame::decode(bytes)?;
    if frame.request_id != request_id {
        return Err(eyre!(
            "response carries request id {} instead of {request_id}",
            frame.request_id
        ));
    }
    let status = Status::from_code(frame.status)
        .ok_or_else(|| eyre!("unknown status code {}", frame.status))?;

    let mut body = Decoder::new(frame.body);
    let result = if status.is_success() {
        Ok(decode(&mut body)?)
    } else {
        Err(ApiError {
            status,
            msg: body.string().unwrap_or_default(),
        })
    };
    Ok(ApiResponse {
        request_id,
        status,
        result,
    })
}
