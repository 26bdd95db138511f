use std::net::SocketAddr;

use crate::codec::CodecError;
use crate::wire::RequestHeader;

/// Function ids understood by the service
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u32)]
pub enum Function {
    /// List the ids of all flights between a source and a destination
    ///
    /// Body: source string, destination string.
    ListFlights = 1,

    /// Get departure time, price and free seat count of a flight
    ///
    /// Body: flight id.
    GetFlightById = 2,

    /// Reserve up to `count` seats on a flight
    ///
    /// Body: flight id, count. The response lists the seats actually
    /// reserved, which may be fewer than requested.
    ReserveFlight = 3,

    /// Receive seat count notifications for a flight until a deadline
    ///
    /// Body: flight id, end time in epoch seconds (`i64`).
    SubscribeFlightById = 4,

    /// List the seats the caller holds on a flight
    ///
    /// Body: flight id.
    GetSeatsById = 5,

    /// Give back one of the caller's seats
    ///
    /// Body: flight id, seat number.
    RefundSeatBySeatNum = 6,
}

impl Function {
    /// All functions in id order
    pub const ALL: [Function; 6] = [
        Function::ListFlights,
        Function::GetFlightById,
        Function::ReserveFlight,
        Function::SubscribeFlightById,
        Function::GetSeatsById,
        Function::RefundSeatBySeatNum,
    ];

    /// The numeric function id
    #[inline]
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Look up a function by its numeric id
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.id() == id)
    }
}

/// A datagram received from a client
///
/// 📌 The service interacts with instances of this struct; the transport
/// behind it is hidden in a [`RawRequest`].
pub struct Request {
    sender: String,
    payload: Vec<u8>,
    raw: Box<dyn RawRequest + Send>,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("sender", &self.sender)
            .field("len", &self.payload.len())
            .field("raw", &format_args!(".."))
            .finish()
    }
}

/// Interface for serving requests
///
/// 📌 The engine's `Balancer` implements this trait.
pub trait RequestHandler {
    /// Handle one request and respond to it
    fn handle(&self, request: Request);

    /// Shut the service down
    ///
    /// Waits for all threads spawned by the service to terminate.
    fn shutdown(self);
}

/// The transport side of a request
///
/// 📌 Implemented by the UDP server and by the in-process test transport.
pub trait RawRequest {
    /// Address the datagram came from, if the transport has one
    fn origin(&self) -> Option<SocketAddr>;

    /// Send `response` back to the sender as one datagram
    fn respond(self: Box<Self>, sender: &str, response: Vec<u8>);
}

impl Request {
    /// Textual address of the sender, also used as the caller's identity
    #[inline]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// The full datagram payload
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The request id, if the payload is long enough to carry one
    pub fn request_id(&self) -> Option<u32> {
        let bytes = self.payload.get(..4)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Decode the request id and function id
    pub fn header(&self) -> Result<RequestHeader, CodecError> {
        RequestHeader::decode(&self.payload)
    }

    /// The payload after the request id and function id
    pub fn body(&self) -> &[u8] {
        self.payload.get(RequestHeader::LEN..).unwrap_or(&[])
    }

    /// Address the datagram came from, if known
    #[inline]
    pub fn origin(&self) -> Option<SocketAddr> {
        self.raw.origin()
    }

    /// Send `response` back to the sender
    #[inline]
    pub fn respond(self, response: Vec<u8>) {
        self.raw.respond(&self.sender, response);
    }

    /// Create a new request from a [`RawRequest`]
    #[inline]
    pub fn from_raw(
        sender: impl Into<String>,
        payload: Vec<u8>,
        raw: Box<dyn RawRequest + Send>,
    ) -> Self {
        Self {
            sender: sender.into(),
            payload,
            raw,
        }
    }
}
