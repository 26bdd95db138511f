//! Request, response and notification framing

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::codec::{CodecError, Decoder, Encoder};
use crate::error::{ServiceError, Status};

/// `[requestId][functionId]` prefix of every request
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RequestHeader {
    /// Client chosen id, echoed in the response
    pub request_id: u32,
    /// Selects the handler
    pub function_id: u32,
}

impl RequestHeader {
    /// Encoded length in bytes
    pub const LEN: usize = 8;

    /// Decode the header from the front of `payload`
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        let mut dec = Decoder::new(payload);
        Ok(Self {
            request_id: dec.u32()?,
            function_id: dec.u32()?,
        })
    }

    /// Encode the header followed by `body`
    pub fn encode(&self, body: &[u8]) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(Self::LEN + body.len());
        enc.put_u32(self.request_id)
            .put_u32(self.function_id)
            .put_raw(body);
        enc.finish()
    }
}

/// Build `[requestId][status][body]`
pub fn response(request_id: u32, status: Status, body: &[u8]) -> Vec<u8> {
    let mut enc = Encoder::with_capacity(8 + body.len());
    enc.put_u32(request_id).put_u32(status.code()).put_raw(body);
    enc.finish()
}

/// Build `[requestId][status][message]` for a failed request
pub fn error_response(request_id: u32, err: &ServiceError) -> Vec<u8> {
    let mut body = Encoder::new();
    body.put_str(&err.to_string());
    response(request_id, err.status(), &body.finish())
}

/// A decoded response
#[derive(Clone, PartialEq, Debug)]
pub struct ResponseFrame<'a> {
    /// Echoed request id
    pub request_id: u32,
    /// Raw status code
    pub status: u32,
    /// Everything after the status code
    pub body: &'a [u8],
}

impl<'a> ResponseFrame<'a> {
    /// Split a response into its parts
    pub fn decode(bytes: &'a [u8]) -> Result<Self, CodecError> {
        let mut dec = Decoder::new(bytes);
        let request_id = dec.u32()?;
        let status = dec.u32()?;
        Ok(Self {
            request_id,
            status,
            body: dec.rest(),
        })
    }
}

/// Unsolicited seat count push: `[tag][flightId][seatsLeft]`
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Notification {
    /// Magic word identifying a push datagram
    pub tag: u32,
    /// Flight whose seat count changed
    pub flight: u32,
    /// Free seats after the change
    pub seats_left: u32,
}

impl Notification {
    /// Encoded length in bytes
    pub const LEN: usize = 12;

    /// Encode the notification
    pub fn encode(&self) -> Vec<u8> {
        let mut enc = Encoder::with_capacity(Self::LEN);
        enc.put_u32(self.tag)
            .put_u32(self.flight)
            .put_u32(self.seats_left);
        enc.finish()
    }

    /// Decode a notification
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut dec = Decoder::new(bytes);
        Ok(Self {
            tag: dec.u32()?,
            flight: dec.u32()?,
            seats_left: dec.u32()?,
        })
    }
}

/// Seconds since the Unix epoch, negative before it
pub fn to_unix_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

/// Instant `secs` seconds after (or before) the Unix epoch
pub fn from_unix_secs(secs: i64) -> SystemTime {
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_layout() {
        let bytes = error_response(7, &ServiceError::NotFound);
        let frame = ResponseFrame::decode(&bytes).unwrap();
        assert_eq!(frame.request_id, 7);
        assert_eq!(frame.status, 404);
        assert_eq!(Decoder::new(frame.body).string().unwrap(), "NotFound");
    }

    #[test]
    fn unix_secs_before_epoch() {
        assert_eq!(to_unix_secs(from_unix_secs(-90)), -90);
        assert_eq!(to_unix_secs(from_unix_secs(1_700_000_000)), 1_700_000_000);
    }

    #[test]
    fn header_needs_eight_bytes() {
        assert!(RequestHeader::decode(&[0, 0, 0, 1, 0, 0]).is_err());
    }
}
