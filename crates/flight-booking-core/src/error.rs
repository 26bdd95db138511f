use thiserror::Error;

use crate::codec::CodecError;

/// Outcome code carried in the second word of every response
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u32)]
pub enum Status {
    /// Read succeeded
    Ok = 200,
    /// Write succeeded
    Created = 201,
    /// Malformed request, unroutable function id or invalid seat state
    BadRequest = 400,
    /// Caller does not own the seat
    Unauthorized = 401,
    /// Flight (or route) does not exist
    NotFound = 404,
    /// No seat left to reserve
    Conflict = 409,
}

impl Status {
    /// Numeric code as sent on the wire
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Parse a numeric code
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            200 => Status::Ok,
            201 => Status::Created,
            400 => Status::BadRequest,
            401 => Status::Unauthorized,
            404 => Status::NotFound,
            409 => Status::Conflict,
            _ => return None,
        })
    }

    /// Whether this code reports success
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Ok | Status::Created)
    }
}

/// Domain error returned by a handler
///
/// Each variant maps to exactly one [`Status`]; callers pick the status by
/// kind through [`ServiceError::status()`].
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum ServiceError {
    /// The flight (or route) does not exist
    #[error("NotFound")]
    NotFound,
    /// No free seat was left to reserve
    #[error("Conflict")]
    Conflict,
    /// The seat is reserved by somebody else
    #[error("Unauthorized")]
    Unauthorized,
    /// Malformed body, unroutable function or invalid seat state
    #[error("BadRequest: {0}")]
    BadRequest(String),
}

impl ServiceError {
    /// Status code reported for this error
    pub fn status(&self) -> Status {
        match self {
            ServiceError::NotFound => Status::NotFound,
            ServiceError::Conflict => Status::Conflict,
            ServiceError::Unauthorized => Status::Unauthorized,
            ServiceError::BadRequest(_) => Status::BadRequest,
        }
    }

    /// Shorthand for [`ServiceError::BadRequest`]
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ServiceError::BadRequest(msg.into())
    }
}

impl From<CodecError> for ServiceError {
    fn from(err: CodecError) -> Self {
        ServiceError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_errors_are_bad_requests() {
        let err: ServiceError = CodecError::Utf8.into();
        assert_eq!(err.status(), Status::BadRequest);
    }

    #[test]
    fn codes_round_trip() {
        for status in [
            Status::Ok,
            Status::Created,
            Status::BadRequest,
            Status::Unauthorized,
            Status::NotFound,
            Status::Conflict,
        ] {
            assert_eq!(Status::from_code(status.code()), Some(status));
        }
        assert_eq!(Status::from_code(500), None);
    }
}
