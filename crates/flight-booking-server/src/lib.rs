//! Datagram transport for the flight booking service

#![warn(missing_docs)]

pub mod udp;
