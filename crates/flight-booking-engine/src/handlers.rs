//! The six flight operations
//!
//! Each handler decodes its body, runs one store transaction and encodes the
//! response body. Domain failures come back as [`ServiceError`] and are
//! turned into status-coded responses by the balancer.

use std::time::SystemTime;

use flight_booking_core::wire::{from_unix_secs, to_unix_secs};
use flight_booking_core::{Decoder, Encoder, Function, ServiceError, Status};
use tracing::debug;

use crate::database::Database;
use crate::dispatcher::Dispatcher;
use crate::flight::Subscription;
use crate::notifier::Notifier;

/// What a handler may touch while serving one request
pub struct Context<'a> {
    pub database: &'a Database,
    pub notifier: &'a Notifier,
    /// Sender address of the request; doubles as buyer and listener identity
    pub caller: &'a str,
}

/// Successful handler result, prefixed with request id and status on the wire
#[derive(Clone, PartialEq, Debug)]
pub struct Reply {
    pub status: Status,
    pub body: Vec<u8>,
}

impl Reply {
    fn ok(body: Encoder) -> Self {
        Self {
            status: Status::Ok,
            body: body.finish(),
        }
    }

    fn created(body: Encoder) -> Self {
        Self {
            status: Status::Created,
            body: body.finish(),
        }
    }
}

pub type HandlerResult = Result<Reply, ServiceError>;

/// Register all six operations under their function ids.
pub fn register_all(dispatcher: &mut Dispatcher) {
    dispatcher.register(Function::ListFlights.id(), list_flights);
    dispatcher.register(Function::GetFlightById.id(), get_flight);
    dispatcher.register(Function::ReserveFlight.id(), reserve_seats);
    dispatcher.register(Function::SubscribeFlightById.id(), subscribe);
    dispatcher.register(Function::GetSeatsById.id(), list_my_seats);
    dispatcher.register(Function::RefundSeatBySeatNum.id(), refund_seat);
}

/// Ids of all flights from source to destination; no match is `NotFound`.
pub fn list_flights(body: &mut Decoder<'_>, ctx: &Context<'_>) -> HandlerResult {
    let source = body.string()?;
    let destination = body.string()?;

    let txn = ctx.database.read();
    let ids: Vec<u32> = txn
        .by_route(&source, &destination)
        .iter()
        .map(|f| f.id)
        .collect();
    if ids.is_empty() {
        return Err(ServiceError::NotFound);
    }

    let mut out = Encoder::new();
    out.put_u32_array(&ids);
    Ok(Reply::ok(out))
}

pub fn get_flight(body: &mut Decoder<'_>, ctx: &Context<'_>) -> HandlerResult {
    let id = body.u32()?;

    let txn = ctx.database.read();
    let flight = txn.get(id).ok_or(ServiceError::NotFound)?;

    let mut out = Encoder::with_capacity(20);
    out.put_i64(to_unix_secs(flight.departure))
        .put_f64(flight.price)
        .put_u32(flight.seats_left());
    Ok(Reply::ok(out))
}

/// Reserve up to `count` seats.
///
/// Claims whatever is free, even if that is fewer than requested; claiming
/// nothing is a `Conflict`. Subscribers are told the new count after commit.
pub fn reserve_seats(body: &mut Decoder<'_>, ctx: &Context<'_>) -> HandlerResult {
    let id = body.u32()?;
    let count = body.u32()?;
    if count == 0 {
        return Err(ServiceError::bad_request("seat count must be positive"));
    }

    let mut txn = ctx.database.write();
    let flight = txn.get_mut(id).ok_or(ServiceError::NotFound)?;
    let claimed = flight.reserve(count, ctx.caller);
    if claimed.is_empty() {
        return Err(ServiceError::Conflict);
    }
    let seats_left = flight.seats_left();
    let subscriptions = flight.subscriptions().to_vec();
    txn.commit();

    debug!(flight = id, requested = count, claimed = claimed.len(), seats_left, "reserved seats");
    ctx.notifier.publish(id, seats_left, subscriptions);

    let mut out = Encoder::new();
    out.put_u32_array(&claimed);
    Ok(Reply::created(out))
}

/// Add a subscription; duplicates are kept and expire independently.
pub fn subscribe(body: &mut Decoder<'_>, ctx: &Context<'_>) -> HandlerResult {
    let id = body.u32()?;
    let end_time = from_unix_secs(body.i64()?);

    let mut txn = ctx.database.write();
    let flight = txn.get_mut(id).ok_or(ServiceError::NotFound)?;
    flight.prune_subscriptions(SystemTime::now());
    flight.subscribe(Subscription {
        listener: ctx.caller.to_owned(),
        end_time,
    });
    txn.commit();

    let mut out = Encoder::with_capacity(4);
    out.put_u32(id);
    Ok(Reply::created(out))
}

pub fn list_my_seats(body: &mut Decoder<'_>, ctx: &Context<'_>) -> HandlerResult {
    let id = body.u32()?;

    let txn = ctx.database.read();
    let flight = txn.get(id).ok_or(ServiceError::NotFound)?;

    let mut out = Encoder::new();
    out.put_u32_array(&flight.seats_of(ctx.caller));
    Ok(Reply::ok(out))
}

/// Free one of the caller's seats and return the seats they still hold.
pub fn refund_seat(body: &mut Decoder<'_>, ctx: &Context<'_>) -> HandlerResult {
    let id = body.u32()?;
    let seat = body.u32()?;

    let mut txn = ctx.database.write();
    let flight = txn.get(id).ok_or(ServiceError::NotFound)?;
    match flight.seat(seat) {
        Some(s) if s.is_held_by(ctx.caller) => {}
        Some(s) if !s.is_free() => return Err(ServiceError::Unauthorized),
        _ => {
            return Err(ServiceError::bad_request(format!(
                "seat {seat} is not reserved"
            )))
        }
    }

    let flight = txn.get_mut(id).ok_or(ServiceError::NotFound)?;
    flight.release(seat);
    let remaining = flight.seats_of(ctx.caller);
    txn.commit();

    let mut out = Encoder::new();
    out.put_u32_array(&remaining);
    Ok(Reply::created(out))
}
