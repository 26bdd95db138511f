//! Same flows as the other suites, always over a real socket

use std::time::{Duration, SystemTime};

use eyre::Result;
use flight_booking_core::wire::{Notification, RequestHeader};
use flight_booking_core::{Encoder, Function, Status};
use flight_booking_tests::{parse_response, TestCtxBuilder, Transport};

mod util;
use util::{assert_distinct, assert_failed};

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_booking_over_udp() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?
        .with_transport(Transport::Udp)
        .build()
        .await?;
    let mut alice = ctx.api.create_user_session().await?;
    let mut bob = ctx.api.create_user_session().await?;

    assert_eq!(alice.list_flights("FCO", "BCN").await?.result?, vec![3]);

    let seats = alice.reserve(3, 4).await?.result?;
    assert_eq!(seats.len(), 4);
    assert_distinct(&seats);
    assert_eq!(bob.get_flight(3).await?.result?.seats_left, 96);

    assert_failed(&bob.refund(3, seats[0]).await?, Status::Unauthorized);
    assert_eq!(alice.refund(3, seats[0]).await?.result?, seats[1..].to_vec());
    assert_eq!(bob.get_flight(3).await?.result?.seats_left, 97);
    assert!(ctx.seat_count_consistent(3));

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_replay_over_udp() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?
        .with_transport(Transport::Udp)
        .build()
        .await?;
    let mut alice = ctx.api.create_user_session().await?;

    let mut body = Encoder::new();
    body.put_u32(2).put_u32(3);
    let body = body.finish();
    let id = Function::ReserveFlight.id();

    let first = alice.call_with_id(77, id, &body).await?;
    let second = alice.call_with_id(77, id, &body).await?;
    assert_eq!(first, second);
    let seats = parse_response(&first, 77, |d| d.u32_array())?.result?;
    assert_eq!(seats, vec![0, 1, 2]);
    assert_eq!(alice.get_flight(2).await?.result?.seats_left, 97);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_notifications_over_udp() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?
        .with_transport(Transport::Udp)
        .build()
        .await?;
    let mut watcher = ctx.api.create_user_session().await?;
    let mut buyer = ctx.api.create_user_session().await?;

    watcher
        .subscribe(15, SystemTime::now() + Duration::from_secs(60))
        .await?
        .result?;
    buyer.reserve(15, 6).await?.result?;

    let n = watcher
        .next_notification(Duration::from_secs(3))
        .await?
        .expect("notification");
    assert_eq!(
        n,
        Notification {
            tag: ctx.notification_tag,
            flight: 15,
            seats_left: 94,
        }
    );

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_short_header_over_udp() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?
        .with_transport(Transport::Udp)
        .build()
        .await?;
    let mut alice = ctx.api.create_user_session().await?;

    // request id present, function id cut short
    let bytes = alice.send_raw(vec![0, 0, 0, 9, 0, 1]).await?;
    assert_eq!(&bytes[..4], &[0, 0, 0, 9]);
    let response = parse_response(&bytes, 9, |_| Ok(()))?;
    assert_failed(&response, Status::BadRequest);

    let header = RequestHeader {
        request_id: 10,
        function_id: Function::GetFlightById.id(),
    };
    let bytes = alice.send_raw(header.encode(&1u32.to_be_bytes())).await?;
    assert_eq!(parse_response(&bytes, 10, |d| d.i64())?.status, Status::Ok);

    ctx.finish().await;
    Ok(())
}
