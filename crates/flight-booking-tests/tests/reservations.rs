use eyre::Result;
use flight_booking_core::Status;
use flight_booking_tests::TestCtxBuilder;
use futures::future::join_all;
use nanorand::Rng;

mod util;
use util::{assert_distinct, assert_failed};

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_over_request_returns_what_is_left() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?.with_seats(10).build().await?;
    let mut alice = ctx.api.create_user_session().await?;

    assert_eq!(alice.reserve(3, 4).await?.result?, vec![0, 1, 2, 3]);

    let partial = alice.reserve(3, 20).await?;
    assert_eq!(partial.status, Status::Created);
    assert_eq!(partial.result?, vec![4, 5, 6, 7, 8, 9]);

    assert_failed(&alice.reserve(3, 1).await?, Status::Conflict);
    assert_eq!(alice.my_seats(3).await?.result?.len(), 10);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_invalid_reservations() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?.build().await?;
    let mut alice = ctx.api.create_user_session().await?;

    // zero seats is rejected before the store is touched
    assert_failed(&alice.reserve(2, 0).await?, Status::BadRequest);
    assert_eq!(alice.get_flight(2).await?.result?.seats_left, 100);

    assert_failed(&alice.reserve(999, 1).await?, Status::NotFound);
    assert_failed(&alice.get_flight(999).await?, Status::NotFound);
    assert_failed(&alice.my_seats(999).await?, Status::NotFound);

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(20_000)]
async fn test_refund() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?.build().await?;
    let mut alice = ctx.api.create_user_session().await?;
    let mut bob = ctx.api.create_user_session().await?;

    let seats = alice.reserve(4, 3).await?.result?;
    assert_eq!(seats, vec![0, 1, 2]);

    assert_failed(&bob.refund(4, 1).await?, Status::Unauthorized);
    assert_failed(&alice.refund(4, 50).await?, Status::BadRequest);
    assert_failed(&alice.refund(4, 5_000).await?, Status::BadRequest);
    assert_failed(&alice.refund(999, 1).await?, Status::NotFound);

    let refunded = alice.refund(4, 1).await?;
    assert_eq!(refunded.status, Status::Created);
    assert_eq!(refunded.result?, vec![0, 2]);
    assert_eq!(alice.get_flight(4).await?.result?.seats_left, 98);

    // already free now
    assert_failed(&alice.refund(4, 1).await?, Status::BadRequest);

    // the freed seat is the next one handed out
    assert_eq!(bob.reserve(4, 1).await?.result?, vec![1]);
    assert_eq!(bob.my_seats(4).await?.result?, vec![1]);
    assert!(ctx.seat_count_consistent(4));

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn test_seat_count_stays_consistent() -> Result<()> {
    let seats = 30;
    let ctx = TestCtxBuilder::from_env()?.with_seats(seats).build().await?;
    let mut sessions = Vec::new();
    for _ in 0..4 {
        sessions.push(ctx.api.create_user_session().await?);
    }

    let mut rng = nanorand::tls_rng();
    for _ in 0..200 {
        let session = &mut sessions[rng.generate_range(0usize..4)];
        if rng.generate_range(0u32..3) == 0 {
            let held = session.my_seats(7).await?.result?;
            if !held.is_empty() {
                let seat = held[rng.generate_range(0..held.len())];
                session.refund(7, seat).await?.result?;
            }
        } else {
            let _ = session.reserve(7, rng.generate_range(1u32..5)).await?;
        }
        assert!(ctx.seat_count_consistent(7));
    }

    let mut held = Vec::new();
    for session in &mut sessions {
        held.extend(session.my_seats(7).await?.result?);
    }
    assert_distinct(&held);
    let left = sessions[0].get_flight(7).await?.result?.seats_left;
    assert_eq!(left as usize, seats as usize - held.len());

    ctx.finish().await;
    Ok(())
}

#[tokio::test]
#[ntest::timeout(30_000)]
async fn test_concurrent_reservations_never_oversell() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?.build().await?;
    let mut sessions = Vec::new();
    for _ in 0..20 {
        sessions.push(ctx.api.create_user_session().await?);
    }

    let responses = join_all(sessions.iter_mut().map(|s| s.reserve(8, 7))).await;

    let mut sold = Vec::new();
    let mut conflicts = 0;
    for response in responses {
        match response?.result {
            Ok(seats) => sold.extend(seats),
            Err(err) => {
                assert_eq!(err.status, Status::Conflict);
                conflicts += 1;
            }
        }
    }
    assert_eq!(sold.len(), 100);
    assert_distinct(&sold);
    // 14 full requests, one partial, five left empty-handed
    assert_eq!(conflicts, 5);
    assert_eq!(sessions[0].get_flight(8).await?.result?.seats_left, 0);

    ctx.finish().await;
    Ok(())
}
