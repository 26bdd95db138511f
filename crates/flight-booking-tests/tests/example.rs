use eyre::Result;
use flight_booking_core::Status;
use flight_booking_tests::TestCtxBuilder;

mod util;
use util::{assert_distinct, assert_failed};

#[tokio::test] // Every test function needs to be decorated with this attribute
#[ntest::timeout(20_000)] // Test timeout in ms
async fn test_example() -> Result<()> {
    // Every seeded flight starts with 100 free seats
    let ctx = TestCtxBuilder::from_env()?.build().await?;

    let mut alice = ctx.api.create_user_session().await?;
    let mut bob = ctx.api.create_user_session().await?;
    let mut carol = ctx.api.create_user_session().await?;

    let first = alice.reserve(1, 5).await?;
    assert_eq!(first.status, Status::Created);
    let first = first.result?;
    assert_eq!(first.len(), 5);
    assert_distinct(&first);
    assert_eq!(alice.get_flight(1).await?.result?.seats_left, 95);

    // Asking for more than is left hands out the rest
    let rest = bob.reserve(1, 200).await?.result?;
    assert_eq!(rest.len(), 95);
    let mut all = first.clone();
    all.extend(&rest);
    assert_distinct(&all);
    assert_eq!(bob.get_flight(1).await?.result?.seats_left, 0);

    let sold_out = carol.reserve(1, 1).await?;
    assert_failed(&sold_out, Status::Conflict);

    assert_eq!(alice.my_seats(1).await?.result?, first);
    assert!(ctx.seat_count_consistent(1));

    // Finish the test
    ctx.finish().await;
    Ok(())
}
