use std::collections::HashSet;

use flight_booking_core::Status;
use flight_booking_tests::ApiResponse;

/// Asserts that a request failed with `status`.
#[allow(unused)]
pub fn assert_failed<T>(response: &ApiResponse<T>, status: Status) {
    assert_eq!(response.status, status);
    match &response.result {
        Ok(_) => panic!("request must fail with {status:?}"),
        Err(err) => assert_eq!(err.status, status),
    }
}

/// Asserts that no seat number occurs twice.
#[allow(unused)]
pub fn assert_distinct(seats: &[u32]) {
    let unique: HashSet<u32> = seats.iter().copied().collect();
    assert_eq!(unique.len(), seats.len(), "seat numbers must be distinct: {seats:?}");
}
