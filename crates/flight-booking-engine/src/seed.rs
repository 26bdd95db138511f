//! Flights loaded on every start
use std::time::{Duration, SystemTime};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::flight::Flight;

/// Routes of the seeded flights; flight `i + 1` flies `ROUTES[i]`
pub const ROUTES: [(&str, &str); 21] = [
    ("CDG", "HND"),
    ("BKK", "CUN"),
    ("FCO", "BCN"),
    ("LHR", "SYD"),
    ("DXB", "JFK"),
    ("HND", "CDG"),
    ("CUN", "DXB"),
    ("JFK", "LHR"),
    ("BCN", "FCO"),
    ("SYD", "BKK"),
    ("CDG", "JFK"),
    ("BKK", "SYD"),
    ("FCO", "DXB"),
    ("LHR", "BCN"),
    ("DXB", "HND"),
    ("SYD", "CUN"),
    ("JFK", "CDG"),
    ("BCN", "LHR"),
    ("HND", "BKK"),
    ("CUN", "FCO"),
    ("SYD", "BKK"),
];

const MAX_DEPARTURE_HOURS: u64 = 24_000;
const MAX_PRICE: f64 = 2_000.0;

/// Build the seeded flights, each with `capacity` free seats.
///
/// Departure times and prices are random; pass `seed` to make them
/// reproducible.
pub fn flights(capacity: u32, seed: Option<u64>) -> Vec<Flight> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let now = SystemTime::now();

    ROUTES
        .iter()
        .zip(1u32..)
        .map(|((source, destination), id)| {
            let hours = rng.gen_range(0..MAX_DEPARTURE_HOURS);
            let departure = now + Duration::from_secs(hours * 3600);
            let price = rng.gen::<f64>() * MAX_PRICE;
            Flight::new(id, *source, *destination, departure, price, capacity)
        })
        .collect()
}
