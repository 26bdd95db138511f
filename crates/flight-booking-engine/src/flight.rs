//! Flights, seats and subscriptions
use std::collections::BTreeMap;
use std::time::SystemTime;

/// State of a single seat
///
/// The buyer only exists while the seat is reserved.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Seat {
    Free,
    Reserved { buyer: String },
}

impl Seat {
    pub fn is_free(&self) -> bool {
        matches!(self, Seat::Free)
    }

    pub fn is_held_by(&self, identity: &str) -> bool {
        matches!(self, Seat::Reserved { buyer } if buyer == identity)
    }
}

/// A listener that wants seat count pushes until `end_time`
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Subscription {
    pub listener: String,
    pub end_time: SystemTime,
}

impl Subscription {
    /// Expired subscriptions are kept but never notified
    pub fn is_active_at(&self, now: SystemTime) -> bool {
        now < self.end_time
    }
}

/// A flight with its seat map
///
/// `seats_left` always equals the number of free seats; it only changes
/// through [`Flight::reserve`] and [`Flight::release`].
#[derive(Clone, Debug)]
pub struct Flight {
    pub id: u32,
    pub source: String,
    pub destination: String,
    pub departure: SystemTime,
    pub price: f64,
    seats_left: u32,
    /// Seat numbers are dense in `0..capacity`; the ordered map gives
    /// reservations a deterministic, ascending seat order.
    seats: BTreeMap<u32, Seat>,
    subscriptions: Vec<Subscription>,
}

impl Flight {
    /// Create a flight with `capacity` free seats
    pub fn new(
        id: u32,
        source: impl Into<String>,
        destination: impl Into<String>,
        departure: SystemTime,
        price: f64,
        capacity: u32,
    ) -> Self {
        Self {
            id,
            source: source.into(),
            destination: destination.into(),
            departure,
            price,
            seats_left: capacity,
            seats: (0..capacity).map(|n| (n, Seat::Free)).collect(),
            subscriptions: Vec::new(),
        }
    }

    pub fn seats_left(&self) -> u32 {
        self.seats_left
    }

    pub fn seat(&self, number: u32) -> Option<&Seat> {
        self.seats.get(&number)
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn serves(&self, source: &str, destination: &str) -> bool {
        self.source == source && self.destination == destination
    }

    /// Reserve up to `count` free seats for `buyer`, lowest numbers first
    ///
    /// Returns the seats claimed, which may be fewer than `count`.
    pub fn reserve(&mut self, count: u32, buyer: &str) -> Vec<u32> {
        let mut claimed = Vec::with_capacity(count.min(self.seats_left) as usize);
        for (number, seat) in self.seats.iter_mut() {
            if claimed.len() as u32 == count {
                break;
            }
            if seat.is_free() {
                *seat = Seat::Reserved {
                    buyer: buyer.to_owned(),
                };
                claimed.push(*number);
            }
        }
        self.seats_left -= claimed.len() as u32;
        claimed
    }

    /// Free a reserved seat
    ///
    /// Returns `false` if the seat does not exist or is already free.
    pub fn release(&mut self, number: u32) -> bool {
        match self.seats.get_mut(&number) {
            Some(seat) if !seat.is_free() => {
                *seat = Seat::Free;
                self.seats_left += 1;
                true
            }
            _ => false,
        }
    }

    /// Seat numbers reserved by `identity`, ascending
    pub fn seats_of(&self, identity: &str) -> Vec<u32> {
        self.seats
            .iter()
            .filter(|(_, seat)| seat.is_held_by(identity))
            .map(|(number, _)| *number)
            .collect()
    }

    pub fn subscribe(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Drop subscriptions that expired before `now`
    pub fn prune_subscriptions(&mut self, now: SystemTime) {
        self.subscriptions.retain(|s| s.is_active_at(now));
    }

    /// Number of free seats counted from the seat map
    pub fn count_free(&self) -> u32 {
        self.seats.values().filter(|s| s.is_free()).count() as u32
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    fn flight(capacity: u32) -> Flight {
        Flight::new(1, "CDG", "HND", UNIX_EPOCH, 100.0, capacity)
    }

    #[test]
    fn reserve_takes_lowest_free_seats() {
        let mut f = flight(5);
        assert_eq!(f.reserve(2, "alice"), vec![0, 1]);
        assert!(f.release(0));
        assert_eq!(f.reserve(2, "bob"), vec![0, 2]);
        assert_eq!(f.seats_left(), 2);
        assert_eq!(f.seats_left(), f.count_free());
    }

    #[test]
    fn release_of_free_seat_fails() {
        let mut f = flight(3);
        assert!(!f.release(1));
        assert!(!f.release(7));
        assert_eq!(f.seats_left(), 3);
    }

    #[test]
    fn prune_keeps_live_subscriptions() {
        let mut f = flight(1);
        let now = UNIX_EPOCH + Duration::from_secs(100);
        f.subscribe(Subscription {
            listener: "a".into(),
            end_time: now - Duration::from_secs(1),
        });
        f.subscribe(Subscription {
            listener: "b".into(),
            end_time: now + Duration::from_secs(1),
        });
        f.prune_subscriptions(now);
        assert_eq!(f.subscriptions().len(), 1);
        assert_eq!(f.subscriptions()[0].listener, "b");
    }
}
