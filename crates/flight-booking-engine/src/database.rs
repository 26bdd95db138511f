//! Implementation of the in-memory flight store
//!
//! Committed state is an immutable [`FlightTable`] snapshot behind an
//! [`Arc`]. Readers clone the `Arc` and never block writers. A writer works
//! on its own copy of the table in which only the flights it touches are
//! cloned (copy-on-write via [`Arc::make_mut`]), then publishes the copy on
//! commit. Dropping a [`WriteTxn`] without committing discards the copy, so
//! an aborted transaction never leaves a partial update behind.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::flight::Flight;

/// A committed version of all flights
#[derive(Clone, Default, Debug)]
pub struct FlightTable {
    flights: BTreeMap<u32, Arc<Flight>>,
    /// Secondary index: (source, destination) -> ascending flight ids
    routes: BTreeMap<(String, String), Vec<u32>>,
}

impl FlightTable {
    fn insert(&mut self, flight: Flight) {
        let key = (flight.source.clone(), flight.destination.clone());
        let ids = self.routes.entry(key).or_default();
        if let Err(pos) = ids.binary_search(&flight.id) {
            ids.insert(pos, flight.id);
        }
        self.flights.insert(flight.id, Arc::new(flight));
    }
}

/// Implementation of the central flight store
pub struct Database {
    committed: RwLock<Arc<FlightTable>>,
    /// Held for the whole lifetime of a [`WriteTxn`]
    writer: Mutex<()>,
}

impl Database {
    /// Create a new [`Database`] holding `flights`.
    pub fn new(flights: impl IntoIterator<Item = Flight>) -> Self {
        let mut table = FlightTable::default();
        for flight in flights {
            table.insert(flight);
        }
        Self {
            committed: RwLock::new(Arc::new(table)),
            writer: Mutex::new(()),
        }
    }

    /// Open a read-only transaction on the latest committed snapshot.
    pub fn read(&self) -> ReadTxn {
        ReadTxn {
            snapshot: self.committed.read().clone(),
        }
    }

    /// Open a read-write transaction.
    ///
    /// Blocks while another read-write transaction is open.
    pub fn write(&self) -> WriteTxn<'_> {
        let guard = self.writer.lock();
        let working = FlightTable::clone(&self.committed.read());
        WriteTxn {
            database: self,
            _guard: guard,
            working,
        }
    }

    /// Number of flights in the store.
    pub fn len(&self) -> usize {
        self.committed.read().flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only view of one committed snapshot
pub struct ReadTxn {
    snapshot: Arc<FlightTable>,
}

impl ReadTxn {
    pub fn get(&self, id: u32) -> Option<&Flight> {
        self.snapshot.flights.get(&id).map(|f| &**f)
    }

    /// All flights in ascending id order.
    pub fn flights(&self) -> impl Iterator<Item = &Flight> {
        self.snapshot.flights.values().map(|f| &**f)
    }

    /// Flights flying from `source` to `destination`, ascending by id.
    pub fn by_route(&self, source: &str, destination: &str) -> Vec<&Flight> {
        self.snapshot
            .routes
            .get(&(source.to_owned(), destination.to_owned()))
            .map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }
}

/// Exclusive read-write transaction
///
/// Changes become visible to readers only through [`WriteTxn::commit`].
pub struct WriteTxn<'a> {
    database: &'a Database,
    _guard: MutexGuard<'a, ()>,
    working: FlightTable,
}

impl WriteTxn<'_> {
    pub fn get(&self, id: u32) -> Option<&Flight> {
        self.working.flights.get(&id).map(|f| &**f)
    }

    /// Mutable access to a flight; clones it on first write.
    pub fn get_mut(&mut self, id: u32) -> Option<&mut Flight> {
        self.working.flights.get_mut(&id).map(Arc::make_mut)
    }

    /// Publish all changes atomically.
    pub fn commit(self) {
        *self.database.committed.write() = Arc::new(self.working);
    }

    /// Discard all changes.
    pub fn abort(self) {}
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use super::*;

    fn database() -> Database {
        Database::new([
            Flight::new(1, "CDG", "HND", UNIX_EPOCH, 10.0, 4),
            Flight::new(2, "BKK", "CUN", UNIX_EPOCH, 20.0, 4),
            Flight::new(3, "CDG", "HND", UNIX_EPOCH, 30.0, 4),
        ])
    }

    #[test]
    fn abort_leaves_store_untouched() {
        let db = database();
        let mut txn = db.write();
        txn.get_mut(1).unwrap().reserve(3, "alice");
        txn.abort();

        assert_eq!(db.read().get(1).unwrap().seats_left(), 4);
    }

    #[test]
    fn reader_keeps_its_snapshot() {
        let db = database();
        let before = db.read();

        let mut txn = db.write();
        txn.get_mut(1).unwrap().reserve(1, "alice");
        assert_eq!(db.read().get(1).unwrap().seats_left(), 4);
        txn.commit();

        assert_eq!(before.get(1).unwrap().seats_left(), 4);
        assert_eq!(db.read().get(1).unwrap().seats_left(), 3);
    }

    #[test]
    fn untouched_flights_are_shared() {
        let db = database();
        let before = db.read();
        let mut txn = db.write();
        txn.get_mut(1).unwrap().reserve(1, "alice");
        txn.commit();

        let after = db.read();
        assert!(Arc::ptr_eq(
            &before.snapshot.flights[&2],
            &after.snapshot.flights[&2]
        ));
        assert!(!Arc::ptr_eq(
            &before.snapshot.flights[&1],
            &after.snapshot.flights[&1]
        ));
    }

    #[test]
    fn route_index_is_ordered() {
        let db = database();
        let read = db.read();
        let ids: Vec<u32> = read.by_route("CDG", "HND").iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(read.by_route("HND", "CDG").is_empty());
        assert_eq!(read.flights().count(), 3);
    }
}
