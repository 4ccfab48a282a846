use super::model::{CacheId, Reservation};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// In-memory table of live reservations, keyed by cache id.
///
/// Ids come from an atomic counter starting at 1 and are never handed out
/// twice. A reservation is fully built before it is inserted, so readers
/// either see the whole record or nothing.
#[derive(Debug)]
pub struct ReservationTable {
    next_id: AtomicU64,
    reservations: RwLock<HashMap<CacheId, Arc<Reservation>>>,
}

impl Default for ReservationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservationTable {
    pub fn new() -> Self {
        ReservationTable {
            next_id: AtomicU64::new(1),
            reservations: RwLock::new(HashMap::new()),
        }
    }

    pub async fn allocate(&self, reservation: Reservation) -> CacheId {
        let id = CacheId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut reservations = self.reservations.write().await;
        reservations.insert(id, Arc::new(reservation));
        id
    }

    pub async fn get(&self, id: CacheId) -> Option<Arc<Reservation>> {
        let reservations = self.reservations.read().await;
        reservations.get(&id).cloned()
    }

    pub async fn delete(&self, id: CacheId) -> Option<Arc<Reservation>> {
        let mut reservations = self.reservations.write().await;
        reservations.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.reservations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.reservations.read().await.is_empty()
    }
}
