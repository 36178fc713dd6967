//! Server-side seat map sessions.
//!
//! Each opened seat map lives under a random id until it sits idle past the
//! configured timeout. Toggles on one session are serialized by its mutex.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::domain::SeatId;
use crate::store::BookingStore;

use super::state::{CheckoutHandoff, ProceedError, SeatMap, SeatMapInputs, Toggle};

/// Session store configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long an untouched session is kept.
    pub idle_timeout: Duration,

    /// Maximum number of live sessions.
    pub max_sessions: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30 * 60),
            max_sessions: 10_000,
        }
    }
}

/// Live seat maps keyed by session id.
#[derive(Clone)]
pub struct SeatMapSessions {
    maps: MokaCache<Uuid, Arc<Mutex<SeatMap>>>,
}

impl SeatMapSessions {
    pub fn new(config: &SessionConfig) -> Self {
        let maps = MokaCache::builder()
            .time_to_idle(config.idle_timeout)
            .max_capacity(config.max_sessions)
            .build();
        Self { maps }
    }

    /// Store an already-built map under a fresh id.
    pub async fn insert(&self, map: SeatMap) -> Uuid {
        let id = Uuid::new_v4();
        self.maps.insert(id, Arc::new(Mutex::new(map))).await;
        id
    }

    /// Load reservations and open a new session.
    pub async fn open(&self, store: &dyn BookingStore, inputs: SeatMapInputs) -> (Uuid, SeatMap) {
        let map = SeatMap::load(store, inputs).await;
        let id = self.insert(map.clone()).await;
        debug!(session = %id, bus_id = ?map.bus_id(), "seat map session opened");
        (id, map)
    }

    /// Snapshot of a session, or `None` if it expired or never existed.
    pub async fn get(&self, id: &Uuid) -> Option<SeatMap> {
        let entry = self.maps.get(id).await?;
        let map = entry.lock().await;
        Some(map.clone())
    }

    /// Toggle one seat and return the new state.
    pub async fn toggle(&self, id: &Uuid, seat: SeatId) -> Option<(SeatMap, Toggle)> {
        let entry = self.maps.get(id).await?;
        let mut guard = entry.lock().await;
        let (next, outcome) = guard.clone().toggle(seat);
        *guard = next;
        debug!(session = %id, %seat, ?outcome, "seat toggled");
        Some((guard.clone(), outcome))
    }

    /// Remove a session and return its final state.
    ///
    /// Waits for a toggle already holding the session to finish. Of two
    /// concurrent calls only one gets the map.
    pub async fn take(&self, id: &Uuid) -> Option<SeatMap> {
        let entry = self.maps.remove(id).await?;
        let map = entry.lock().await.clone();
        Some(map)
    }

    /// Hand a session off to checkout, consuming it.
    ///
    /// A rejected proceed leaves the session in place under the same id.
    pub async fn proceed(&self, id: &Uuid) -> Option<Result<CheckoutHandoff, ProceedError>> {
        let map = self.take(id).await?;
        match map.proceed() {
            Ok(handoff) => {
                debug!(session = %id, seats = handoff.seats.len(), "seat map handed off");
                Some(Ok(handoff))
            }
            Err(e) => {
                self.maps.insert(*id, Arc::new(Mutex::new(map))).await;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BusId, Fare};
    use crate::seatmap::SeatState;
    use crate::store::fixtures;

    fn inputs() -> SeatMapInputs {
        SeatMapInputs::new(
            Some(BusId::parse("bus-1").unwrap()),
            Some(fixtures::date()),
            Fare::from_minor(50_000),
        )
    }

    fn seat(s: &str) -> SeatId {
        SeatId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn open_and_toggle() {
        let sessions = SeatMapSessions::new(&SessionConfig::default());
        let store = fixtures::store();

        let (id, map) = sessions.open(&store, inputs()).await;
        assert_eq!(map.state_of(&seat("A1")), Some(SeatState::Reserved));

        let (map, outcome) = sessions.toggle(&id, seat("C3")).await.unwrap();
        assert_eq!(outcome, Toggle::Selected);
        assert_eq!(map.total(), Fare::from_minor(50_000));

        let (_, outcome) = sessions.toggle(&id, seat("A1")).await.unwrap();
        assert_eq!(outcome, Toggle::Rejected);

        let snapshot = sessions.get(&id).await.unwrap();
        assert_eq!(snapshot.selected_count(), 1);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let sessions = SeatMapSessions::new(&SessionConfig::default());
        let store = fixtures::store();
        let (a, _) = sessions.open(&store, inputs()).await;
        let (b, _) = sessions.open(&store, inputs()).await;
        assert_ne!(a, b);

        sessions.toggle(&a, seat("D1")).await.unwrap();
        assert_eq!(sessions.get(&b).await.unwrap().selected_count(), 0);
    }

    #[tokio::test]
    async fn unknown_sessions() {
        let sessions = SeatMapSessions::new(&SessionConfig::default());
        assert!(sessions.get(&Uuid::new_v4()).await.is_none());
        assert!(sessions.toggle(&Uuid::new_v4(), seat("A1")).await.is_none());

        assert!(sessions.take(&Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn proceed_consumes_session() {
        let sessions = SeatMapSessions::new(&SessionConfig::default());
        let (id, _) = sessions.open(&fixtures::store(), inputs()).await;

        let rejected = sessions.proceed(&id).await.unwrap();
        assert_eq!(rejected.unwrap_err(), ProceedError::EmptySelection);
        assert!(sessions.get(&id).await.is_some());

        sessions.toggle(&id, seat("C3")).await.unwrap();
        let handoff = sessions.proceed(&id).await.unwrap().unwrap();
        assert_eq!(handoff.seats, vec![seat("C3")]);
        assert!(sessions.get(&id).await.is_none());
        assert!(sessions.toggle(&id, seat("C4")).await.is_none());
        assert!(sessions.proceed(&id).await.is_none());
    }

    #[tokio::test]
    async fn concurrent_proceeds_hand_off_once() {
        let sessions = SeatMapSessions::new(&SessionConfig::default());
        let (id, _) = sessions.open(&fixtures::store(), inputs()).await;
        sessions.toggle(&id, seat("D1")).await.unwrap();

        let (a, b) = tokio::join!(sessions.proceed(&id), sessions.proceed(&id));
        let handed_off = [a, b].into_iter().filter(|r| matches!(r, Some(Ok(_)))).count();
        assert_eq!(handed_off, 1);
    }

    #[tokio::test]
    async fn take_returns_latest_state() {
        let sessions = SeatMapSessions::new(&SessionConfig::default());
        let (id, _) = sessions.open(&fixtures::store(), inputs()).await;
        sessions.toggle(&id, seat("E2")).await.unwrap();

        let taken = sessions.take(&id).await.unwrap();
        assert_eq!(taken.state_of(&seat("E2")), Some(SeatState::Selected));
        assert!(sessions.take(&id).await.is_none());
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let sessions = SeatMapSessions::new(&SessionConfig {
            idle_timeout: Duration::from_millis(50),
            max_sessions: 10,
        });
        let (id, _) = sessions.open(&fixtures::store(), inputs()).await;
        assert!(sessions.get(&id).await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(sessions.get(&id).await.is_none());
    }
}
