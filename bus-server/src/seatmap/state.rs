//! The seat map state machine.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{BusId, Fare, SeatId, SeatLayout, format_travel_date};

use crate::store::BookingStore;

use super::load::{LoadedReservations, ReservationSet, ReservationSource, load_reservations};

/// Classification of one seat.
///
/// `Reserved` is fixed when the map opens and absorbs every toggle.
/// `Available` and `Selected` flip on toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatState {
    Available,
    Reserved,
    Selected,
}

impl SeatState {
    /// Whether clicking the seat does anything.
    pub fn is_interactive(&self) -> bool {
        !matches!(self, SeatState::Reserved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeatState::Available => "available",
            SeatState::Reserved => "reserved",
            SeatState::Selected => "selected",
        }
    }
}

/// What a toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    Selected,
    Deselected,
    /// The seat is reserved; nothing changed.
    Rejected,
    /// The seat is not on this map; nothing changed.
    OutOfLayout,
}

impl Toggle {
    pub fn changed(&self) -> bool {
        matches!(self, Toggle::Selected | Toggle::Deselected)
    }
}

/// Why a seat map cannot hand off to checkout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProceedError {
    #[error("select at least one seat to continue")]
    EmptySelection,

    #[error("seat map has no bus to book")]
    MissingBus,
}

/// Everything checkout needs from the seat map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutHandoff {
    pub bus_id: BusId,
    /// Row-major order.
    pub seats: Vec<SeatId>,
    pub total: Fare,
    pub travel_date: Option<NaiveDate>,
}

/// Query-string shape of a handoff, as read back by the checkout page.
#[derive(Serialize)]
struct HandoffQuery<'a> {
    #[serde(rename = "busId")]
    bus_id: &'a str,
    seats: String,
    total: String,
    date: String,
}

impl CheckoutHandoff {
    /// Seats joined with commas, e.g. `C3,C4`.
    pub fn seats_param(&self) -> String {
        self.seats
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Encode as `busId=..&seats=..&total=..&date=..`.
    pub fn to_query_string(&self) -> Result<String, serde_urlencoded::ser::Error> {
        serde_urlencoded::to_string(HandoffQuery {
            bus_id: self.bus_id.as_str(),
            seats: self.seats_param(),
            total: self.total.as_major().to_string(),
            date: self.travel_date.map(format_travel_date).unwrap_or_default(),
        })
    }
}

/// Inputs a seat map is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatMapInputs {
    pub bus_id: Option<BusId>,
    pub travel_date: Option<NaiveDate>,
    pub fare: Fare,
    pub layout: SeatLayout,
}

impl SeatMapInputs {
    pub fn new(bus_id: Option<BusId>, travel_date: Option<NaiveDate>, fare: Fare) -> Self {
        Self {
            bus_id,
            travel_date,
            fare,
            layout: SeatLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: SeatLayout) -> Self {
        self.layout = layout;
        self
    }
}

/// One seat map session: the reservations fetched when it opened plus the
/// customer's current selection.
///
/// The map is a plain value. [`SeatMap::toggle`] consumes it and returns the
/// next state, so the machine can be driven without any rendering.
///
/// Invariant: no selected seat is reserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatMap {
    inputs: SeatMapInputs,
    reserved: ReservationSet,
    source: ReservationSource,
    selected: BTreeSet<SeatId>,
}

impl SeatMap {
    /// Open a map with nothing selected.
    pub fn open(inputs: SeatMapInputs, loaded: LoadedReservations) -> Self {
        Self {
            inputs,
            reserved: loaded.reserved,
            source: loaded.source,
            selected: BTreeSet::new(),
        }
    }

    /// Fetch reservations and open the map. Never fails; see
    /// [`load_reservations`].
    pub async fn load(store: &dyn BookingStore, inputs: SeatMapInputs) -> Self {
        let loaded = load_reservations(
            store,
            inputs.bus_id.as_ref(),
            inputs.travel_date,
            &inputs.layout,
        )
        .await;
        Self::open(inputs, loaded)
    }

    pub fn bus_id(&self) -> Option<&BusId> {
        self.inputs.bus_id.as_ref()
    }

    pub fn travel_date(&self) -> Option<NaiveDate> {
        self.inputs.travel_date
    }

    pub fn fare(&self) -> Fare {
        self.inputs.fare
    }

    pub fn layout(&self) -> &SeatLayout {
        &self.inputs.layout
    }

    pub fn reserved(&self) -> &ReservationSet {
        &self.reserved
    }

    pub fn reservation_source(&self) -> &ReservationSource {
        &self.source
    }

    /// Selected seats, row-major.
    pub fn selected(&self) -> impl Iterator<Item = &SeatId> {
        self.selected.iter()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Current state of a seat. Seats outside the layout read as `None`.
    pub fn state_of(&self, seat: &SeatId) -> Option<SeatState> {
        if !self.inputs.layout.contains(seat) {
            return None;
        }
        Some(if self.reserved.contains(seat) {
            SeatState::Reserved
        } else if self.selected.contains(seat) {
            SeatState::Selected
        } else {
            SeatState::Available
        })
    }

    /// Flip a seat between available and selected.
    pub fn toggle(mut self, seat: SeatId) -> (Self, Toggle) {
        let outcome = match self.state_of(&seat) {
            None => Toggle::OutOfLayout,
            Some(SeatState::Reserved) => Toggle::Rejected,
            Some(SeatState::Selected) => {
                self.selected.remove(&seat);
                Toggle::Deselected
            }
            Some(SeatState::Available) => {
                self.selected.insert(seat);
                Toggle::Selected
            }
        };
        (self, outcome)
    }

    /// Number of selected seats times the fare.
    pub fn total(&self) -> Fare {
        self.inputs.fare.times(self.selected.len())
    }

    /// Whether [`SeatMap::proceed`] would succeed.
    pub fn can_proceed(&self) -> bool {
        !self.selected.is_empty() && self.inputs.bus_id.is_some()
    }

    /// Hand the selection to checkout. No booking is created.
    pub fn proceed(&self) -> Result<CheckoutHandoff, ProceedError> {
        if self.selected.is_empty() {
            return Err(ProceedError::EmptySelection);
        }
        let bus_id = self.inputs.bus_id.clone().ok_or(ProceedError::MissingBus)?;

        Ok(CheckoutHandoff {
            bus_id,
            seats: self.selected.iter().copied().collect(),
            total: self.total(),
            travel_date: self.inputs.travel_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures;

    fn seat(s: &str) -> SeatId {
        SeatId::parse(s).unwrap()
    }

    fn map_with(reserved: &[&str], fare_rupees: u64) -> SeatMap {
        let inputs = SeatMapInputs::new(
            Some(BusId::parse("bus-1").unwrap()),
            NaiveDate::from_ymd_opt(2024, 3, 15),
            Fare::from_minor(fare_rupees * 100),
        );
        let loaded = LoadedReservations {
            reserved: reserved.iter().map(|s| seat(s)).collect(),
            source: ReservationSource::Fetched {
                seats: reserved.len(),
            },
        };
        SeatMap::open(inputs, loaded)
    }

    fn selected(map: &SeatMap) -> Vec<String> {
        map.selected().map(|s| s.to_string()).collect()
    }

    #[test]
    fn initial_states() {
        let map = map_with(&["A1", "B2"], 500);
        let layout = *map.layout();

        let reserved: Vec<_> = layout
            .seats()
            .filter(|s| map.state_of(s) == Some(SeatState::Reserved))
            .collect();
        assert_eq!(reserved, vec![seat("A1"), seat("B2")]);

        let available = layout
            .seats()
            .filter(|s| map.state_of(s) == Some(SeatState::Available))
            .count();
        assert_eq!(available, 38);
        assert_eq!(map.total(), Fare::ZERO);
    }

    #[test]
    fn walkthrough() {
        let map = map_with(&["A1", "B2"], 500);

        let (map, outcome) = map.toggle(seat("A1"));
        assert_eq!(outcome, Toggle::Rejected);
        assert_eq!(map.state_of(&seat("A1")), Some(SeatState::Reserved));
        assert_eq!(map.selected_count(), 0);

        let (map, _) = map.toggle(seat("C3"));
        let (map, _) = map.toggle(seat("C4"));
        assert_eq!(selected(&map), vec!["C3", "C4"]);
        assert_eq!(map.total(), Fare::from_minor(100_000));

        let (map, outcome) = map.toggle(seat("C3"));
        assert_eq!(outcome, Toggle::Deselected);
        assert_eq!(selected(&map), vec!["C4"]);
        assert_eq!(map.total(), Fare::from_minor(50_000));
    }

    #[tokio::test]
    async fn load_from_store() {
        let store = fixtures::store();
        let inputs = SeatMapInputs::new(
            Some(BusId::parse("bus-1").unwrap()),
            Some(fixtures::date()),
            Fare::from_minor(50_000),
        );
        let map = SeatMap::load(&store, inputs.clone()).await;
        assert_eq!(map.state_of(&seat("A1")), Some(SeatState::Reserved));
        assert_eq!(map.state_of(&seat("B2")), Some(SeatState::Reserved));
        // Cancelled bookings free their seats
        assert_eq!(map.state_of(&seat("C1")), Some(SeatState::Available));

        store.set_fail_reservations(true);
        let map = SeatMap::load(&store, inputs).await;
        assert!(map.reserved().is_empty());
        assert!(map.reservation_source().is_degraded());
    }

    #[test]
    fn toggle_twice_is_identity() {
        let map = map_with(&[], 300);
        let (once, first) = map.clone().toggle(seat("D2"));
        assert_eq!(first, Toggle::Selected);
        assert_eq!(once.state_of(&seat("D2")), Some(SeatState::Selected));

        let (twice, second) = once.toggle(seat("D2"));
        assert_eq!(second, Toggle::Deselected);
        assert_eq!(twice, map);
    }

    #[test]
    fn out_of_layout_is_ignored() {
        let map = map_with(&[], 300);
        let (after, outcome) = map.clone().toggle(seat("K1"));
        assert_eq!(outcome, Toggle::OutOfLayout);
        assert!(!outcome.changed());
        assert_eq!(after, map);
        assert_eq!(map.state_of(&seat("A5")), None);
    }

    #[test]
    fn empty_reservations_all_available() {
        let inputs = SeatMapInputs::new(None, None, Fare::from_minor(10_000));
        let map = SeatMap::open(
            inputs,
            LoadedReservations {
                reserved: ReservationSet::empty(),
                source: ReservationSource::Skipped,
            },
        );
        assert!(
            map.layout()
                .seats()
                .all(|s| map.state_of(&s) == Some(SeatState::Available))
        );
        assert!(map.reservation_source().is_degraded());
    }

    #[test]
    fn proceed_requires_selection() {
        let map = map_with(&["A1"], 500);
        assert!(!map.can_proceed());
        assert_eq!(map.proceed(), Err(ProceedError::EmptySelection));
    }

    #[test]
    fn proceed_requires_bus() {
        let inputs = SeatMapInputs::new(None, None, Fare::from_minor(10_000));
        let map = SeatMap::open(
            inputs,
            LoadedReservations {
                reserved: ReservationSet::empty(),
                source: ReservationSource::Skipped,
            },
        );
        let (map, _) = map.toggle(seat("A1"));
        assert!(!map.can_proceed());
        assert_eq!(map.proceed(), Err(ProceedError::MissingBus));
    }

    #[test]
    fn proceed_hands_off_row_major() {
        let map = map_with(&[], 500);
        let (map, _) = map.toggle(seat("C4"));
        let (map, _) = map.toggle(seat("A2"));
        let (map, _) = map.toggle(seat("C3"));

        let handoff = map.proceed().unwrap();
        assert_eq!(handoff.seats_param(), "A2,C3,C4");
        assert_eq!(handoff.total, Fare::from_minor(150_000));
        assert_eq!(handoff.bus_id.as_str(), "bus-1");
        assert_eq!(
            handoff.to_query_string().unwrap(),
            "busId=bus-1&seats=A2%2CC3%2CC4&total=1500&date=2024-03-15"
        );
    }

    #[test]
    fn handoff_without_date_sends_blank() {
        let handoff = CheckoutHandoff {
            bus_id: BusId::parse("b 1").unwrap(),
            seats: vec![seat("A1")],
            total: Fare::from_minor(12_550),
            travel_date: None,
        };
        assert_eq!(
            handoff.to_query_string().unwrap(),
            "busId=b+1&seats=A1&total=125.5&date="
        );
    }
}
