//! Render model for a seat map.
//!
//! Plain data derived from a [`SeatMap`]; the web layer feeds it to a template
//! or serializes it as JSON.

use serde::Serialize;

use super::state::{SeatMap, SeatState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatView {
    pub id: String,
    pub state: SeatState,
    pub interactive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatRowView {
    pub label: char,
    /// Seats left of the aisle.
    pub left: Vec<SeatView>,
    /// Seats right of the aisle.
    pub right: Vec<SeatView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionSummary {
    pub seats: Vec<String>,
    pub count: usize,
    /// Formatted total, e.g. `₹1000`.
    pub total: String,
    pub total_minor: u64,
    pub can_proceed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatMapView {
    pub rows: Vec<SeatRowView>,
    pub summary: SelectionSummary,
    pub fare: String,
    /// Set when reservations could not be loaded and every seat may be shown
    /// as free.
    pub degraded: bool,
}

impl SeatMapView {
    pub fn from_map(map: &SeatMap) -> Self {
        let aisle = map.layout().aisle_after();
        let rows = map
            .layout()
            .seat_rows()
            .into_iter()
            .filter_map(|row| {
                let label = row.first()?.row_label();
                let (left, right): (Vec<_>, Vec<_>) = row
                    .into_iter()
                    .filter_map(|seat| {
                        let state = map.state_of(&seat)?;
                        Some((
                            seat.column(),
                            SeatView {
                                id: seat.to_string(),
                                state,
                                interactive: state.is_interactive(),
                            },
                        ))
                    })
                    .partition(|(column, _)| *column <= aisle);
                Some(SeatRowView {
                    label,
                    left: left.into_iter().map(|(_, v)| v).collect(),
                    right: right.into_iter().map(|(_, v)| v).collect(),
                })
            })
            .collect();

        let total = map.total();
        Self {
            rows,
            summary: SelectionSummary {
                seats: map.selected().map(|s| s.to_string()).collect(),
                count: map.selected_count(),
                total: total.to_string(),
                total_minor: total.minor(),
                can_proceed: map.can_proceed(),
            },
            fare: map.fare().to_string(),
            degraded: map.reservation_source().is_degraded(),
        }
    }
}
