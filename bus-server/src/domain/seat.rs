//! Seat identifiers and the fixed seat grid.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Error returned when parsing an invalid seat identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid seat identifier {input:?}: {reason}")]
pub struct InvalidSeatId {
    input: String,
    reason: &'static str,
}

/// A seat identifier: a row letter followed by a column number, e.g. `C3`.
///
/// Rows are `A`-`Z`, columns start at 1. Ordering is row-major, so
/// `A1 < A2 < B1`.
///
/// # Examples
///
/// ```
/// use bus_server::domain::SeatId;
///
/// let seat = SeatId::parse("C3").unwrap();
/// assert_eq!(seat.to_string(), "C3");
/// assert_eq!(seat.row_label(), 'C');
/// assert_eq!(seat.column(), 3);
///
/// assert!(SeatId::parse("c3").is_err());
/// assert!(SeatId::parse("C0").is_err());
/// assert_eq!(SeatId::parse_normalized(" c3 ").unwrap(), seat);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatId {
    row: u8,
    column: u16,
}

impl SeatId {
    /// Build a seat from a zero-based row index and a one-based column.
    pub fn new(row: u8, column: u16) -> Result<Self, DomainError> {
        if row >= 26 {
            return Err(DomainError::InvalidLayout("row index must be below 26"));
        }
        if column == 0 {
            return Err(DomainError::InvalidLayout("columns start at 1"));
        }
        Ok(Self { row, column })
    }

    /// Parse a seat identifier in canonical form (uppercase row letter).
    pub fn parse(s: &str) -> Result<Self, InvalidSeatId> {
        let invalid = |reason| InvalidSeatId {
            input: s.to_string(),
            reason,
        };

        let mut chars = s.chars();
        let row = chars.next().ok_or_else(|| invalid("empty"))?;
        if !row.is_ascii_uppercase() {
            return Err(invalid("row must be an uppercase letter A-Z"));
        }

        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("column must be a number"));
        }
        let column: u16 = digits.parse().map_err(|_| invalid("column out of range"))?;
        if column == 0 {
            return Err(invalid("columns start at 1"));
        }

        Ok(Self {
            row: row as u8 - b'A',
            column,
        })
    }

    /// Parse user input, tolerating surrounding whitespace and lowercase.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidSeatId> {
        Self::parse(&s.trim().to_ascii_uppercase())
    }

    /// Zero-based row index.
    pub fn row(&self) -> u8 {
        self.row
    }

    /// Row letter.
    pub fn row_label(&self) -> char {
        (b'A' + self.row) as char
    }

    /// One-based column number.
    pub fn column(&self) -> u16 {
        self.column
    }
}

impl fmt::Debug for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeatId({self})")
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_label(), self.column)
    }
}

impl TryFrom<String> for SeatId {
    type Error = InvalidSeatId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SeatId> for String {
    fn from(seat: SeatId) -> Self {
        seat.to_string()
    }
}

/// Default number of rows (A-J).
pub const DEFAULT_ROWS: u8 = 10;

/// Default seats per row.
pub const DEFAULT_COLUMNS: u16 = 4;

/// The grid of seats rendered for a bus.
///
/// The storefront always renders the same grid regardless of the bus's
/// declared seat count; the default is 10 rows by 4 columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatLayout {
    rows: u8,
    columns: u16,
}

impl Default for SeatLayout {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
        }
    }
}

impl SeatLayout {
    /// Create a layout with `rows` rows (1-26) and `columns` columns (at least 1).
    pub fn new(rows: u8, columns: u16) -> Result<Self, DomainError> {
        if rows == 0 || rows > 26 {
            return Err(DomainError::InvalidLayout("rows must be between 1 and 26"));
        }
        if columns == 0 {
            return Err(DomainError::InvalidLayout("at least one column is required"));
        }
        Ok(Self { rows, columns })
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn columns(&self) -> u16 {
        self.columns
    }

    /// Total number of seats in the grid.
    pub fn len(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the seat belongs to this grid.
    pub fn contains(&self, seat: &SeatId) -> bool {
        seat.row < self.rows && seat.column <= self.columns
    }

    /// Every seat, row-major.
    pub fn seats(&self) -> impl Iterator<Item = SeatId> + '_ {
        (0..self.rows)
            .flat_map(move |row| (1..=self.columns).map(move |column| SeatId { row, column }))
    }

    /// Seats grouped by row, in row order.
    pub fn seat_rows(&self) -> Vec<Vec<SeatId>> {
        (0..self.rows)
            .map(|row| {
                (1..=self.columns)
                    .map(|column| SeatId { row, column })
                    .collect()
            })
            .collect()
    }

    /// Column after which the aisle sits (half the row, rounded down).
    pub fn aisle_after(&self) -> u16 {
        self.columns / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_seats() {
        let seat = SeatId::parse("A1").unwrap();
        assert_eq!(seat.row(), 0);
        assert_eq!(seat.column(), 1);

        let seat = SeatId::parse("J4").unwrap();
        assert_eq!(seat.row_label(), 'J');
        assert_eq!(seat.column(), 4);

        assert_eq!(SeatId::parse("Z12").unwrap().column(), 12);
    }

    #[test]
    fn reject_malformed_seats() {
        assert!(SeatId::parse("").is_err());
        assert!(SeatId::parse("A").is_err());
        assert!(SeatId::parse("1A").is_err());
        assert!(SeatId::parse("a1").is_err());
        assert!(SeatId::parse("A0").is_err());
        assert!(SeatId::parse("A-1").is_err());
        assert!(SeatId::parse("A1B").is_err());
        assert!(SeatId::parse("Ä1").is_err());
        assert!(SeatId::parse("A99999").is_err());
    }

    #[test]
    fn parse_normalized_trims_and_uppercases() {
        assert_eq!(
            SeatId::parse_normalized("  b2 ").unwrap(),
            SeatId::parse("B2").unwrap()
        );
    }

    #[test]
    fn error_mentions_input() {
        let err = SeatId::parse("x9").unwrap_err();
        assert!(err.to_string().contains("\"x9\""));
    }

    #[test]
    fn ordering_is_row_major() {
        let a2 = SeatId::parse("A2").unwrap();
        let a10 = SeatId::parse("A10").unwrap();
        let b1 = SeatId::parse("B1").unwrap();
        assert!(a2 < a10);
        assert!(a10 < b1);
    }

    #[test]
    fn serde_as_string() {
        let seat = SeatId::parse("C3").unwrap();
        assert_eq!(serde_json::to_string(&seat).unwrap(), "\"C3\"");
        let back: SeatId = serde_json::from_str("\"C3\"").unwrap();
        assert_eq!(back, seat);
        assert!(serde_json::from_str::<SeatId>("\"C\"").is_err());
    }

    #[test]
    fn default_layout_is_forty_seats() {
        let layout = SeatLayout::default();
        assert_eq!(layout.len(), 40);

        let seats: Vec<String> = layout.seats().map(|s| s.to_string()).collect();
        assert_eq!(seats.first().map(String::as_str), Some("A1"));
        assert_eq!(seats.last().map(String::as_str), Some("J4"));
        assert_eq!(seats[4], "B1");

        let rows = layout.seat_rows();
        assert_eq!(rows.len(), 10);
        assert!(rows.iter().all(|r| r.len() == 4));
        assert_eq!(layout.aisle_after(), 2);
    }

    #[test]
    fn layout_contains() {
        let layout = SeatLayout::default();
        assert!(layout.contains(&SeatId::parse("A1").unwrap()));
        assert!(layout.contains(&SeatId::parse("J4").unwrap()));
        assert!(!layout.contains(&SeatId::parse("K1").unwrap()));
        assert!(!layout.contains(&SeatId::parse("A5").unwrap()));
    }

    #[test]
    fn custom_layout_bounds() {
        assert!(SeatLayout::new(0, 4).is_err());
        assert!(SeatLayout::new(27, 4).is_err());
        assert!(SeatLayout::new(10, 0).is_err());

        let layout = SeatLayout::new(12, 5).unwrap();
        assert_eq!(layout.len(), 60);
        assert!(layout.contains(&SeatId::parse("L5").unwrap()));
    }

    #[test]
    fn new_seat_bounds() {
        assert!(SeatId::new(26, 1).is_err());
        assert!(SeatId::new(0, 0).is_err());
        assert_eq!(SeatId::new(2, 3).unwrap().to_string(), "C3");
    }
}
