use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Trading signal for a single date
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Numeric form used in reports: 1 buy, -1 sell, 0 hold
    pub fn as_i8(&self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::Hold => 0,
        }
    }

    pub fn is_trade(&self) -> bool {
        !matches!(self, Signal::Hold)
    }
}

/// Long-only position state
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    Flat,
    Long,
}

impl Default for Position {
    fn default() -> Self {
        Position::Flat
    }
}

/// Per-date description of what the position did
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    Buy,
    Sell,
    Holding,
    OutOfMarket,
}

/// Where a close sits relative to its bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BandZone {
    Below,
    Inside,
    Above,
}
