use crate::common::enums::{Position, PositionStatus, Signal};

impl Position {
    /// Long-only transition: Flat + Buy enters, Long + Sell exits, all else holds
    pub fn on_signal(self, signal: Signal) -> Self {
        match (self, signal) {
            (Position::Flat, Signal::Buy) => Position::Long,
            (Position::Long, Signal::Sell) => Position::Flat,
            (state, _) => state,
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Position::Long)
    }
}

impl PositionStatus {
    pub fn from_transition(prev: Position, next: Position) -> Self {
        match (prev, next) {
            (Position::Flat, Position::Long) => PositionStatus::Buy,
            (Position::Long, Position::Flat) => PositionStatus::Sell,
            (Position::Long, Position::Long) => PositionStatus::Holding,
            (Position::Flat, Position::Flat) => PositionStatus::OutOfMarket,
        }
    }
}

/// Fold a signal stream into positions, starting flat
pub fn positions_from_signals(signals: &[Signal]) -> Vec<Position> {
    signals
        .iter()
        .scan(Position::Flat, |state, &signal| {
            *state = state.on_signal(signal);
            Some(*state)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert_eq!(Position::Flat.on_signal(Signal::Buy), Position::Long);
        assert_eq!(Position::Long.on_signal(Signal::Sell), Position::Flat);

        // no pyramiding, no shorting
        assert_eq!(Position::Long.on_signal(Signal::Buy), Position::Long);
        assert_eq!(Position::Flat.on_signal(Signal::Sell), Position::Flat);

        assert_eq!(Position::Flat.on_signal(Signal::Hold), Position::Flat);
        assert_eq!(Position::Long.on_signal(Signal::Hold), Position::Long);
    }

    #[test]
    fn test_status() {
        use crate::common::enums::Position::*;
        assert_eq!(PositionStatus::from_transition(Flat, Long), PositionStatus::Buy);
        assert_eq!(PositionStatus::from_transition(Long, Flat), PositionStatus::Sell);
        assert_eq!(PositionStatus::from_transition(Long, Long), PositionStatus::Holding);
        assert_eq!(PositionStatus::from_transition(Flat, Flat), PositionStatus::OutOfMarket);
    }

    #[test]
    fn test_positions_from_signals() {
        use crate::common::enums::Signal::*;
        let signals = [Hold, Sell, Buy, Hold, Buy, Sell, Hold, Buy];
        let positions = positions_from_signals(&signals);
        assert_eq!(
            positions,
            vec![
                Position::Flat,
                Position::Flat,
                Position::Long,
                Position::Long,
                Position::Long,
                Position::Flat,
                Position::Flat,
                Position::Long,
            ]
        );
        assert!(positions_from_signals(&[]).is_empty());
    }
}
