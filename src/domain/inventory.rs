//! Motorcycle lifecycle.

use serde::{Deserialize, Serialize};

/// Where a unit is in its lifecycle.
///
/// Allowed transitions:
///
/// - STOCK → RESERVED, PAUSED, PROCESSING, SOLD, ELIMINATED
/// - RESERVED → STOCK, SOLD, ELIMINATED
/// - PAUSED → STOCK, ELIMINATED
/// - PROCESSING → STOCK, ELIMINATED
/// - SOLD and ELIMINATED are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MotorcycleState {
    Stock,
    Reserved,
    Paused,
    Processing,
    Sold,
    Eliminated,
}

impl MotorcycleState {
    pub const ALL: [MotorcycleState; 6] = [
        MotorcycleState::Stock,
        MotorcycleState::Reserved,
        MotorcycleState::Paused,
        MotorcycleState::Processing,
        MotorcycleState::Sold,
        MotorcycleState::Eliminated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MotorcycleState::Stock => "STOCK",
            MotorcycleState::Reserved => "RESERVED",
            MotorcycleState::Paused => "PAUSED",
            MotorcycleState::Processing => "PROCESSING",
            MotorcycleState::Sold => "SOLD",
            MotorcycleState::Eliminated => "ELIMINATED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, MotorcycleState::Sold | MotorcycleState::Eliminated)
    }

    pub fn can_transition_to(self, next: MotorcycleState) -> bool {
        use MotorcycleState::*;
        match (self, next) {
            (Stock, Reserved | Paused | Processing | Sold | Eliminated) => true,
            (Reserved, Stock | Sold | Eliminated) => true,
            (Paused, Stock | Eliminated) => true,
            (Processing, Stock | Eliminated) => true,
            _ => false,
        }
    }

    /// States reachable through the generic state endpoint. Reservations
    /// and sales carry extra data and have their own operations.
    pub fn is_manual_target(self) -> bool {
        matches!(
            self,
            MotorcycleState::Stock
                | MotorcycleState::Paused
                | MotorcycleState::Processing
                | MotorcycleState::Eliminated
        )
    }

    /// Units that may be moved between branches.
    pub fn is_transferable(self) -> bool {
        matches!(self, MotorcycleState::Stock | MotorcycleState::Paused)
    }
}

impl std::fmt::Display for MotorcycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::MotorcycleState::*;
    use super::*;

    #[test]
    fn test_terminal_states_go_nowhere() {
        for next in MotorcycleState::ALL {
            assert!(!Sold.can_transition_to(next));
            assert!(!Eliminated.can_transition_to(next));
        }
    }

    #[test]
    fn test_sale_only_from_stock_or_reserved() {
        assert!(Stock.can_transition_to(Sold));
        assert!(Reserved.can_transition_to(Sold));
        assert!(!Paused.can_transition_to(Sold));
        assert!(!Processing.can_transition_to(Sold));
    }

    #[test]
    fn test_reservation_round_trip() {
        assert!(Stock.can_transition_to(Reserved));
        assert!(Reserved.can_transition_to(Stock));
        assert!(!Paused.can_transition_to(Reserved));
    }

    #[test]
    fn test_no_self_transitions() {
        for state in MotorcycleState::ALL {
            assert!(!state.can_transition_to(state));
        }
    }

    #[test]
    fn test_manual_targets() {
        assert!(Paused.is_manual_target());
        assert!(!Sold.is_manual_target());
        assert!(!Reserved.is_manual_target());
    }

    #[test]
    fn test_serde_uses_upper_case() {
        assert_eq!(serde_json::to_string(&Processing).unwrap(), "\"PROCESSING\"");
        let parsed: MotorcycleState = serde_json::from_str("\"ELIMINATED\"").unwrap();
        assert_eq!(parsed, Eliminated);
    }
}
