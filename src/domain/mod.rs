//! Pure business rules.
//!
//! Nothing in here touches the database or the network, so every rule is
//! covered by plain unit tests. Services load rows, call into these
//! functions, and persist the result.

pub mod allocation;
pub mod amortization;
pub mod inventory;
pub mod money;
pub mod petty_cash;
pub mod validation;
