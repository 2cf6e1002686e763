//! Business logic: points ledger, reward classification, award dispatch.

pub mod dispatch;
pub mod ledger;
pub mod rewards;

pub use dispatch::{dispatch, DispatchOutcome};
pub use ledger::{PgPointsLedger, PointsLedger};
pub use rewards::{classify, RewardConfig};
