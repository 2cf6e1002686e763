//! Award dispatch: hands a computed reward to the ledger without ever failing the caller.

use tracing::{debug, warn};

use super::ledger::PointsLedger;

/// What happened to one award.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Amount was zero or negative; ledger not called.
    Skipped,
    Credited { new_total: i32 },
    /// Ledger call failed; isolated to this message.
    Failed { error: String },
}

pub async fn dispatch(ledger: &dyn PointsLedger, slug: &str, amount: i32) -> DispatchOutcome {
    if amount <= 0 {
        debug!(slug = %slug, amount, "reward disabled for tier; nothing to credit");
        return DispatchOutcome::Skipped;
    }

    match ledger.add_points(slug, amount).await {
        Ok(new_total) => {
            debug!(slug = %slug, amount, new_total, "points credited");
            DispatchOutcome::Credited { new_total }
        }
        Err(e) => {
            warn!(slug = %slug, amount, error = %e, "failed to credit points");
            DispatchOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ledger::test_support::RecordingLedger;

    #[tokio::test]
    async fn zero_amount_never_reaches_ledger() {
        let ledger = RecordingLedger::default();
        assert_eq!(dispatch(&ledger, "bob", 0).await, DispatchOutcome::Skipped);
        assert_eq!(dispatch(&ledger, "bob", -3).await, DispatchOutcome::Skipped);
        assert!(ledger.credits().is_empty());
    }

    #[tokio::test]
    async fn positive_amount_credits_once() {
        let ledger = RecordingLedger::default();
        assert_eq!(
            dispatch(&ledger, "bob", 5).await,
            DispatchOutcome::Credited { new_total: 5 }
        );
        assert_eq!(
            dispatch(&ledger, "bob", 5).await,
            DispatchOutcome::Credited { new_total: 10 }
        );
        assert_eq!(ledger.credits(), vec![("bob".to_string(), 5), ("bob".to_string(), 5)]);
    }

    #[tokio::test]
    async fn ledger_failure_is_reported_not_raised() {
        let ledger = RecordingLedger::failing();
        match dispatch(&ledger, "bob", 5).await {
            DispatchOutcome::Failed { error } => assert!(error.contains("ledger unavailable")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
