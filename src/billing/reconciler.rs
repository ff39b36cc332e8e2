use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::gateway::{GatewayError, PaymentGateway};
use super::models::{LiftTarget, ReconcileOutcome, RetryDisposition, SkipReason};
use super::store::FreezeStore;

/// key: billing-reconcile-error -> retry failure taxonomy
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("freeze status lookup failed")]
    LookupFailed(#[source] anyhow::Error),
    #[error("overdue invoice retry failed")]
    RetryFailed(#[source] GatewayError),
    /// The charge settled but the restriction persisted. The account was
    /// charged and remains restricted until an operator reconciles it.
    #[error("retry settled but lifting {target} failed")]
    UnfreezeFailed {
        target: LiftTarget,
        #[source]
        source: anyhow::Error,
    },
}

/// key: billing-freeze-reconciler -> overdue retry orchestration
///
/// Reads the account's freeze markers, decides whether an automatic retry
/// of overdue invoices is warranted, runs it, and lifts at most one
/// billing restriction on success.
pub struct FreezeReconciler {
    store: Arc<dyn FreezeStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl FreezeReconciler {
    pub fn new(store: Arc<dyn FreezeStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    pub async fn reconcile(&self, account_id: i32) -> Result<ReconcileOutcome, ReconcileError> {
        let status = self
            .store
            .get_all(account_id)
            .await
            .map_err(ReconcileError::LookupFailed)?;

        let lift = match status.retry_disposition() {
            RetryDisposition::Barred => {
                info!(account_id, "violation freeze present; automatic retry barred");
                return Ok(ReconcileOutcome::Skipped {
                    reason: SkipReason::ViolationFreeze,
                });
            }
            RetryDisposition::Idle => {
                return Ok(ReconcileOutcome::Skipped {
                    reason: SkipReason::NothingOverdue,
                });
            }
            RetryDisposition::Retry { lift } => lift,
        };

        // A failed retry leaves every marker in place; the account must not
        // be unfrozen without a settled charge.
        self.gateway
            .attempt_overdue_invoices(account_id)
            .await
            .map_err(ReconcileError::RetryFailed)?;

        match lift {
            Some(LiftTarget::BillingFreeze) => {
                self.store
                    .clear_billing_freeze(account_id)
                    .await
                    .map_err(|source| lift_failure(account_id, LiftTarget::BillingFreeze, source))?;
            }
            Some(LiftTarget::BillingWarning) => {
                self.store
                    .clear_billing_warning(account_id)
                    .await
                    .map_err(|source| {
                        lift_failure(account_id, LiftTarget::BillingWarning, source)
                    })?;
            }
            // Trial expiration stays in place on this path.
            None => {}
        }

        info!(account_id, lifted = ?lift, "overdue retry settled");
        Ok(ReconcileOutcome::Retried { lifted: lift })
    }
}

fn lift_failure(account_id: i32, target: LiftTarget, source: anyhow::Error) -> ReconcileError {
    warn!(
        account_id,
        %target,
        ?source,
        "charge settled but restriction was not lifted; needs operator reconciliation"
    );
    ReconcileError::UnfreezeFailed { target, source }
}
