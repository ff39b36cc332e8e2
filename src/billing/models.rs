use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// key: billing-freeze-model -> account restriction markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreezeKind {
    BillingFreeze,
    BillingWarning,
    ViolationFreeze,
    TrialExpirationFreeze,
}

impl FreezeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FreezeKind::BillingFreeze => "billing_freeze",
            FreezeKind::BillingWarning => "billing_warning",
            FreezeKind::ViolationFreeze => "violation_freeze",
            FreezeKind::TrialExpirationFreeze => "trial_expiration_freeze",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "billing_freeze" => Some(FreezeKind::BillingFreeze),
            "billing_warning" => Some(FreezeKind::BillingWarning),
            "violation_freeze" => Some(FreezeKind::ViolationFreeze),
            "trial_expiration_freeze" => Some(FreezeKind::TrialExpirationFreeze),
            _ => None,
        }
    }
}

impl std::fmt::Display for FreezeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An active restriction on an account, owned by the freeze store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreezeMarker {
    pub id: Uuid,
    pub account_id: i32,
    pub kind: FreezeKind,
    pub created_at: DateTime<Utc>,
}

/// key: billing-freeze-status -> per-account marker snapshot
///
/// At most one active marker per kind. A freeze and a warning should never
/// coexist (a warning escalates into a freeze), but the snapshot does not
/// enforce that; `retry_disposition` prefers the freeze when both appear.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FreezeStatus {
    pub billing_freeze: Option<FreezeMarker>,
    pub billing_warning: Option<FreezeMarker>,
    pub violation_freeze: Option<FreezeMarker>,
    pub trial_expiration_freeze: Option<FreezeMarker>,
}

impl FreezeStatus {
    pub fn set(&mut self, marker: FreezeMarker) {
        let slot = match marker.kind {
            FreezeKind::BillingFreeze => &mut self.billing_freeze,
            FreezeKind::BillingWarning => &mut self.billing_warning,
            FreezeKind::ViolationFreeze => &mut self.violation_freeze,
            FreezeKind::TrialExpirationFreeze => &mut self.trial_expiration_freeze,
        };
        *slot = Some(marker);
    }

    /// Decision table for the overdue-payment retry, in priority order.
    pub fn retry_disposition(&self) -> RetryDisposition {
        if self.violation_freeze.is_some() {
            // Violation freezes are lifted administratively, never by a
            // payment retry.
            return RetryDisposition::Barred;
        }
        if self.billing_freeze.is_some() {
            return RetryDisposition::Retry {
                lift: Some(LiftTarget::BillingFreeze),
            };
        }
        if self.billing_warning.is_some() {
            return RetryDisposition::Retry {
                lift: Some(LiftTarget::BillingWarning),
            };
        }
        if self.trial_expiration_freeze.is_some() {
            // The retry may still settle overdue invoices, but trial
            // expiration is not lifted on this path.
            return RetryDisposition::Retry { lift: None };
        }
        RetryDisposition::Idle
    }
}

/// What the reconciler should do for a given marker snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    /// A violation freeze bars any automatic retry.
    Barred,
    /// Nothing overdue to reconcile.
    Idle,
    /// Retry overdue invoices and, on success, lift at most one marker.
    Retry { lift: Option<LiftTarget> },
}

/// key: billing-lift-target -> restriction cleared after a settled retry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiftTarget {
    BillingFreeze,
    BillingWarning,
}

impl LiftTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiftTarget::BillingFreeze => "billing_freeze",
            LiftTarget::BillingWarning => "billing_warning",
        }
    }
}

impl std::fmt::Display for LiftTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ViolationFreeze,
    NothingOverdue,
}

/// Result of a reconciliation request, returned to the console.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    Skipped { reason: SkipReason },
    Retried { lifted: Option<LiftTarget> },
}

impl ReconcileOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, ReconcileOutcome::Retried { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn marker(kind: FreezeKind) -> FreezeMarker {
        FreezeMarker {
            id: Uuid::new_v4(),
            account_id: 7,
            kind,
            created_at: Utc::now(),
        }
    }

    fn status_of(kinds: &[FreezeKind]) -> FreezeStatus {
        let mut status = FreezeStatus::default();
        for kind in kinds {
            status.set(marker(*kind));
        }
        status
    }

    #[test]
    fn violation_bars_retry_regardless_of_other_markers() {
        let status = status_of(&[
            FreezeKind::ViolationFreeze,
            FreezeKind::BillingFreeze,
            FreezeKind::BillingWarning,
            FreezeKind::TrialExpirationFreeze,
        ]);
        assert_eq!(status.retry_disposition(), RetryDisposition::Barred);
    }

    #[test]
    fn empty_status_is_idle() {
        assert_eq!(
            FreezeStatus::default().retry_disposition(),
            RetryDisposition::Idle
        );
    }

    #[test]
    fn freeze_preferred_over_warning() {
        let status = status_of(&[FreezeKind::BillingWarning, FreezeKind::BillingFreeze]);
        assert_eq!(
            status.retry_disposition(),
            RetryDisposition::Retry {
                lift: Some(LiftTarget::BillingFreeze)
            }
        );
    }

    #[test]
    fn warning_alone_lifts_warning() {
        let status = status_of(&[FreezeKind::BillingWarning]);
        assert_eq!(
            status.retry_disposition(),
            RetryDisposition::Retry {
                lift: Some(LiftTarget::BillingWarning)
            }
        );
    }

    #[test]
    fn trial_expiration_alone_retries_without_lift() {
        let status = status_of(&[FreezeKind::TrialExpirationFreeze]);
        assert_eq!(
            status.retry_disposition(),
            RetryDisposition::Retry { lift: None }
        );
    }

    #[test]
    fn kind_round_trips_through_text() {
        for kind in [
            FreezeKind::BillingFreeze,
            FreezeKind::BillingWarning,
            FreezeKind::ViolationFreeze,
            FreezeKind::TrialExpirationFreeze,
        ] {
            assert_eq!(FreezeKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(FreezeKind::parse("payment_hold"), None);
    }
}
