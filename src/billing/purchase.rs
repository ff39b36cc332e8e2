use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::gateway::{CardSource, GatewayError, PaymentGateway};
use super::plans::PlanCatalog;

/// Step labels for gateway failures, so "nothing happened" and "charged
/// but not fully provisioned" stay distinguishable downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStep {
    AttachCard,
    MarkPackage,
    Charge,
    ApplyCredit,
}

impl PurchaseStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStep::AttachCard => "attach_card",
            PurchaseStep::MarkPackage => "mark_package",
            PurchaseStep::Charge => "charge",
            PurchaseStep::ApplyCredit => "apply_credit",
        }
    }
}

impl std::fmt::Display for PurchaseStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// key: billing-purchase-error -> purchase failure taxonomy
#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("no package plan configured for partner `{0}`")]
    PlanNotFound(String),
    #[error("account is not authorized to attach a payment method")]
    Unauthorized,
    #[error("card is already attached to this account")]
    DuplicateCard,
    #[error("payment gateway failure during {step}")]
    Gateway {
        step: PurchaseStep,
        #[source]
        source: GatewayError,
    },
    /// The charge settled but the credit did not land. Second
    /// charged-without-full-effect residue, kept distinct from plain
    /// gateway failures.
    #[error("charge settled but credit application failed")]
    CreditApplicationFailed(#[source] GatewayError),
}

/// What a completed purchase did, returned to the console.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceipt {
    pub partner_tag: String,
    pub description: String,
    pub charged_cents: i64,
    pub credited_cents: i64,
    pub already_had_package: bool,
}

/// key: billing-package-purchase -> four-step saga
///
/// attach payment method -> mark package applied -> charge price -> grant
/// credit. Partial state left by a mid-sequence failure (attached card,
/// applied marker) is not rolled back; re-invocation tolerates the
/// already-applied marker instead.
pub struct PackagePurchaseOrchestrator {
    catalog: PlanCatalog,
    gateway: Arc<dyn PaymentGateway>,
}

impl PackagePurchaseOrchestrator {
    pub fn new(catalog: PlanCatalog, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { catalog, gateway }
    }

    pub async fn purchase(
        &self,
        account_id: i32,
        partner_tag: &str,
        card: CardSource,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        let plan = *self
            .catalog
            .lookup(partner_tag)
            .ok_or_else(|| PurchaseError::PlanNotFound(partner_tag.to_string()))?;
        let description = format!("{partner_tag} package plan");

        let handle = self
            .gateway
            .attach_card(account_id, &card)
            .await
            .map_err(|err| match err {
                GatewayError::Unauthorized => PurchaseError::Unauthorized,
                GatewayError::DuplicateCard => PurchaseError::DuplicateCard,
                other => PurchaseError::Gateway {
                    step: PurchaseStep::AttachCard,
                    source: other,
                },
            })?;

        // The marker is set before the charge so a re-invocation after a
        // failed charge sees it and keeps going instead of re-deciding.
        let already_had_package = match self
            .gateway
            .mark_package_applied(account_id, &description, Utc::now())
            .await
        {
            Ok(()) => false,
            Err(GatewayError::AlreadyHasPackage) => {
                warn!(
                    account_id,
                    partner = partner_tag,
                    "package already applied; proceeding with charge"
                );
                true
            }
            Err(other) => {
                return Err(PurchaseError::Gateway {
                    step: PurchaseStep::MarkPackage,
                    source: other,
                })
            }
        };

        self.gateway
            .charge(account_id, plan.price_cents, &description, &handle)
            .await
            .map_err(|source| PurchaseError::Gateway {
                step: PurchaseStep::Charge,
                source,
            })?;

        // Credit is granted last: value only lands once payment settled.
        self.gateway
            .apply_credit(account_id, plan.credit_cents, &description)
            .await
            .map_err(|source| {
                warn!(
                    account_id,
                    partner = partner_tag,
                    ?source,
                    "charge settled but credit was not applied; needs operator reconciliation"
                );
                PurchaseError::CreditApplicationFailed(source)
            })?;

        info!(
            account_id,
            partner = partner_tag,
            charged_cents = plan.price_cents,
            credited_cents = plan.credit_cents,
            already_had_package,
            "package plan purchased"
        );

        Ok(PurchaseReceipt {
            partner_tag: partner_tag.to_string(),
            description,
            charged_cents: plan.price_cents,
            credited_cents: plan.credit_cents,
            already_had_package,
        })
    }
}
