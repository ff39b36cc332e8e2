use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

/// key: billing-gateway-error -> provider failure taxonomy
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("account is not authorized for this payment operation")]
    Unauthorized,
    #[error("card is already attached to this account")]
    DuplicateCard,
    #[error("account already has an applied package")]
    AlreadyHasPackage,
    #[error("payment gateway failure: {0}")]
    Failed(#[from] anyhow::Error),
}

/// How the console identifies the payment method being attached.
#[derive(Debug, Clone)]
pub enum CardSource {
    /// A one-time tokenized card from the provider's client library.
    Token(String),
    /// An existing provider-side payment method id.
    PaymentMethod(String),
}

impl CardSource {
    pub fn from_request(raw: String, use_payment_method_id: bool) -> Self {
        if use_payment_method_id {
            CardSource::PaymentMethod(raw)
        } else {
            CardSource::Token(raw)
        }
    }
}

/// Provider-side identifier of an attached card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardHandle(pub String);

/// key: billing-gateway -> provider integration boundary
///
/// Charging, card storage and credits live with the provider; each call is
/// atomic on the provider side.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn attempt_overdue_invoices(&self, account_id: i32) -> Result<(), GatewayError>;

    async fn attach_card(
        &self,
        account_id: i32,
        source: &CardSource,
    ) -> Result<CardHandle, GatewayError>;

    async fn mark_package_applied(
        &self,
        account_id: i32,
        description: &str,
        when: DateTime<Utc>,
    ) -> Result<(), GatewayError>;

    async fn charge(
        &self,
        account_id: i32,
        amount_cents: i64,
        description: &str,
        card: &CardHandle,
    ) -> Result<(), GatewayError>;

    async fn apply_credit(
        &self,
        account_id: i32,
        amount_cents: i64,
        description: &str,
    ) -> Result<(), GatewayError>;
}

/// key: billing-gateway-stub -> stub implementation
///
/// Accepts every operation and logs it. Stands in for the real provider
/// adapter in local development.
pub struct StripeLikeGateway;

#[async_trait]
impl PaymentGateway for StripeLikeGateway {
    async fn attempt_overdue_invoices(&self, account_id: i32) -> Result<(), GatewayError> {
        info!(account_id, "stub gateway: overdue invoices settled");
        Ok(())
    }

    async fn attach_card(
        &self,
        account_id: i32,
        source: &CardSource,
    ) -> Result<CardHandle, GatewayError> {
        let handle = match source {
            CardSource::Token(_) => format!("card_stub_{account_id}"),
            CardSource::PaymentMethod(id) => id.clone(),
        };
        info!(account_id, card = %handle, "stub gateway: card attached");
        Ok(CardHandle(handle))
    }

    async fn mark_package_applied(
        &self,
        account_id: i32,
        description: &str,
        _when: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        info!(account_id, description, "stub gateway: package marked applied");
        Ok(())
    }

    async fn charge(
        &self,
        account_id: i32,
        amount_cents: i64,
        description: &str,
        card: &CardHandle,
    ) -> Result<(), GatewayError> {
        info!(
            account_id,
            amount_cents,
            description,
            card = %card.0,
            "stub gateway: charge posted"
        );
        Ok(())
    }

    async fn apply_credit(
        &self,
        account_id: i32,
        amount_cents: i64,
        description: &str,
    ) -> Result<(), GatewayError> {
        info!(
            account_id,
            amount_cents, description, "stub gateway: credit applied"
        );
        Ok(())
    }
}
