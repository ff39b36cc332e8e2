use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extractor::AuthAccount;

use super::gateway::{CardSource, PaymentGateway};
use super::models::ReconcileOutcome;
use super::plans::PlanCatalog;
use super::purchase::{PackagePurchaseOrchestrator, PurchaseReceipt};
use super::reconciler::FreezeReconciler;
use super::store::FreezeStore;

/// key: billing-api -> console endpoints for the two billing operations
pub fn routes() -> Router {
    Router::new()
        .route(
            "/api/accounts/:id/billing/retry-overdue",
            post(retry_overdue),
        )
        .route("/api/accounts/:id/billing/package", post(purchase_package))
}

pub async fn retry_overdue(
    Extension(store): Extension<Arc<dyn FreezeStore>>,
    Extension(gateway): Extension<Arc<dyn PaymentGateway>>,
    auth: AuthAccount,
    Path(account_id): Path<i32>,
) -> AppResult<Json<ReconcileOutcome>> {
    authorize(&auth, account_id)?;
    let reconciler = FreezeReconciler::new(store, gateway);
    let outcome = reconciler.reconcile(account_id).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct PurchasePackageRequest {
    pub card_token: String,
    #[serde(default)]
    pub use_payment_method_id: bool,
    /// Explicit partner tag; falls back to the User-Agent header.
    #[serde(default)]
    pub partner_tag: Option<String>,
}

pub async fn purchase_package(
    Extension(catalog): Extension<PlanCatalog>,
    Extension(gateway): Extension<Arc<dyn PaymentGateway>>,
    auth: AuthAccount,
    Path(account_id): Path<i32>,
    headers: HeaderMap,
    Json(payload): Json<PurchasePackageRequest>,
) -> AppResult<Json<PurchaseReceipt>> {
    authorize(&auth, account_id)?;
    if payload.card_token.trim().is_empty() {
        return Err(AppError::BadRequest("card_token required".into()));
    }
    let partner_tag = match payload.partner_tag {
        Some(tag) if !tag.trim().is_empty() => tag,
        _ => partner_tag_from_user_agent(&headers)
            .ok_or_else(|| AppError::BadRequest("partner tag missing".into()))?,
    };

    let card = CardSource::from_request(payload.card_token, payload.use_payment_method_id);
    let orchestrator = PackagePurchaseOrchestrator::new(catalog, gateway);
    let receipt = orchestrator.purchase(account_id, &partner_tag, card).await?;
    Ok(Json(receipt))
}

fn authorize(auth: &AuthAccount, account_id: i32) -> Result<(), AppError> {
    if auth.account_id != account_id && auth.role != "admin" {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

fn partner_tag_from_user_agent(headers: &HeaderMap) -> Option<String> {
    let agent = headers
        .get(axum::http::header::USER_AGENT)?
        .to_str()
        .ok()?
        .trim();
    // Plans are keyed by the product token, not the full agent string.
    let token = agent.split([' ', '/']).next()?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn partner_tag_uses_product_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::USER_AGENT,
            HeaderValue::from_static("Acme/3.2 (console)"),
        );
        assert_eq!(partner_tag_from_user_agent(&headers).as_deref(), Some("acme"));
    }

    #[test]
    fn missing_user_agent_yields_none() {
        assert_eq!(partner_tag_from_user_agent(&HeaderMap::new()), None);
    }
}
