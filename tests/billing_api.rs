use std::sync::Arc;

use async_trait::async_trait;
use axum::{body::Body, http::Request, Extension, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use tower::ServiceExt;

use console_backend::billing::{
    self, FreezeStatus, FreezeStore, PackagePlan, PaymentGateway, PlanCatalog, StripeLikeGateway,
};

// key: billing-api-tests -> status mapping through the router

struct NoFreezesStore;

#[async_trait]
impl FreezeStore for NoFreezesStore {
    async fn get_all(&self, _account_id: i32) -> anyhow::Result<FreezeStatus> {
        Ok(FreezeStatus::default())
    }

    async fn clear_billing_freeze(&self, _account_id: i32) -> anyhow::Result<()> {
        Ok(())
    }

    async fn clear_billing_warning(&self, _account_id: i32) -> anyhow::Result<()> {
        Ok(())
    }
}

fn app() -> Router {
    let store: Arc<dyn FreezeStore> = Arc::new(NoFreezesStore);
    let gateway: Arc<dyn PaymentGateway> = Arc::new(StripeLikeGateway);
    let catalog: PlanCatalog = [(
        "acme".to_string(),
        PackagePlan {
            price_cents: 1000,
            credit_cents: 2000,
        },
    )]
    .into_iter()
    .collect();

    Router::new()
        .merge(billing::api::routes())
        .layer(Extension(store))
        .layer(Extension(gateway))
        .layer(Extension(catalog))
}

fn bearer(account_id: i32, role: &str) -> String {
    std::env::set_var("JWT_SECRET", "secret");
    let claims = serde_json::json!({"sub": account_id, "role": role, "exp": 9999999999u64});
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"secret"),
    )
    .unwrap();
    format!("Bearer {token}")
}

fn purchase_request(account_id: i32, authorization: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/accounts/{account_id}/billing/package"))
        .header("content-type", "application/json")
        .header("authorization", authorization)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn purchase_succeeds_for_configured_partner() {
    let response = app()
        .oneshot(purchase_request(
            7,
            &bearer(7, "user"),
            serde_json::json!({"card_token": "tok_valid", "partner_tag": "acme"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let receipt: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(receipt["charged_cents"], 1000);
    assert_eq!(receipt["credited_cents"], 2000);
    assert_eq!(receipt["description"], "acme package plan");
}

#[tokio::test]
async fn unknown_partner_maps_to_404() {
    let response = app()
        .oneshot(purchase_request(
            7,
            &bearer(7, "user"),
            serde_json::json!({"card_token": "tok_valid", "partner_tag": "globex"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn partner_tag_falls_back_to_user_agent() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/accounts/7/billing/package")
        .header("content-type", "application/json")
        .header("authorization", bearer(7, "user"))
        .header("user-agent", "Acme/3.2 (console)")
        .body(Body::from(
            serde_json::json!({"card_token": "tok_valid"}).to_string(),
        ))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn other_accounts_are_forbidden_without_admin_role() {
    let response = app()
        .oneshot(purchase_request(
            8,
            &bearer(7, "user"),
            serde_json::json!({"card_token": "tok_valid", "partner_tag": "acme"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn admins_may_purchase_for_other_accounts() {
    let response = app()
        .oneshot(purchase_request(
            8,
            &bearer(7, "admin"),
            serde_json::json!({"card_token": "tok_valid", "partner_tag": "acme"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/accounts/7/billing/retry-overdue")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn retry_with_no_markers_reports_noop() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/accounts/7/billing/retry-overdue")
        .header("authorization", bearer(7, "user"))
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), 200);
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let outcome: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(outcome["result"], "skipped");
    assert_eq!(outcome["reason"], "nothing_overdue");
}
