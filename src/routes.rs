use axum::Router;

use crate::billing;

pub fn api_routes() -> Router {
    Router::new().merge(billing::api::routes())
}
