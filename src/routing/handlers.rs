use super::protocol::*;
use super::router::Router;
use crate::error::BalancerError;
use crate::membership::{MembershipIndex, MembershipSnapshot};

use axum::{
    Extension, Json,
    extract::{Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::Value;
use std::sync::Arc;

type Reply = Result<Json<Envelope<MembershipSnapshot>>, BalancerError>;

impl IntoResponse for BalancerError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(Envelope::failure(self.to_string())),
        )
            .into_response()
    }
}

/// Balancer HTTP surface: control plane plus the catch-all forwarder.
pub fn app(index: Arc<MembershipIndex>, router: Arc<Router>) -> axum::Router {
    axum::Router::new()
        .route(ENDPOINT_REP, get(handle_rep))
        .route(ENDPOINT_ADD, post(handle_add))
        .route(ENDPOINT_RM, delete(handle_rm))
        .route(ENDPOINT_FORWARD, get(handle_forward))
        .layer(Extension(index))
        .layer(Extension(router))
}

pub async fn handle_rep(
    Extension(index): Extension<Arc<MembershipIndex>>,
) -> Json<Envelope<MembershipSnapshot>> {
    Json(Envelope::successful(index.snapshot().await))
}

pub async fn handle_add(
    Extension(index): Extension<Arc<MembershipIndex>>,
    body: Result<Json<MembershipRequest>, JsonRejection>,
) -> Reply {
    let Json(req) = body.map_err(invalid_body)?;

    match index.add(req.n, req.hostnames).await {
        Ok(snapshot) => Ok(Json(Envelope::successful(snapshot))),
        Err(e) => {
            tracing::error!("Add failed: {}", e);
            Err(e)
        }
    }
}

pub async fn handle_rm(
    Extension(index): Extension<Arc<MembershipIndex>>,
    body: Result<Json<MembershipRequest>, JsonRejection>,
) -> Reply {
    let Json(req) = body.map_err(invalid_body)?;

    match index.remove(req.n, req.hostnames).await {
        Ok(snapshot) => Ok(Json(Envelope::successful(snapshot))),
        Err(e) => {
            tracing::error!("Remove failed: {}", e);
            Err(e)
        }
    }
}

pub async fn handle_forward(
    Extension(router): Extension<Arc<Router>>,
    Path(path): Path<String>,
) -> Result<Json<Value>, BalancerError> {
    router.forward(&path, None).await.map(Json)
}

fn invalid_body(rejection: JsonRejection) -> BalancerError {
    BalancerError::Validation(format!("Invalid request body: {}", rejection.body_text()))
}
