//! Notification log admin surface: queries over delivery records and the
//! manual retry trigger.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use provend_core::OrderId;
use provend_notify::{NotificationStatus, NotificationStore};

use crate::dto;
use crate::errors::json_error;
use crate::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_notifications))
        .route("/failed", get(list_failed_notifications))
        .route("/order/:order_id", get(list_notifications_by_order))
        .route("/retry-all", post(retry_all))
}

async fn list_notifications(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.notifications.list_all() {
        Ok(records) => {
            let items: Vec<_> = records.iter().map(dto::notification_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string()),
    }
}

async fn list_failed_notifications(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.notifications.find_by_status(NotificationStatus::Failed) {
        Ok(records) => {
            let items: Vec<_> = records.iter().map(dto::notification_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string()),
    }
}

async fn list_notifications_by_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match order_id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };
    match services.notifications.find_by_order(order_id) {
        Ok(records) => {
            let items: Vec<_> = records.iter().map(dto::notification_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string()),
    }
}

/// Kick off a retry pass without waiting for the next scheduled sweep.
///
/// The pass runs on a blocking thread; the response reports how many records
/// were eligible when the scan ran.
async fn retry_all(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let dispatcher = services.dispatcher.clone();
    // Retry loops block on the inter-attempt delay; keep them off the
    // async runtime.
    let retried = match tokio::task::spawn_blocking(move || dispatcher.retry_all()).await {
        Ok(n) => n,
        Err(e) => {
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "retry_error",
                e.to_string(),
            )
        }
    };
    (
        StatusCode::OK,
        Json(serde_json::json!({ "retried": retried })),
    )
        .into_response()
}
