use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use provend_core::{OrderId, VendorId};
use provend_orders::{NewLineItem, NewOrder, Order};

use crate::dto::{self, ApproveParams, CreateOrderRequest};
use crate::errors::{domain_error_to_response, json_error};
use crate::services::AppServices;

pub fn router() -> Router {
    Router::new().nest("/orders", orders_router())
}

fn orders_router() -> Router {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:id", get(get_order))
        .route("/by-status/:status", get(list_orders_by_status))
        .route("/by-vendor/:vendor_id", get(list_orders_by_vendor))
        .route("/:id/submit", post(submit_order))
        .route("/:id/approve", post(approve_order))
        .route("/:id/start", post(start_order))
        .route("/:id/deliver", post(deliver_order))
        .route("/:id/cancel", post(cancel_order))
}

fn order_response(status: StatusCode, order: &Order) -> axum::response::Response {
    (status, Json(dto::order_to_json(order))).into_response()
}

fn parse_order_id(raw: &str) -> Result<OrderId, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"))
}

async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CreateOrderRequest>,
) -> axum::response::Response {
    let vendor_id: VendorId = match body.vendor_id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid vendor id"),
    };

    let input = NewOrder {
        vendor_id,
        requested_by: body.requested_by,
        notes: body.notes,
        items: body
            .items
            .into_iter()
            .map(|i| NewLineItem {
                name: i.name,
                description: i.description,
                quantity: i.quantity,
                unit_price_cents: i.unit_price_cents,
            })
            .collect(),
    };

    match services.procurement.create(input) {
        Ok(order) => order_response(StatusCode::CREATED, &order),
        Err(e) => domain_error_to_response(e),
    }
}

async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.procurement.list_all() {
        Ok(orders) => {
            let items: Vec<_> = orders.iter().map(dto::order_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => domain_error_to_response(e),
    }
}

async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.procurement.get(id) {
        Ok(order) => order_response(StatusCode::OK, &order),
        Err(e) => domain_error_to_response(e),
    }
}

async fn list_orders_by_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(status): Path<String>,
) -> axum::response::Response {
    match services.procurement.list_by_status(&status) {
        Ok(orders) => {
            let items: Vec<_> = orders.iter().map(dto::order_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => domain_error_to_response(e),
    }
}

async fn list_orders_by_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Path(vendor_id): Path<String>,
) -> axum::response::Response {
    let vendor_id: VendorId = match vendor_id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid vendor id"),
    };
    match services.procurement.list_by_vendor(vendor_id) {
        Ok(orders) => {
            let items: Vec<_> = orders.iter().map(dto::order_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => domain_error_to_response(e),
    }
}

async fn submit_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.procurement.submit(id) {
        Ok(order) => order_response(StatusCode::OK, &order),
        Err(e) => domain_error_to_response(e),
    }
}

async fn approve_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(params): Query<ApproveParams>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.procurement.approve(id, &params.approver) {
        Ok(order) => order_response(StatusCode::OK, &order),
        Err(e) => domain_error_to_response(e),
    }
}

async fn start_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.procurement.start(id) {
        Ok(order) => order_response(StatusCode::OK, &order),
        Err(e) => domain_error_to_response(e),
    }
}

async fn deliver_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.procurement.deliver(id) {
        Ok(order) => order_response(StatusCode::OK, &order),
        Err(e) => domain_error_to_response(e),
    }
}

async fn cancel_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.procurement.cancel(id) {
        Ok(order) => order_response(StatusCode::OK, &order),
        Err(e) => domain_error_to_response(e),
    }
}
