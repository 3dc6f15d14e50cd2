use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use provend_core::VendorId;
use provend_vendors::{Vendor, VendorStore};

use crate::dto::{self, VendorRequest};
use crate::errors::{json_error, vendor_store_error_to_response};
use crate::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_vendor).get(list_vendors))
        .route("/:id", get(get_vendor).put(update_vendor).delete(delete_vendor))
        .route("/:id/recalculate", post(recalculate_vendor))
}

fn parse_vendor_id(raw: &str) -> Result<VendorId, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid vendor id"))
}

fn load_vendor(
    services: &AppServices,
    id: VendorId,
) -> Result<Vendor, axum::response::Response> {
    match services.vendors.get(id) {
        Ok(Some(vendor)) => Ok(vendor),
        Ok(None) => Err(json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("vendor not found: {id}"),
        )),
        Err(e) => Err(vendor_store_error_to_response(e)),
    }
}

async fn create_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<VendorRequest>,
) -> axum::response::Response {
    let vendor = Vendor::new(
        body.name,
        body.delivery_rate,
        body.quality_rating,
        body.price_score,
    );
    match services.vendors.save(&vendor) {
        Ok(()) => (StatusCode::CREATED, Json(dto::vendor_to_json(&vendor))).into_response(),
        Err(e) => vendor_store_error_to_response(e),
    }
}

async fn list_vendors(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.vendors.list() {
        Ok(vendors) => {
            let items: Vec<_> = vendors.iter().map(dto::vendor_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => vendor_store_error_to_response(e),
    }
}

async fn get_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_vendor_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match load_vendor(&services, id) {
        Ok(vendor) => (StatusCode::OK, Json(dto::vendor_to_json(&vendor))).into_response(),
        Err(resp) => resp,
    }
}

async fn update_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<VendorRequest>,
) -> axum::response::Response {
    let id = match parse_vendor_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let mut vendor = match load_vendor(&services, id) {
        Ok(vendor) => vendor,
        Err(resp) => return resp,
    };

    vendor.name = body.name;
    vendor.delivery_rate = body.delivery_rate;
    vendor.quality_rating = body.quality_rating;
    vendor.price_score = body.price_score;
    vendor.recalculate();

    match services.vendors.save(&vendor) {
        Ok(()) => (StatusCode::OK, Json(dto::vendor_to_json(&vendor))).into_response(),
        Err(e) => vendor_store_error_to_response(e),
    }
}

async fn delete_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_vendor_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.vendors.delete(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => vendor_store_error_to_response(e),
    }
}

async fn recalculate_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_vendor_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let mut vendor = match load_vendor(&services, id) {
        Ok(vendor) => vendor,
        Err(resp) => return resp,
    };
    vendor.recalculate();
    match services.vendors.save(&vendor) {
        Ok(()) => (StatusCode::OK, Json(dto::vendor_to_json(&vendor))).into_response(),
        Err(e) => vendor_store_error_to_response(e),
    }
}
