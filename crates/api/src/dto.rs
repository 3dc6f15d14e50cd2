//! Wire DTOs and JSON projections.

use serde::Deserialize;
use serde_json::{json, Value};

use provend_core::format_cents;
use provend_notify::NotificationRecord;
use provend_orders::Order;
use provend_vendors::Vendor;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub vendor_id: String,
    pub requested_by: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct LineItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct ApproveParams {
    pub approver: String,
}

#[derive(Debug, Deserialize)]
pub struct VendorRequest {
    pub name: String,
    pub delivery_rate: f64,
    pub quality_rating: f64,
    pub price_score: f64,
}

pub fn order_to_json(order: &Order) -> Value {
    json!({
        "id": order.id.to_string(),
        "order_number": order.order_number,
        "vendor_id": order.vendor_id.to_string(),
        "status": order.status.as_str(),
        "requested_by": order.requested_by,
        "approved_by": order.approved_by,
        "created_at": order.created_at,
        "approved_at": order.approved_at,
        "delivered_at": order.delivered_at,
        "total_amount_cents": order.total_amount_cents,
        "total_amount": format_cents(order.total_amount_cents),
        "notes": order.notes,
        "items": order.items.iter().map(|item| json!({
            "name": item.name,
            "description": item.description,
            "quantity": item.quantity,
            "unit_price_cents": item.unit_price_cents,
            "line_total_cents": item.line_total_cents,
        })).collect::<Vec<_>>(),
    })
}

pub fn vendor_to_json(vendor: &Vendor) -> Value {
    json!({
        "id": vendor.id.to_string(),
        "name": vendor.name,
        "delivery_rate": vendor.delivery_rate,
        "quality_rating": vendor.quality_rating,
        "price_score": vendor.price_score,
        "performance_score": vendor.performance_score,
    })
}

pub fn notification_to_json(record: &NotificationRecord) -> Value {
    json!({
        "id": record.id.to_string(),
        "recipient": record.recipient,
        "subject": record.subject,
        "status": record.status.as_str(),
        "attempts": record.attempts,
        "last_error": record.last_error,
        "order_id": record.order_id.to_string(),
        "created_at": record.created_at,
        "sent_at": record.sent_at,
    })
}
