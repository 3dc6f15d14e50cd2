use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use provend_core::{DomainError, OrderId, VendorId};

/// Procurement order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Draft,
    PendingApproval,
    Approved,
    InProgress,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "DRAFT",
            OrderStatus::PendingApproval => "PENDING_APPROVAL",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Ok(OrderStatus::Draft),
            "PENDING_APPROVAL" => Ok(OrderStatus::PendingApproval),
            "APPROVED" => Ok(OrderStatus::Approved),
            "IN_PROGRESS" => Ok(OrderStatus::InProgress),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// One line of a procurement order. Immutable once the order is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl LineItem {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        quantity: i64,
        unit_price_cents: i64,
    ) -> Result<Self, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if unit_price_cents < 0 {
            return Err(DomainError::validation("unit price must not be negative"));
        }
        let quantity = u32::try_from(quantity)
            .map_err(|_| DomainError::validation("quantity out of range"))?;
        Ok(Self {
            name: name.into(),
            description: description.into(),
            quantity,
            unit_price_cents,
            line_total_cents: i64::from(quantity) * unit_price_cents,
        })
    }
}

/// A vendor procurement order.
///
/// `status` is only ever changed through the transition methods below; the
/// total amount is fixed at creation and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub vendor_id: VendorId,
    pub items: Vec<LineItem>,
    pub status: OrderStatus,
    pub requested_by: String,
    pub approved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub total_amount_cents: i64,
    pub notes: Option<String>,
}

impl Order {
    /// Create a new order in `DRAFT` with a generated order number and a
    /// total computed once from the supplied items.
    pub fn new(
        vendor_id: VendorId,
        requested_by: impl Into<String>,
        items: Vec<LineItem>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::validation(
                "an order requires at least one line item",
            ));
        }
        let total_amount_cents = items.iter().map(|i| i.line_total_cents).sum();
        Ok(Self {
            id: OrderId::new(),
            order_number: generate_order_number(),
            vendor_id,
            items,
            status: OrderStatus::Draft,
            requested_by: requested_by.into(),
            approved_by: None,
            created_at: now,
            approved_at: None,
            delivered_at: None,
            total_amount_cents,
            notes,
        })
    }

    fn require_status(
        &self,
        operation: &'static str,
        required: OrderStatus,
    ) -> Result<(), DomainError> {
        if self.status != required {
            return Err(DomainError::invalid_transition(operation, self.status.as_str()));
        }
        Ok(())
    }

    /// `DRAFT → PENDING_APPROVAL`.
    pub fn submit(&mut self) -> Result<(), DomainError> {
        self.require_status("submit", OrderStatus::Draft)?;
        self.status = OrderStatus::PendingApproval;
        Ok(())
    }

    /// `PENDING_APPROVAL → APPROVED`, recording the approver and timestamp.
    pub fn approve(
        &mut self,
        approver: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.require_status("approve", OrderStatus::PendingApproval)?;
        self.status = OrderStatus::Approved;
        self.approved_by = Some(approver.into());
        self.approved_at = Some(now);
        Ok(())
    }

    /// `APPROVED → IN_PROGRESS`.
    pub fn start(&mut self) -> Result<(), DomainError> {
        self.require_status("start", OrderStatus::Approved)?;
        self.status = OrderStatus::InProgress;
        Ok(())
    }

    /// `IN_PROGRESS → DELIVERED`, recording the delivery timestamp.
    pub fn deliver(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.require_status("deliver", OrderStatus::InProgress)?;
        self.status = OrderStatus::Delivered;
        self.delivered_at = Some(now);
        Ok(())
    }

    /// Any status except `DELIVERED` → `CANCELLED`.
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status == OrderStatus::Delivered {
            return Err(DomainError::invalid_transition("cancel", self.status.as_str()));
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }
}

/// Human-readable order number: `PO-` plus 8 uppercase hex characters.
/// Generated once at creation, immutable thereafter.
fn generate_order_number() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("PO-{}", raw[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_items() -> Vec<LineItem> {
        vec![
            LineItem::new("Laptop", "Dev laptop", 3, 1000).unwrap(),
            LineItem::new("Mouse", "Wireless", 1, 500).unwrap(),
        ]
    }

    fn draft_order() -> Order {
        Order::new(VendorId::new(), "requester@corp.test", test_items(), None, Utc::now()).unwrap()
    }

    fn order_in(status: OrderStatus) -> Order {
        let mut order = draft_order();
        let now = Utc::now();
        match status {
            OrderStatus::Draft => {}
            OrderStatus::PendingApproval => order.submit().unwrap(),
            OrderStatus::Approved => {
                order.submit().unwrap();
                order.approve("alice", now).unwrap();
            }
            OrderStatus::InProgress => {
                order.submit().unwrap();
                order.approve("alice", now).unwrap();
                order.start().unwrap();
            }
            OrderStatus::Delivered => {
                order.submit().unwrap();
                order.approve("alice", now).unwrap();
                order.start().unwrap();
                order.deliver(now).unwrap();
            }
            OrderStatus::Cancelled => order.cancel().unwrap(),
        }
        assert_eq!(order.status, status);
        order
    }

    #[test]
    fn total_is_the_sum_of_line_totals() {
        let order = draft_order();
        assert_eq!(order.total_amount_cents, 3500);
        assert_eq!(order.items[0].line_total_cents, 3000);
    }

    #[test]
    fn order_number_is_prefixed_and_short() {
        let order = draft_order();
        assert!(order.order_number.starts_with("PO-"));
        assert_eq!(order.order_number.len(), 11);
    }

    #[test]
    fn creation_rejects_empty_items() {
        let err = Order::new(VendorId::new(), "r", vec![], None, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn line_item_rejects_non_positive_quantity_and_negative_price() {
        assert!(matches!(
            LineItem::new("x", "", 0, 100),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            LineItem::new("x", "", -2, 100),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            LineItem::new("x", "", 1, -1),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn approve_records_approver_and_timestamp() {
        let mut order = order_in(OrderStatus::PendingApproval);
        let now = Utc::now();
        order.approve("alice", now).unwrap();
        assert_eq!(order.status, OrderStatus::Approved);
        assert_eq!(order.approved_by.as_deref(), Some("alice"));
        assert_eq!(order.approved_at, Some(now));
    }

    #[test]
    fn deliver_records_timestamp() {
        let mut order = order_in(OrderStatus::InProgress);
        let now = Utc::now();
        order.deliver(now).unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.delivered_at, Some(now));
    }

    /// Every (status, operation) pair not in the lifecycle table must fail
    /// with `InvalidTransition` and leave the order untouched.
    #[test]
    fn illegal_transitions_are_exhaustively_rejected() {
        use OrderStatus::*;

        let all = [Draft, PendingApproval, Approved, InProgress, Delivered, Cancelled];
        for status in all {
            for operation in ["submit", "approve", "start", "deliver", "cancel"] {
                let legal = matches!(
                    (status, operation),
                    (Draft, "submit")
                        | (PendingApproval, "approve")
                        | (Approved, "start")
                        | (InProgress, "deliver")
                        | (Draft | PendingApproval | Approved | InProgress | Cancelled, "cancel")
                );

                let mut order = order_in(status);
                let before = order.clone();
                let now = Utc::now();
                let result = match operation {
                    "submit" => order.submit(),
                    "approve" => order.approve("alice", now),
                    "start" => order.start(),
                    "deliver" => order.deliver(now),
                    "cancel" => order.cancel(),
                    _ => unreachable!(),
                };

                if legal {
                    assert!(result.is_ok(), "{operation} from {status} should be legal");
                } else {
                    match result {
                        Err(DomainError::InvalidTransition {
                            operation: op,
                            status: s,
                        }) => {
                            assert_eq!(op, operation);
                            assert_eq!(s, status.as_str());
                        }
                        other => {
                            panic!("{operation} from {status} should be rejected, got {other:?}")
                        }
                    }
                    assert_eq!(order, before, "{operation} from {status} must not mutate");
                }
            }
        }
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(
            "pending_approval".parse::<OrderStatus>().unwrap(),
            OrderStatus::PendingApproval
        );
        assert!(matches!(
            "SHIPPED".parse::<OrderStatus>(),
            Err(DomainError::Validation(_))
        ));
    }
}
