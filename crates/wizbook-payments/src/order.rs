//! Order Tracking
//!
//! Holds checkout state between session creation and webhook confirmation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::catalog::TierId;
use crate::error::{PaymentError, Result};

/// Order identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    /// Generate a new order id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Parse from string
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payment status of an order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, no payment session yet
    Pending,
    /// Payment session created, waiting on the provider
    AwaitingPayment,
    /// Payment confirmed by webhook
    Paid,
    /// Payment failed
    Failed,
    /// Checkout abandoned or expired
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::AwaitingPayment => "awaiting_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::Failed => "failed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states are never overwritten
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Paid | OrderStatus::Failed | OrderStatus::Cancelled
        )
    }
}

/// Result of applying a status transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The transition was applied now
    Applied,
    /// The order was already in a terminal state; nothing changed
    AlreadySettled,
}

/// One checkout attempt
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    /// Order id
    pub id: OrderId,

    /// Book topic being purchased
    pub topic: String,

    /// Selected tier
    pub tier: TierId,

    /// Selected upsell ids
    pub upsells: Vec<String>,

    /// Customer email, if captured
    pub email: Option<String>,

    /// Computed total in minor currency units
    pub total_cents: i64,

    /// Payment status
    pub status: OrderStatus,

    /// External payment-session reference
    pub session_ref: Option<String>,

    /// Whether this order runs in demo mode (no real charge)
    pub demo: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new pending order
    pub fn new(
        topic: impl Into<String>,
        tier: TierId,
        upsells: Vec<String>,
        email: Option<String>,
        total_cents: i64,
    ) -> Self {
        Self {
            id: OrderId::generate(),
            topic: topic.into(),
            tier,
            upsells,
            email,
            total_cents,
            status: OrderStatus::Pending,
            session_ref: None,
            demo: false,
            created_at: Utc::now(),
        }
    }
}

/// Order storage trait
pub trait OrderStore: Send + Sync {
    /// Insert a new order
    fn insert(&self, order: &Order) -> Result<()>;

    /// Get order by id
    fn get(&self, id: &OrderId) -> Result<Option<Order>>;

    /// Get order by external session reference
    fn get_by_session(&self, session_ref: &str) -> Result<Option<Order>>;

    /// Record the payment-session reference and move the order to
    /// `awaiting_payment`
    fn attach_session(&self, id: &OrderId, session_ref: &str, demo: bool) -> Result<()>;

    /// Record the customer email on an existing order
    fn attach_email(&self, id: &OrderId, email: &str) -> Result<()>;

    /// Transition the order for a session to `paid` (idempotent)
    fn mark_paid(&self, session_ref: &str) -> Result<Transition>;

    /// Transition the order for a session to `failed` or `cancelled`
    /// (idempotent)
    fn mark_failed(&self, session_ref: &str, cancelled: bool) -> Result<Transition>;
}

/// In-memory order store
///
/// Orders are indexed by id, with a secondary index from the external
/// session reference for webhook lookups.
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
    by_session: RwLock<HashMap<String, OrderId>>,
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            by_session: RwLock::new(HashMap::new()),
        }
    }

    // The index lock is released before the order lock is taken, so this
    // cannot deadlock against attach_session.
    fn transition(
        &self,
        session_ref: &str,
        next: OrderStatus,
    ) -> Result<Transition> {
        let id = {
            let by_session = self.by_session.read().unwrap();
            by_session.get(session_ref).cloned()
        }
        .ok_or_else(|| PaymentError::UnknownSession(session_ref.to_string()))?;

        let mut orders = self.orders.write().unwrap();
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| PaymentError::Storage(format!("missing order {id}")))?;

        if order.status.is_terminal() {
            return Ok(Transition::AlreadySettled);
        }

        order.status = next;
        Ok(Transition::Applied)
    }
}

impl OrderStore for MemoryOrderStore {
    fn insert(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().unwrap();
        orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    fn get(&self, id: &OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().unwrap();
        Ok(orders.get(id).cloned())
    }

    fn get_by_session(&self, session_ref: &str) -> Result<Option<Order>> {
        let id = {
            let by_session = self.by_session.read().unwrap();
            by_session.get(session_ref).cloned()
        };

        match id {
            Some(id) => {
                let orders = self.orders.read().unwrap();
                Ok(orders.get(&id).cloned())
            }
            None => Ok(None),
        }
    }

    fn attach_session(&self, id: &OrderId, session_ref: &str, demo: bool) -> Result<()> {
        let mut orders = self.orders.write().unwrap();
        let mut by_session = self.by_session.write().unwrap();

        let order = orders
            .get_mut(id)
            .ok_or_else(|| PaymentError::Storage(format!("missing order {id}")))?;

        order.session_ref = Some(session_ref.to_string());
        order.demo = demo;
        order.status = OrderStatus::AwaitingPayment;
        by_session.insert(session_ref.to_string(), id.clone());

        Ok(())
    }

    fn attach_email(&self, id: &OrderId, email: &str) -> Result<()> {
        let mut orders = self.orders.write().unwrap();
        let order = orders
            .get_mut(id)
            .ok_or_else(|| PaymentError::Storage(format!("missing order {id}")))?;
        order.email = Some(email.to_string());
        Ok(())
    }

    fn mark_paid(&self, session_ref: &str) -> Result<Transition> {
        self.transition(session_ref, OrderStatus::Paid)
    }

    fn mark_failed(&self, session_ref: &str, cancelled: bool) -> Result<Transition> {
        let next = if cancelled {
            OrderStatus::Cancelled
        } else {
            OrderStatus::Failed
        };
        self.transition(session_ref, next)
    }
}
