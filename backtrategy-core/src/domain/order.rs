//! Order types and the order lifecycle state machine.
//!
//! An order is created `Open` and moves exactly once, to `Executed` or
//! `Canceled`. Both are terminal: later transition attempts are rejected and
//! leave the recorded times untouched.

use super::asset::AssetType;
use super::ids::OrderId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// How the order is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
    StopLimit,
}

/// What the order does to exposure. Not to be confused with [`OrderState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEffect {
    Open,
    Close,
    PartialClose,
}

impl OrderEffect {
    /// Close and partial-close orders must reference the order they close.
    pub fn is_closing(self) -> bool {
        matches!(self, OrderEffect::Close | OrderEffect::PartialClose)
    }
}

impl fmt::Display for OrderEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderEffect::Open => "open",
            OrderEffect::Close => "close",
            OrderEffect::PartialClose => "partial_close",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Long,
    Short,
}

impl OrderSide {
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Long => OrderSide::Short,
            OrderSide::Short => OrderSide::Long,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Long => f.write_str("long"),
            OrderSide::Short => f.write_str("short"),
        }
    }
}

/// Order lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// Open: accepted, not yet executed or canceled
    Open,
    /// Executed: terminal
    Executed,
    /// Canceled: terminal
    Canceled,
}

impl OrderState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderState::Open)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderState::Open => "open",
            OrderState::Executed => "executed",
            OrderState::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("{effect} order requires a parent order id")]
    MissingParent { effect: OrderEffect },

    #[error("order quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),
}

/// Everything a caller specifies about an order. Identity, creation time and
/// state are assigned by [`Order::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub asset_id: String,
    pub asset_type: AssetType,
    pub effect: OrderEffect,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Decimal,
    #[serde(default)]
    pub partial_fill: bool,
    #[serde(default)]
    pub take_profit: Option<Decimal>,
    #[serde(default)]
    pub stop_loss: Option<Decimal>,
    #[serde(default)]
    pub parent_id: Option<OrderId>,
}

impl OrderRequest {
    /// A market order opening new exposure.
    pub fn open(
        asset_id: impl Into<String>,
        asset_type: AssetType,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            asset_id: asset_id.into(),
            asset_type,
            effect: OrderEffect::Open,
            side,
            order_type: OrderType::Market,
            quantity,
            price,
            partial_fill: false,
            take_profit: None,
            stop_loss: None,
            parent_id: None,
        }
    }

    /// A market order fully closing the exposure opened by `parent`.
    pub fn close(
        parent: &OrderId,
        asset_id: impl Into<String>,
        asset_type: AssetType,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            effect: OrderEffect::Close,
            parent_id: Some(parent.clone()),
            ..Self::open(asset_id, asset_type, side, quantity, price)
        }
    }

    /// A market order reducing the exposure opened by `parent`.
    pub fn partial_close(
        parent: &OrderId,
        asset_id: impl Into<String>,
        asset_type: AssetType,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            effect: OrderEffect::PartialClose,
            ..Self::close(parent, asset_id, asset_type, side, quantity, price)
        }
    }

    pub fn with_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }

    pub fn with_partial_fill(mut self, partial_fill: bool) -> Self {
        self.partial_fill = partial_fill;
        self
    }

    pub fn with_take_profit(mut self, price: Decimal) -> Self {
        self.take_profit = Some(price);
        self
    }

    pub fn with_stop_loss(mut self, price: Decimal) -> Self {
        self.stop_loss = Some(price);
        self
    }

    pub fn with_parent(mut self, parent: OrderId) -> Self {
        self.parent_id = Some(parent);
        self
    }
}

/// A single trading instruction with its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    id: OrderId,
    asset_id: String,
    asset_type: AssetType,
    effect: OrderEffect,
    side: OrderSide,
    order_type: OrderType,
    quantity: Decimal,
    price: Decimal,
    partial_fill: bool,
    created_at: DateTime<Utc>,
    parent_id: Option<OrderId>,
    state: OrderState,
    take_profit: Option<Decimal>,
    stop_loss: Option<Decimal>,
    executed_at: Option<DateTime<Utc>>,
    canceled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Validate a request and create an `Open` order with a fresh id.
    pub fn new(request: OrderRequest) -> Result<Self, OrderError> {
        let has_parent = request
            .parent_id
            .as_ref()
            .is_some_and(|parent| !parent.is_empty());
        if request.effect.is_closing() && !has_parent {
            return Err(OrderError::MissingParent {
                effect: request.effect,
            });
        }
        if request.quantity <= Decimal::ZERO {
            return Err(OrderError::NonPositiveQuantity(request.quantity));
        }

        let order = Self {
            id: OrderId::generate(),
            asset_id: request.asset_id,
            asset_type: request.asset_type,
            effect: request.effect,
            side: request.side,
            order_type: request.order_type,
            quantity: request.quantity,
            price: request.price,
            partial_fill: request.partial_fill,
            created_at: Utc::now(),
            parent_id: request.parent_id.filter(|parent| !parent.is_empty()),
            state: OrderState::Open,
            take_profit: request.take_profit,
            stop_loss: request.stop_loss,
            executed_at: None,
            canceled_at: None,
        };
        tracing::debug!(
            order_id = %order.id,
            asset_id = %order.asset_id,
            effect = %order.effect,
            side = %order.side,
            quantity = %order.quantity,
            "order created"
        );
        Ok(order)
    }

    /// quantity × price
    pub fn total_money(&self) -> Decimal {
        self.quantity * self.price
    }

    /// Open → Canceled, stamped with the wall clock.
    pub fn cancel(&mut self) -> bool {
        self.cancel_at(Utc::now())
    }

    /// Open → Canceled, stamped with `at` (typically the market clock's time).
    pub fn cancel_at(&mut self, at: DateTime<Utc>) -> bool {
        if !self.transition(OrderState::Canceled) {
            return false;
        }
        self.canceled_at = Some(at);
        true
    }

    /// Open → Executed, stamped with the wall clock.
    pub fn execute(&mut self) -> bool {
        self.execute_at(Utc::now())
    }

    /// Open → Executed, stamped with `at` (typically the market clock's time).
    pub fn execute_at(&mut self, at: DateTime<Utc>) -> bool {
        if !self.transition(OrderState::Executed) {
            return false;
        }
        self.executed_at = Some(at);
        true
    }

    fn transition(&mut self, to: OrderState) -> bool {
        match (self.state, to) {
            (OrderState::Open, OrderState::Executed | OrderState::Canceled) => {
                tracing::debug!(
                    order_id = %self.id,
                    from = %self.state,
                    to = %to,
                    "order transition"
                );
                self.state = to;
                true
            }
            (from, to) => {
                tracing::debug!(
                    order_id = %self.id,
                    from = %from,
                    to = %to,
                    "order transition rejected"
                );
                false
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == OrderState::Open
    }

    pub fn is_executed(&self) -> bool {
        self.state == OrderState::Executed
    }

    pub fn is_canceled(&self) -> bool {
        self.state == OrderState::Canceled
    }

    /// Whether this order closes exposure. Tests the effect, not the lifecycle state.
    pub fn is_closed_effect(&self) -> bool {
        self.effect.is_closing()
    }

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    pub fn effect(&self) -> OrderEffect {
        self.effect
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn partial_fill(&self) -> bool {
        self.partial_fill
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn parent_id(&self) -> Option<&OrderId> {
        self.parent_id.as_ref()
    }

    pub fn state(&self) -> OrderState {
        self.state
    }

    pub fn take_profit(&self) -> Option<Decimal> {
        self.take_profit
    }

    pub fn stop_loss(&self) -> Option<Decimal> {
        self.stop_loss
    }

    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.executed_at
    }

    pub fn canceled_at(&self) -> Option<DateTime<Utc>> {
        self.canceled_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn open_request() -> OrderRequest {
        OrderRequest::open(
            "eur/usd",
            AssetType::Cfd,
            OrderSide::Long,
            Decimal::new(11, 1),
            Decimal::from(1000),
        )
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn new_order_starts_open() {
        let order = Order::new(open_request()).unwrap();
        assert_eq!(order.state(), OrderState::Open);
        assert!(order.is_open());
        assert!(!order.is_executed());
        assert!(!order.is_canceled());
        assert_eq!(order.executed_at(), None);
        assert_eq!(order.canceled_at(), None);
        assert_eq!(order.parent_id(), None);
        assert_eq!(order.order_type(), OrderType::Market);
    }

    #[test]
    fn each_order_gets_its_own_id_and_time() {
        let first = Order::new(open_request()).unwrap();
        let second = Order::new(open_request()).unwrap();
        assert_ne!(first.id(), second.id());
        assert!(first.id() < second.id());
        assert!(first.created_at() <= second.created_at());
    }

    #[test]
    fn total_money_is_quantity_times_price() {
        let order = Order::new(open_request()).unwrap();
        assert_eq!(order.total_money(), Decimal::from(1100));
    }

    #[test]
    fn closing_effect_requires_parent() {
        for effect in [OrderEffect::Close, OrderEffect::PartialClose] {
            let mut request = open_request();
            request.effect = effect;
            assert_eq!(
                Order::new(request.clone()),
                Err(OrderError::MissingParent { effect })
            );

            request.parent_id = Some(OrderId::new(""));
            assert_eq!(
                Order::new(request.clone()),
                Err(OrderError::MissingParent { effect })
            );

            request.parent_id = Some(OrderId::new("01F8MECHZX3TBDSZ7XRADM79XV"));
            let order = Order::new(request).unwrap();
            assert!(order.is_closed_effect());
            assert_eq!(
                order.parent_id().unwrap().as_str(),
                "01F8MECHZX3TBDSZ7XRADM79XV"
            );
        }
    }

    #[test]
    fn open_effect_needs_no_parent() {
        let order = Order::new(open_request()).unwrap();
        assert!(!order.is_closed_effect());
    }

    #[test]
    fn non_positive_quantity_rejected() {
        let mut request = open_request();
        request.quantity = Decimal::ZERO;
        assert_eq!(
            Order::new(request.clone()),
            Err(OrderError::NonPositiveQuantity(Decimal::ZERO))
        );

        request.quantity = Decimal::from(-3);
        assert!(matches!(
            Order::new(request),
            Err(OrderError::NonPositiveQuantity(_))
        ));
    }

    #[test]
    fn execute_then_cancel_is_rejected() {
        let mut order = Order::new(open_request()).unwrap();
        assert!(order.execute_at(at(2)));
        assert!(order.is_executed());
        assert_eq!(order.executed_at(), Some(at(2)));

        assert!(!order.cancel_at(at(3)));
        assert!(!order.execute_at(at(4)));
        assert!(order.is_executed());
        assert_eq!(order.executed_at(), Some(at(2)));
        assert_eq!(order.canceled_at(), None);
    }

    #[test]
    fn cancel_then_execute_is_rejected() {
        let mut order = Order::new(open_request()).unwrap();
        assert!(order.cancel_at(at(2)));
        assert!(order.is_canceled());
        assert_eq!(order.canceled_at(), Some(at(2)));

        assert!(!order.execute_at(at(3)));
        assert!(!order.cancel_at(at(4)));
        assert!(order.is_canceled());
        assert_eq!(order.canceled_at(), Some(at(2)));
        assert_eq!(order.executed_at(), None);
    }

    #[test]
    fn wall_clock_transitions_record_time() {
        let mut order = Order::new(open_request()).unwrap();
        assert!(order.execute());
        let executed_at = order.executed_at().unwrap();
        assert!(executed_at >= order.created_at());
        assert!(!order.cancel());
    }

    #[test]
    fn builder_helpers_set_optional_fields() {
        let parent = OrderId::new("parent");
        let request = OrderRequest::partial_close(
            &parent,
            "BTC",
            AssetType::Crypto,
            OrderSide::Short,
            Decimal::ONE,
            Decimal::from(30_000),
        )
        .with_type(OrderType::StopLimit)
        .with_partial_fill(true)
        .with_take_profit(Decimal::from(25_000))
        .with_stop_loss(Decimal::from(32_000));

        let order = Order::new(request).unwrap();
        assert_eq!(order.effect(), OrderEffect::PartialClose);
        assert_eq!(order.order_type(), OrderType::StopLimit);
        assert!(order.partial_fill());
        assert_eq!(order.take_profit(), Some(Decimal::from(25_000)));
        assert_eq!(order.stop_loss(), Some(Decimal::from(32_000)));
        assert_eq!(order.parent_id(), Some(&parent));
    }

    #[test]
    fn side_opposite() {
        assert_eq!(OrderSide::Long.opposite(), OrderSide::Short);
        assert_eq!(OrderSide::Short.opposite(), OrderSide::Long);
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let json = r#"{
            "asset_id": "AAPL",
            "asset_type": "shares",
            "effect": "open",
            "side": "long",
            "order_type": "limit",
            "quantity": "10",
            "price": "150.25"
        }"#;
        let request: OrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.order_type, OrderType::Limit);
        assert_eq!(request.price, Decimal::new(15025, 2));
        assert!(!request.partial_fill);
        assert_eq!(request.parent_id, None);
    }

    #[test]
    fn order_serializes_state_snake_case() {
        let mut order = Order::new(open_request()).unwrap();
        order.execute_at(at(2));
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["state"], "executed");
        assert_eq!(json["effect"], "open");
        assert_eq!(json["id"], order.id().as_str());
    }
}
