//! Position tracking: one executed opening order reduced by executed closing orders.
//!
//! Quantity accounting keeps a single counter, the remaining quantity. Every
//! other quantity view is computed from it and the opening order.

use super::asset::AssetType;
use super::ids::PositionId;
use super::order::{Order, OrderEffect, OrderRequest, OrderSide, OrderState};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionState {
    Open,
    PartialClosed,
    Closed,
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PositionState::Open => "open",
            PositionState::PartialClosed => "partial_closed",
            PositionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error(
        "order {order_id} cannot open a position (effect: {effect}, state: {state}); \
         it must be an executed open order"
    )]
    InvalidOpeningOrder {
        order_id: PositionId,
        effect: OrderEffect,
        state: OrderState,
    },
}

/// Why a closing order was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("position is {0}")]
    NotOpen(PositionState),

    #[error("order asset {found} does not match position asset {expected}")]
    AssetMismatch { expected: String, found: String },

    #[error("order is {0}, same side as the position")]
    SameSide(OrderSide),

    #[error("order is {0}, not executed")]
    NotExecuted(OrderState),

    #[error("requested {requested} exceeds remaining {remaining}")]
    ExceedsRemaining {
        requested: Decimal,
        remaining: Decimal,
    },
}

/// Net exposure created by an executed opening order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    opening: Order,
    remaining: Decimal,
    take_profit: Option<Decimal>,
    stop_loss: Option<Decimal>,
    state: PositionState,
    closing_orders: Vec<Order>,
}

impl Position {
    /// Open a position from an executed order with effect `Open`.
    pub fn open(opening: Order) -> Result<Self, PositionError> {
        if opening.effect() != OrderEffect::Open || !opening.is_executed() {
            return Err(PositionError::InvalidOpeningOrder {
                order_id: opening.id().clone(),
                effect: opening.effect(),
                state: opening.state(),
            });
        }

        tracing::debug!(
            position_id = %opening.id(),
            asset_id = %opening.asset_id(),
            side = %opening.side(),
            quantity = %opening.quantity(),
            "position opened"
        );

        Ok(Self {
            remaining: opening.quantity(),
            take_profit: opening.take_profit(),
            stop_loss: opening.stop_loss(),
            state: PositionState::Open,
            closing_orders: Vec::new(),
            opening,
        })
    }

    /// Reduce the position by `order.quantity()`.
    ///
    /// Accepted only while the position is `Open`, for a validated order whose
    /// quantity does not exceed the remaining quantity. A partially closed
    /// position can only be finished with [`Position::close`]. Reaching zero
    /// closes the position.
    pub fn partial_close(&mut self, order: &Order) -> bool {
        let checked = self.check_closing(order).and_then(|()| {
            if self.state != PositionState::Open {
                Err(Rejection::NotOpen(self.state))
            } else if order.quantity() > self.remaining {
                Err(Rejection::ExceedsRemaining {
                    requested: order.quantity(),
                    remaining: self.remaining,
                })
            } else {
                Ok(())
            }
        });
        if let Err(reason) = checked {
            self.log_rejection(order, &reason);
            return false;
        }

        self.remaining -= order.quantity();
        self.state = if self.remaining.is_zero() {
            PositionState::Closed
        } else {
            PositionState::PartialClosed
        };
        self.closing_orders.push(order.clone());
        tracing::debug!(
            position_id = %self.id(),
            order_id = %order.id(),
            remaining = %self.remaining,
            state = %self.state,
            "position partially closed"
        );
        true
    }

    /// Close whatever remains.
    ///
    /// The closing order's quantity is not bound-checked against the remaining
    /// quantity: an accepted close always leaves zero remaining.
    pub fn close(&mut self, order: &Order) -> bool {
        if let Err(reason) = self.check_closing(order) {
            self.log_rejection(order, &reason);
            return false;
        }

        if order.quantity() != self.remaining {
            tracing::debug!(
                position_id = %self.id(),
                order_id = %order.id(),
                requested = %order.quantity(),
                remaining = %self.remaining,
                "close quantity differs from remaining"
            );
        }
        self.remaining = Decimal::ZERO;
        self.state = PositionState::Closed;
        self.closing_orders.push(order.clone());
        tracing::debug!(position_id = %self.id(), order_id = %order.id(), "position closed");
        true
    }

    fn check_closing(&self, order: &Order) -> Result<(), Rejection> {
        match self.state {
            PositionState::Open | PositionState::PartialClosed => {}
            PositionState::Closed => return Err(Rejection::NotOpen(self.state)),
        }
        if order.asset_id() != self.asset_id() || order.asset_type() != self.asset_type() {
            return Err(Rejection::AssetMismatch {
                expected: format!("{} ({})", self.asset_id(), self.asset_type()),
                found: format!("{} ({})", order.asset_id(), order.asset_type()),
            });
        }
        if order.side() == self.side() {
            return Err(Rejection::SameSide(order.side()));
        }
        if order.state() != OrderState::Executed {
            return Err(Rejection::NotExecuted(order.state()));
        }
        Ok(())
    }

    fn log_rejection(&self, order: &Order, reason: &Rejection) {
        tracing::debug!(
            position_id = %self.id(),
            order_id = %order.id(),
            %reason,
            "closing order rejected"
        );
    }

    /// A market request that would close the remaining quantity at `price`.
    pub fn close_request(&self, price: Decimal) -> OrderRequest {
        OrderRequest::close(
            self.id(),
            self.asset_id(),
            self.asset_type(),
            self.side().opposite(),
            self.remaining,
            price,
        )
    }

    /// A market request that would reduce the position by `quantity` at `price`.
    pub fn partial_close_request(&self, quantity: Decimal, price: Decimal) -> OrderRequest {
        OrderRequest::partial_close(
            self.id(),
            self.asset_id(),
            self.asset_type(),
            self.side().opposite(),
            quantity,
            price,
        )
    }

    pub fn set_take_profit(&mut self, price: Option<Decimal>) {
        self.take_profit = price;
    }

    pub fn set_stop_loss(&mut self, price: Option<Decimal>) {
        self.stop_loss = price;
    }

    pub fn id(&self) -> &PositionId {
        self.opening.id()
    }

    pub fn asset_id(&self) -> &str {
        self.opening.asset_id()
    }

    pub fn asset_type(&self) -> AssetType {
        self.opening.asset_type()
    }

    pub fn side(&self) -> OrderSide {
        self.opening.side()
    }

    pub fn open_price(&self) -> Decimal {
        self.opening.price()
    }

    /// Execution time of the opening order.
    pub fn open_time(&self) -> Option<DateTime<Utc>> {
        self.opening.executed_at()
    }

    pub fn opening_quantity(&self) -> Decimal {
        self.opening.quantity()
    }

    pub fn current_quantity(&self) -> Decimal {
        self.remaining
    }

    pub fn closed_quantity(&self) -> Decimal {
        self.opening.quantity() - self.remaining
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    /// True only in the `Open` state, before any partial close.
    pub fn is_open(&self) -> bool {
        self.state == PositionState::Open
    }

    /// True until the position is closed.
    pub fn is_active(&self) -> bool {
        self.state != PositionState::Closed
    }

    pub fn is_closed(&self) -> bool {
        self.state == PositionState::Closed
    }

    pub fn take_profit(&self) -> Option<Decimal> {
        self.take_profit
    }

    pub fn stop_loss(&self) -> Option<Decimal> {
        self.stop_loss
    }

    pub fn opening_order(&self) -> &Order {
        &self.opening
    }

    pub fn closing_orders(&self) -> &[Order] {
        &self.closing_orders
    }
}
