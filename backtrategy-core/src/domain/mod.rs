//! Domain types for backtrategy

pub mod asset;
pub mod ids;
pub mod order;
pub mod position;
pub mod tick;

pub use asset::{AssetType, DataClass, DataKind, Market};
pub use ids::{OrderId, PositionId};
pub use order::{
    Order, OrderEffect, OrderError, OrderRequest, OrderSide, OrderState, OrderType,
};
pub use position::{Position, PositionError, PositionState, Rejection};
pub use tick::{Tick, TickRepr};
