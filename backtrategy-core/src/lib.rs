//! Backtrategy Core: the nucleus of a backtesting engine.
//!
//! - Domain types (assets, ticks, orders, positions, identifiers)
//! - Order lifecycle state machine with parent links for closing orders
//! - Position bookkeeping with partial and full closes
//! - MarketClock: a forward-only cursor over a time-ordered polars table
//! - TOML clock configuration

pub mod config;
pub mod data;
pub mod domain;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: core types can move to and be shared across threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Order>();
        require_sync::<domain::Order>();
        require_send::<domain::OrderRequest>();
        require_sync::<domain::OrderRequest>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Tick>();
        require_sync::<domain::Tick>();
        require_send::<domain::TickRepr>();
        require_sync::<domain::TickRepr>();
        require_send::<domain::OrderId>();
        require_sync::<domain::OrderId>();

        // Data types
        require_send::<data::MarketClock>();
        require_sync::<data::MarketClock>();
        require_send::<data::RowView>();
        require_sync::<data::RowView>();

        require_send::<config::ClockConfig>();
        require_sync::<config::ClockConfig>();
    }
}
