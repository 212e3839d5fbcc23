//! Property tests for clock and bookkeeping invariants.
//!
//! Uses proptest to verify:
//! 1. Row coverage: a bound series of N rows yields exactly N rows, then nothing
//! 2. Reset: a rewound clock replays the same rows
//! 3. Quantity accounting: remaining + closed always equals the opening quantity,
//!    and only an untouched position accepts a partial close
//! 4. Order terminality: a finished order never changes state again

use backtrategy_core::data::MarketClock;
use backtrategy_core::domain::{
    AssetType, DataClass, DataKind, Market, Order, OrderRequest, OrderSide, OrderState, Position,
    PositionState, TickRepr,
};
use chrono::{Duration, TimeZone, Utc};
use polars::prelude::*;
use proptest::prelude::*;
use rust_decimal::Decimal;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_prices(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((1.0..2.0_f64).prop_map(|p| (p * 10_000.0).round() / 10_000.0), len)
}

fn arb_series() -> impl Strategy<Value = DataFrame> {
    (0usize..40).prop_flat_map(|len| {
        arb_prices(len).prop_map(move |asks| {
            let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
            let times: Vec<String> = (0..len)
                .map(|i| (start + Duration::minutes(i as i64)).to_rfc3339())
                .collect();
            let bids: Vec<f64> = asks.iter().map(|a| a - 0.0005).collect();
            df!("time" => times, "ask" => asks, "bid" => bids).unwrap()
        })
    })
}

fn arb_quantity() -> impl Strategy<Value = Decimal> {
    (1i64..10_000).prop_map(|q| Decimal::new(q, 2))
}

fn bind(df: DataFrame) -> MarketClock {
    MarketClock::bind(
        df,
        TickRepr::new("time", "ask", "bid", ""),
        DataClass::new(Market::Forex, DataKind::Tick),
        None,
    )
    .unwrap()
}

fn executed(request: OrderRequest) -> Order {
    let mut order = Order::new(request).unwrap();
    order.execute();
    order
}

// ── 1. Row Coverage ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn every_row_exactly_once(df in arb_series()) {
        let rows = df.height();
        let mut clock = bind(df);

        let mut seen = usize::from(clock.current().is_some());
        while clock.advance().is_some() {
            seen += 1;
        }
        prop_assert_eq!(seen, rows);
        prop_assert!(clock.is_exhausted());
        prop_assert!(clock.advance().is_none());
    }

    #[test]
    fn timestamps_follow_row_order(df in arb_series()) {
        let mut clock = bind(df);
        let mut previous = None;
        while !clock.is_exhausted() {
            let now = clock.current_time().unwrap();
            if let Some(prev) = previous {
                prop_assert!(prev < now);
            }
            previous = Some(now);
            clock.advance();
        }
    }
}

// ── 2. Reset ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn reset_replays_identically(df in arb_series(), steps in 0usize..50) {
        let mut clock = bind(df);
        let first_pass: Vec<_> = clock.clone().collect();

        for _ in 0..steps {
            clock.advance();
        }
        clock.reset();
        let second_pass: Vec<_> = clock.collect();
        prop_assert_eq!(first_pass, second_pass);
    }
}

// ── 3. Quantity Accounting ───────────────────────────────────────────

proptest! {
    #[test]
    fn remaining_plus_closed_is_opening(
        opening in arb_quantity(),
        cuts in prop::collection::vec(arb_quantity(), 0..8),
    ) {
        let order = executed(OrderRequest::open(
            "eur/usd",
            AssetType::Cfd,
            OrderSide::Long,
            opening,
            Decimal::ONE,
        ));
        let mut position = Position::open(order).unwrap();

        for cut in cuts {
            let before = position.current_quantity();
            let was_open = position.state() == PositionState::Open;
            let order = executed(position.partial_close_request(cut, Decimal::ONE));
            let accepted = position.partial_close(&order);

            prop_assert_eq!(accepted, was_open && cut <= before);
            if !accepted {
                prop_assert_eq!(position.current_quantity(), before);
            }
            prop_assert_eq!(
                position.current_quantity() + position.closed_quantity(),
                position.opening_quantity()
            );
            prop_assert!(position.current_quantity() >= Decimal::ZERO);
            if position.current_quantity().is_zero() {
                prop_assert_eq!(position.state(), PositionState::Closed);
            }
        }
    }
}

// ── 4. Order Terminality ─────────────────────────────────────────────

proptest! {
    #[test]
    fn terminal_orders_stay_terminal(cancel_first in any::<bool>(), attempts in 1usize..5) {
        let mut order = Order::new(OrderRequest::open(
            "AAPL",
            AssetType::Shares,
            OrderSide::Long,
            Decimal::ONE,
            Decimal::ONE_HUNDRED,
        ))
        .unwrap();

        let finished = if cancel_first { order.cancel() } else { order.execute() };
        prop_assert!(finished);
        let state = order.state();
        prop_assert_ne!(state, OrderState::Open);

        for _ in 0..attempts {
            prop_assert!(!order.cancel());
            prop_assert!(!order.execute());
            prop_assert_eq!(order.state(), state);
        }
    }
}
