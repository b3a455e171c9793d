//! Two pairs entering on the same bar would, uncapped, commit more gross
//! notional than `gross_leverage_max x equity` allows. Both intents must be
//! shrunk together, proportionally, rather than one winning at the other's
//! expense or the cap being silently ignored.

mod common;

use std::collections::HashMap;

use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};
use common::bar_with_spread;
use statarb_core::config::{EngineConfig, VixMultipliers, VixThresholds};
use statarb_core::types::Pair;
use statarb_engine::Engine;

const LONG_A: &str = "LONGA";
const SHORT_A: &str = "SHORTA";
const LONG_B: &str = "LONGB";
const SHORT_B: &str = "SHORTB";

fn two_pair_config() -> EngineConfig {
    EngineConfig {
        pairs: vec![Pair::new(LONG_A, SHORT_A, "PAIR_A"), Pair::new(LONG_B, SHORT_B, "PAIR_B")],
        lookback_period: 3,
        z_entry: 1.0,
        z_exit: 0.3,
        z_stop: 1.3,
        max_holding_days: 5,
        // 0.6 allocation per pair x 2 pairs wants 1.2x equity gross,
        // comfortably over the 1.0x cap below.
        allocation_per_pair: 0.6,
        enable_adf_filter: false,
        adf_pmax: 0.5,
        enable_half_life_filter: false,
        half_life_max_days: 100.0,
        enable_spread_filter: false,
        z_spread_critical: 5.0,
        vix_thresholds: VixThresholds {
            warning: 20.0,
            high: 30.0,
            crisis: 40.0,
        },
        vix_multipliers: VixMultipliers::default(),
        gross_leverage_max: 1.0,
    }
}

#[test]
fn simultaneous_entries_share_the_gross_leverage_budget() {
    common::init_tracing();
    let mut engine = Engine::initialize(two_pair_config()).expect("valid config");
    let mut host = common::FakeHost::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 100_000.0);

    let spreads = [0.0, 0.0, 0.1];
    for (day, spread) in spreads.iter().enumerate() {
        if day > 0 {
            host.advance(1);
        }
        let (long_a, short_a) = bar_with_spread(host.now, *spread);
        let (long_b, short_b) = bar_with_spread(host.now, *spread);
        let mut bars = HashMap::new();
        bars.insert(LONG_A.to_string(), long_a);
        bars.insert(SHORT_A.to_string(), short_a);
        bars.insert(LONG_B.to_string(), long_b);
        bars.insert(SHORT_B.to_string(), short_b);
        engine.on_bar(&mut host, &bars, 10.0).expect("on_bar succeeds");
    }

    assert_eq!(host.placed.len(), 4, "both pairs entered on the same bar");

    // Uncapped each pair would want 100_000 * 0.6 = 60_000 per leg; with two
    // pairs entering at once the shared cap (100_000 * 1.0) only has room
    // for 25_000 per leg once split proportionally between them.
    let short_leg_a = host.placed.iter().find(|o| o.symbol == SHORT_A).unwrap();
    let short_leg_b = host.placed.iter().find(|o| o.symbol == SHORT_B).unwrap();
    assert_relative_eq!(short_leg_a.signed_quantity, 25_000.0, max_relative = 1e-9);
    assert_relative_eq!(short_leg_b.signed_quantity, 25_000.0, max_relative = 1e-9);

    // Dollar notional per leg: short legs trade at close=1.0 so quantity is
    // notional directly; long legs trade at close=exp(0.1), so quantity *
    // close recovers notional. Total gross across both pairs must land
    // exactly on the cap (100_000 * 1.0), not merely under it.
    let long_notional: f64 = host
        .placed
        .iter()
        .filter(|o| o.symbol == LONG_A || o.symbol == LONG_B)
        .map(|o| o.signed_quantity.abs() * 0.1_f64.exp())
        .sum();
    let short_notional = short_leg_a.signed_quantity.abs() + short_leg_b.signed_quantity.abs();
    assert_relative_eq!(long_notional + short_notional, 100_000.0, max_relative = 1e-6);
}
