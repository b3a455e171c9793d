//! A VIX spike that persists for two consecutive bars commits the regime
//! into Crisis and force-liquidates every open pair on the transition bar,
//! overriding whatever the spread is doing.

mod common;

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use common::{bar_with_spread, base_config, LONG_SYMBOL, PAIR_NAME, SHORT_SYMBOL};
use statarb_engine::Engine;

#[test]
fn crisis_liquidation_overrides_an_open_position() {
    common::init_tracing();
    let mut engine = Engine::initialize(base_config()).expect("valid config");
    let mut host = common::FakeHost::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 100_000.0);

    // day0-2 open a short at z=1.1547 under a calm VIX. day3 is a single
    // crisis-level VIX print (debounced, no effect). day4 is the second
    // consecutive crisis print: the regime commits to Crisis and the
    // one-shot liquidation signal fires.
    let spreads = [0.0, 0.0, 0.1, 0.1, 0.1];
    let vix = [10.0, 10.0, 10.0, 45.0, 45.0];
    for (day, (spread, v)) in spreads.iter().zip(vix.iter()).enumerate() {
        if day > 0 {
            host.advance(1);
        }
        let (long_bar, short_bar) = bar_with_spread(host.now, *spread);
        let mut bars = HashMap::new();
        bars.insert(LONG_SYMBOL.to_string(), long_bar);
        bars.insert(SHORT_SYMBOL.to_string(), short_bar);
        engine.on_bar(&mut host, &bars, *v).expect("on_bar succeeds");
    }

    assert_eq!(host.placed.len(), 2, "position opened on day2");
    assert_eq!(host.liquidations.len(), 2, "position force-liquidated on day4");
    assert_eq!(host.liquidations[0].tag, format!("EXIT|VIX_CRISIS|VIX=45.0|{PAIR_NAME}"));
    assert_eq!(host.liquidations[1].tag, host.liquidations[0].tag);
}
