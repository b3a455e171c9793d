use statarb_core::types::ExitReason;

/// Which leg of the pair an entry order fills — part of the entry tag, not
/// carried anywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Long,
    Short,
}

impl Leg {
    fn as_tag_str(&self) -> &'static str {
        match self {
            Leg::Long => "LONG_LEG",
            Leg::Short => "SHORT_LEG",
        }
    }
}

fn half_life_segment(half_life_days: Option<f64>) -> String {
    match half_life_days {
        Some(hl) => format!("|HL={:.1}", hl),
        None => String::new(),
    }
}

/// Builds `ENTRY|<pair_name>|Z=<z:.2f>[|HL=<hl:.1f>]|VIX=<size_pct:d>%|<LEG>` (§6).
pub fn entry_tag(pair_name: &str, z: f64, half_life_days: Option<f64>, size_multiplier: f64, leg: Leg) -> String {
    let size_pct = (size_multiplier * 100.0).round() as i64;
    format!(
        "ENTRY|{pair_name}|Z={z:.2}{hl}|VIX={size_pct}%|{leg}",
        pair_name = pair_name,
        z = z,
        hl = half_life_segment(half_life_days),
        size_pct = size_pct,
        leg = leg.as_tag_str(),
    )
}

/// Builds `EXIT|<pair_name>|<REASON>|Z=<z:.2f>[|HL=<hl:.1f>]|DAYS=<days:d>`, or
/// the special-cased `EXIT|VIX_CRISIS|VIX=<vix:.1f>|<pair_name>` when the exit
/// reason is a regime-forced crisis liquidation (§6).
pub fn exit_tag(
    pair_name: &str,
    reason: ExitReason,
    z: f64,
    half_life_days: Option<f64>,
    holding_days: i64,
    current_vix: f64,
) -> String {
    if reason == ExitReason::VixCrisis {
        return format!("EXIT|VIX_CRISIS|VIX={current_vix:.1}|{pair_name}");
    }
    format!(
        "EXIT|{pair_name}|{reason}|Z={z:.2}{hl}|DAYS={days}",
        pair_name = pair_name,
        reason = reason.as_tag_str(),
        z = z,
        hl = half_life_segment(half_life_days),
        days = holding_days,
    )
}
