//! Formatting helpers shared by report renderers.

use rust_decimal::{Decimal, RoundingStrategy};

/// Format a USD amount with four decimal places (e.g., "$0.0149").
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
    format!("${:.4}", rounded)
}

/// Format a millisecond duration for display (e.g., "850 ms", "11.78 s").
pub fn format_duration_ms(ms: Decimal) -> String {
    if ms.abs() < Decimal::ONE_THOUSAND {
        format!("{} ms", ms.round_dp(0))
    } else {
        let secs = (ms / Decimal::ONE_THOUSAND)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.2} s", secs)
    }
}

/// Format a percentage with two decimal places (e.g., "99.50%").
pub fn format_percent(value: Decimal) -> String {
    format!("{:.2}%", value.round_dp(2))
}

/// Format a large count compactly (e.g., "14.2K", "3.1M").
pub fn format_count(count: usize) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}
