//! # Money Formatting
//!
//! Display formatting for Indonesian Rupiah amounts: `Rp` prefix, `.` as the
//! thousands separator, `,` as the decimal separator, at most three
//! fractional digits with trailing zeros dropped.

use crate::primitives::CURRENCY_PREFIX;

/// Format `amount` for display, e.g. `15000.0` → `"Rp 15.000"`.
#[must_use]
pub fn format_rupiah(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("{} -", CURRENCY_PREFIX);
    }

    let fixed = format!("{:.3}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && (whole != "0" || !fraction.is_empty()) {
        "-"
    } else {
        ""
    };

    if fraction.is_empty() {
        format!("{} {}{}", CURRENCY_PREFIX, sign, grouped)
    } else {
        format!("{} {}{},{}", CURRENCY_PREFIX, sign, grouped, fraction)
    }
}
