//! Display helpers for integer-cent amounts.
//!
//! Amounts are stored and computed as `i64` cents everywhere. This module
//! only turns them into text for reports, using the Argentine convention
//! of `.` for thousands and `,` for decimals.

/// Format cents as `ARS 1.234.567,89`.
pub fn format_cents(cents: i64, currency: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let whole = abs / 100;
    let fraction = abs % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{sign}{currency} {grouped},{fraction:02}")
}

/// Percentage from basis points: 1250 → "12,50%".
pub fn format_bps(bps: u32) -> String {
    format!("{},{:02}%", bps / 100, bps % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(0, "ARS"), "ARS 0,00");
        assert_eq!(format_cents(5, "ARS"), "ARS 0,05");
        assert_eq!(format_cents(123_456_789, "ARS"), "ARS 1.234.567,89");
        assert_eq!(format_cents(100_000, "USD"), "USD 1.000,00");
        assert_eq!(format_cents(-99_950, "ARS"), "-ARS 999,50");
    }

    #[test]
    fn test_format_bps() {
        assert_eq!(format_bps(1_250), "12,50%");
        assert_eq!(format_bps(5), "0,05%");
    }
}
