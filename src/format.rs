//! Money and date formatting shared by every rendering path.
//!
//! Output follows en-US conventions: comma grouping, symbol prefix, minus
//! sign ahead of the symbol, always two decimals.

use chrono::{DateTime, NaiveDate, Utc};

/// Display prefix for a well-formed currency code.
fn currency_prefix(code: &str) -> String {
    let symbol = match code {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "CNY" => "CN¥",
        "INR" => "₹",
        "KRW" => "₩",
        "ILS" => "₪",
        "VND" => "₫",
        "PHP" => "₱",
        "NGN" => "₦",
        "CAD" => "CA$",
        "AUD" => "A$",
        "NZD" => "NZ$",
        "MXN" => "MX$",
        "HKD" => "HK$",
        "TWD" => "NT$",
        "BRL" => "R$",
        // Codes without a dedicated symbol print as "CHF 1,234.00".
        other => return format!("{other}\u{a0}"),
    };
    symbol.to_string()
}

fn group_thousands(whole: u128) -> String {
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format `amount` in `currency` (ISO 4217).
///
/// A code that is not three ASCII letters cannot be formatted; the result
/// then degrades to `$` plus the amount with two fixed decimals.
pub fn format_currency(amount: f64, currency: &str) -> String {
    let code = currency.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) || !amount.is_finite() {
        log::debug!("Falling back to plain dollar format for currency {currency:?}");
        let amount = if amount.is_finite() { amount } else { 0.0 };
        return format!("${amount:.2}");
    }
    let code = code.to_ascii_uppercase();

    let cents = (amount.abs() * 100.0).round() as u128;
    let whole = cents / 100;
    let frac = cents % 100;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };

    format!(
        "{sign}{}{}.{frac:02}",
        currency_prefix(&code),
        group_thousands(whole)
    )
}

/// Quantity or rate as typed by the user, trimmed of pointless zeros.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let s = format!("{value:.4}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Render an ISO date (`YYYY-MM-DD`, or a full RFC 3339 timestamp) as
/// `Jan 5, 2025`. Anything unparseable is returned unchanged.
pub fn format_date(iso: &str) -> String {
    let raw = iso.trim();
    if raw.is_empty() {
        return String::new();
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()));
    match date {
        Some(d) => d.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%b %-d, %Y %-I:%M %p UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn dollars() {
        assert_eq!(format_currency(100.0, "USD"), "$100.00");
        assert_eq!(format_currency(1234567.891, "USD"), "$1,234,567.89");
        assert_eq!(format_currency(-20.0, "usd"), "-$20.00");
        assert_eq!(format_currency(-0.001, "USD"), "$0.00");
    }

    #[test]
    fn other_codes() {
        assert_eq!(format_currency(1500.5, "EUR"), "€1,500.50");
        assert_eq!(format_currency(10.0, "CHF"), "CHF\u{a0}10.00");
        assert_eq!(format_currency(10.0, "JPY"), "¥10.00");
    }

    #[test]
    fn invalid_code_falls_back() {
        assert_eq!(format_currency(12.5, ""), "$12.50");
        assert_eq!(format_currency(12.5, "DOLLARS"), "$12.50");
        assert_eq!(format_currency(-3.0, "U$"), "$-3.00");
    }

    #[test]
    fn numbers() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(0.125), "0.125");
    }

    #[test]
    fn dates() {
        assert_eq!(format_date("2025-01-05"), "Jan 5, 2025");
        assert_eq!(format_date("2025-03-10T12:00:00Z"), "Mar 10, 2025");
        assert_eq!(format_date("next week"), "next week");
        assert_eq!(format_date(""), "");
    }

    #[test]
    fn timestamps() {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 15, 4, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "Jun 1, 2025 3:04 PM UTC");
    }
}
