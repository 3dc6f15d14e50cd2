//! Monetary amounts.
//!
//! Amounts are carried as `i64` in the smallest unit (cents). Arithmetic on
//! cents is exact; formatting to a decimal string happens only at the edges
//! (email templates, API responses).

/// Format an amount in cents as a decimal string, e.g. `3500` → `"35.00"`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
