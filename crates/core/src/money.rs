//! Currency formatting for alert tables.

/// Format an amount as dollars with thousands separators and two decimals.
///
/// `20000.0` renders as `$20,000.00`. Negative amounts keep the sign after
/// the symbol (`$-1,234.50`).
pub fn format_usd(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("${}", amount);
    }

    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };

    format!("${}{}.{}", sign, group_thousands(whole), cents)
}

/// Insert `,` between every group of three digits.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
