//! Number and flag formatting for alert cards.

/// Glyph for a safe condition.
pub const YES: &str = "✅";
/// Glyph for an unsafe condition.
pub const NO: &str = "❌";
/// Glyph for an unknown condition.
pub const UNKNOWN: &str = "—";

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Insert `,` every three digits of an unsigned integer string.
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

/// Group the integer part of a non-negative decimal string.
fn group_decimal(formatted: &str) -> String {
    match formatted.split_once('.') {
        Some((int, frac)) => format!("{}.{}", group_thousands(int), frac),
        None => group_thousands(formatted),
    }
}

/// Compact USD amount: `$1.23B`, `$4.56M`, `$7.89K`, `$123.45`.
pub fn format_usd(value: Option<f64>) -> String {
    let Some(n) = finite(value) else {
        return "-".to_string();
    };
    let sign = if n < 0.0 { "-" } else { "" };
    let n = n.abs();

    if n >= 1_000_000_000.0 {
        format!("{}${:.2}B", sign, n / 1_000_000_000.0)
    } else if n >= 1_000_000.0 {
        format!("{}${:.2}M", sign, n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{}${:.2}K", sign, n / 1_000.0)
    } else {
        format!("{}${}", sign, group_decimal(&format!("{:.2}", n)))
    }
}

/// Token price with sub-milli prices compressed as `$0.0{N}DDDDDD`,
/// where `N` counts the zeros after the decimal point.
pub fn format_price(value: Option<f64>) -> String {
    let Some(p) = finite(value) else {
        return "-".to_string();
    };
    if p == 0.0 {
        return "$0.00".to_string();
    }
    let sign = if p < 0.0 { "-" } else { "" };
    let p = p.abs();

    if p >= 0.001 {
        let fixed = format!("{:.6}", p);
        let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
        let mut frac = frac.trim_end_matches('0').to_string();
        while frac.len() < 2 {
            frac.push('0');
        }
        return format!("{}${}.{}", sign, group_thousands(int), frac);
    }

    // Six significant digits in scientific form: "1.23400e-4".
    let sci = format!("{:.5e}", p);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return "$0.00".to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return "$0.00".to_string();
    };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let zeros = (-exponent - 1).max(0);
    format!("{}$0.0{{{}}}{}", sign, zeros, digits)
}

/// Tri-state security glyph.
pub fn yn(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => YES,
        Some(false) => NO,
        None => UNKNOWN,
    }
}

/// Signed percentage with two decimals: `+7.20%`.
pub fn format_change(change: f64) -> String {
    format!("{:+.2}%", change)
}

/// `|`-joined holder percentages, or a `- | - | ...` placeholder.
pub fn format_holder_shares(shares: Option<&[f64]>, placeholder_len: usize) -> String {
    match shares {
        Some(shares) if !shares.is_empty() => shares
            .iter()
            .map(|s| format!("{:.2}%", s))
            .collect::<Vec<_>>()
            .join(" | "),
        _ => vec!["-"; placeholder_len.max(1)].join(" | "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_usd_suffixes() {
        assert_eq!(format_usd(Some(1_234_567_890.0)), "$1.23B");
        assert_eq!(format_usd(Some(1_234_567.0)), "$1.23M");
        assert_eq!(format_usd(Some(1_500.0)), "$1.50K");
        assert_eq!(format_usd(Some(999.5)), "$999.50");
        assert_eq!(format_usd(Some(999.0)), "$999.00");
        assert_eq!(format_usd(Some(-500.0)), "-$500.00");
        assert_eq!(format_usd(Some(0.0)), "$0.00");
        assert_eq!(format_usd(Some(-2_500_000.0)), "-$2.50M");
    }

    #[test]
    fn test_format_usd_missing() {
        assert_eq!(format_usd(None), "-");
        assert_eq!(format_usd(Some(f64::NAN)), "-");
        assert_eq!(format_usd(Some(f64::INFINITY)), "-");
    }

    #[test]
    fn test_format_usd_rounds_into_grouping() {
        assert_eq!(format_usd(Some(999.999)), "$1,000.00");
    }

    #[test]
    fn test_format_price_regular() {
        assert_eq!(format_price(Some(1.5)), "$1.50");
        assert_eq!(format_price(Some(1234.5678)), "$1,234.5678");
        assert_eq!(format_price(Some(0.00123)), "$0.00123");
        assert_eq!(format_price(Some(0.001)), "$0.001");
        assert_eq!(format_price(Some(150.0)), "$150.00");
        assert_eq!(format_price(Some(0.0)), "$0.00");
    }

    #[test]
    fn test_format_price_compressed_zeros() {
        assert_eq!(format_price(Some(0.0001234)), "$0.0{3}123400");
        assert_eq!(format_price(Some(0.00000123456789)), "$0.0{5}123457");
        assert_eq!(format_price(Some(0.0009)), "$0.0{3}900000");
    }

    #[test]
    fn test_format_price_missing() {
        assert_eq!(format_price(None), "-");
        assert_eq!(format_price(Some(f64::NAN)), "-");
    }

    #[test]
    fn test_yn_tri_state() {
        assert_eq!(yn(Some(true)), "✅");
        assert_eq!(yn(Some(false)), "❌");
        assert_eq!(yn(None), "—");
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(7.2), "+7.20%");
        assert_eq!(format_change(-0.456), "-0.46%");
        assert_eq!(format_change(0.0), "+0.00%");
    }

    #[test]
    fn test_holder_shares() {
        assert_eq!(
            format_holder_shares(Some(&[12.346, 5.0]), 10),
            "12.35% | 5.00%"
        );
        assert_eq!(
            format_holder_shares(None, 10),
            "- | - | - | - | - | - | - | - | - | -"
        );
        assert_eq!(format_holder_shares(Some(&[]), 3), "- | - | -");
    }
}
