// src/format.rs
use rust_decimal::prelude::FromStr;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

/// Fraction digit range used when rendering a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FractionDigits {
    pub min: u32,
    pub max: u32,
}

impl FractionDigits {
    pub const fn fixed(digits: u32) -> Self {
        Self {
            min: digits,
            max: digits,
        }
    }
}

impl Default for FractionDigits {
    fn default() -> Self {
        Self::fixed(4)
    }
}

pub const BALANCE_DIGITS: FractionDigits = FractionDigits::fixed(6);
pub const BURN_AMOUNT_DIGITS: FractionDigits = FractionDigits::fixed(2);
pub const WHOLE_TOKENS: FractionDigits = FractionDigits::fixed(0);
const USD_DIGITS: FractionDigits = FractionDigits::fixed(2);

/// Loose numeric coercion for snapshot fields: missing/null/false become 0,
/// numeric strings are parsed, anything else is NaN.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

/// Formats `value` with `,` grouping and `.` decimals (en-US), rounding half
/// away from zero to `digits.max` and padding to `digits.min`.
pub fn format_number(value: f64, digits: FractionDigits) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-∞" } else { "∞" }.to_string();
    }

    let max = digits.max.max(digits.min);
    // Round the shortest round-trip text, so 1.005 is a midpoint and not 1.00499...
    let shortest = value.to_string();
    let fixed = match Decimal::from_str(&shortest) {
        Ok(d) => d
            .round_dp_with_strategy(max, RoundingStrategy::MidpointAwayFromZero)
            .to_string(),
        // Beyond Decimal's range an f64 has no fractional part left to round.
        Err(_) => shortest,
    };

    let (negative, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, fixed.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let mut frac: String = frac_part.chars().take(max as usize).collect();
    while frac.len() < max as usize {
        frac.push('0');
    }
    while frac.len() > digits.min as usize && frac.ends_with('0') {
        frac.pop();
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac.chars().all(|c| c == '0');

    let mut out = String::with_capacity(unsigned.len() + unsigned.len() / 3 + 2);
    if negative && !is_zero {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac.is_empty() {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

/// Dollar amount with exactly two fraction digits.
pub fn format_usd(value: f64) -> String {
    format!("${}", format_number(value, USD_DIGITS))
}

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
