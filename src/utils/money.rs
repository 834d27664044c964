use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Unit a gateway reports its amounts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountUnit {
    Cents,
    Reais,
}

/// Formats integer cents as Brazilian reais, e.g. `1299` -> `R$ 12,99`.
pub fn format_brl(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let digits = (abs / 100).to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{}R$ {},{:02}", sign, grouped, abs % 100)
}

/// Inverse of [`format_brl`]. Also accepts bare amounts such as `12,99` or `12.99`.
pub fn parse_brl(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let rest = rest.trim_start_matches("R$").trim();
    let cents = decimal_to_cents(parse_decimal_text(rest)?)?;
    Some(if negative { -cents } else { cents })
}

pub fn decimal_to_cents(value: Decimal) -> Option<i64> {
    (value * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Parses `1234.56`, `1234,56` and `1.234,56`.
pub fn parse_decimal_text(text: &str) -> Option<Decimal> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };
    Decimal::from_str(&normalized).ok()
}

/// Converts a JSON amount (number or numeric string) into integer cents.
pub fn amount_to_cents(value: &JsonValue, unit: AmountUnit) -> Option<i64> {
    let decimal = match value {
        JsonValue::Number(n) => {
            if let Some(int) = n.as_i64() {
                Decimal::from(int)
            } else {
                Decimal::from_str(&n.to_string()).ok()?
            }
        }
        JsonValue::String(s) => parse_decimal_text(s.trim_start_matches("R$"))?,
        _ => return None,
    };

    match unit {
        AmountUnit::Cents => decimal
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64(),
        AmountUnit::Reais => decimal_to_cents(decimal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn formats_cents_as_brl() {
        assert_eq!(format_brl(1299), "R$ 12,99");
        assert_eq!(format_brl(0), "R$ 0,00");
        assert_eq!(format_brl(5), "R$ 0,05");
        assert_eq!(format_brl(100_000), "R$ 1.000,00");
        assert_eq!(format_brl(123_456_789), "R$ 1.234.567,89");
        assert_eq!(format_brl(-550), "-R$ 5,50");
    }

    #[test]
    fn exact_cent_values_round_trip_through_display() {
        for cents in (0..250_000).step_by(37).chain([-1299, i64::from(i32::MAX)]) {
            assert_eq!(parse_brl(&format_brl(cents)), Some(cents), "cents = {}", cents);
        }
    }

    #[test]
    fn converts_reais_amounts_exactly() {
        assert_eq!(amount_to_cents(&json!(12.99), AmountUnit::Reais), Some(1299));
        assert_eq!(amount_to_cents(&json!(97), AmountUnit::Reais), Some(9700));
        assert_eq!(amount_to_cents(&json!("97,00"), AmountUnit::Reais), Some(9700));
        assert_eq!(amount_to_cents(&json!("1.234,56"), AmountUnit::Reais), Some(123_456));
        assert_eq!(amount_to_cents(&json!("R$ 19.90"), AmountUnit::Reais), Some(1990));
        assert_eq!(amount_to_cents(&json!(0.1), AmountUnit::Reais), Some(10));
    }

    #[test]
    fn keeps_cent_amounts_as_is() {
        assert_eq!(amount_to_cents(&json!(9700), AmountUnit::Cents), Some(9700));
        assert_eq!(amount_to_cents(&json!("4990"), AmountUnit::Cents), Some(4990));
    }

    #[test]
    fn rejects_non_numeric_amounts() {
        assert_eq!(amount_to_cents(&json!(null), AmountUnit::Cents), None);
        assert_eq!(amount_to_cents(&json!("abc"), AmountUnit::Reais), None);
        assert_eq!(amount_to_cents(&json!({"value": 1}), AmountUnit::Reais), None);
        assert_eq!(parse_brl(""), None);
    }
}
