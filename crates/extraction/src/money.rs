//! Brazilian-real amounts: parsing from OCR text, formatting for display.
//!
//! Amounts are handled as integer centavos. OCR output mixes formats
//! (`"150,00"`, `"1.234,56"`, `"R$ 99"`, plain JSON numbers), so parsing
//! is lenient; formatting always produces `R$ 1.234,56`.

use serde_json::Value;

/// Parse a Brazilian-formatted amount into centavos.
///
/// Accepts an optional `R$` prefix, `.` thousands separators and a `,`
/// decimal separator; a lone `.` followed by one or two digits is also
/// treated as a decimal separator to tolerate anglicized OCR output.
/// Returns `None` when no digits survive cleaning.
pub fn parse_brl(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let negative = cleaned.starts_with('-');
    let cleaned = cleaned.trim_start_matches('-');

    // Split off the decimal part, if any.
    let (integer_part, decimal_part) = match cleaned.rfind(',') {
        Some(pos) => (&cleaned[..pos], &cleaned[pos + 1..]),
        None => match cleaned.rfind('.') {
            // "1.234" is a thousands separator, "12.5" / "12.50" a decimal.
            Some(pos) if cleaned.len() - pos - 1 < 3 => {
                (&cleaned[..pos], &cleaned[pos + 1..])
            }
            _ => (cleaned, ""),
        },
    };

    let integer_digits: String = integer_part
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    let decimal_digits: String = decimal_part
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    if integer_digits.is_empty() && decimal_digits.is_empty() {
        return None;
    }

    let reais: i64 = if integer_digits.is_empty() {
        0
    } else {
        integer_digits.parse().ok()?
    };

    let centavos: i64 = match decimal_digits.len() {
        0 => 0,
        1 => decimal_digits.parse::<i64>().ok()? * 10,
        2 => decimal_digits.parse().ok()?,
        // More than two decimals: keep the first two.
        _ => decimal_digits[..2].parse().ok()?,
    };

    let total = reais.checked_mul(100)?.checked_add(centavos)?;
    Some(if negative { -total } else { total })
}

/// Parse an amount from a JSON value: numbers directly, strings via
/// [`parse_brl`].
pub fn parse_brl_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.checked_mul(100)
            } else {
                n.as_f64().map(|f| (f * 100.0).round() as i64)
            }
        }
        Value::String(s) => parse_brl(s),
        _ => None,
    }
}

/// Format centavos as `R$ 1.234,56`.
pub fn format_brl(centavos: i64) -> String {
    let negative = centavos < 0;
    let centavos = centavos.unsigned_abs();
    let reais = centavos / 100;
    let cents = centavos % 100;

    // Group the integer part with '.' every three digits.
    let digits = reais.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if negative {
        format!("-R$ {},{:02}", grouped, cents)
    } else {
        format!("R$ {},{:02}", grouped, cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_decimal() {
        assert_eq!(parse_brl("150,00"), Some(15_000));
        assert_eq!(parse_brl("150,5"), Some(15_050));
        assert_eq!(parse_brl("99"), Some(9_900));
    }

    #[test]
    fn test_parse_with_thousands_and_prefix() {
        assert_eq!(parse_brl("1.234,56"), Some(123_456));
        assert_eq!(parse_brl("R$ 1.234,56"), Some(123_456));
        assert_eq!(parse_brl("R$1.000"), Some(100_000));
    }

    #[test]
    fn test_parse_anglicized() {
        assert_eq!(parse_brl("150.00"), Some(15_000));
        assert_eq!(parse_brl("12.5"), Some(1_250));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_brl(""), None);
        assert_eq!(parse_brl("não informado"), None);
        assert_eq!(parse_brl("R$"), None);
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!(parse_brl("-10,00"), Some(-1_000));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_brl_value(&json!("150,00")), Some(15_000));
        assert_eq!(parse_brl_value(&json!(150)), Some(15_000));
        assert_eq!(parse_brl_value(&json!(150.5)), Some(15_050));
        assert_eq!(parse_brl_value(&json!(null)), None);
        assert_eq!(parse_brl_value(&json!(["150"])), None);
    }

    #[test]
    fn test_format() {
        assert_eq!(format_brl(15_000), "R$ 150,00");
        assert_eq!(format_brl(123_456), "R$ 1.234,56");
        assert_eq!(format_brl(100_000_000), "R$ 1.000.000,00");
        assert_eq!(format_brl(5), "R$ 0,05");
        assert_eq!(format_brl(-1_000), "-R$ 10,00");
    }

    #[test]
    fn test_round_trip_display() {
        // The property the review screen relies on.
        assert_eq!(format_brl(parse_brl("150,00").unwrap()), "R$ 150,00");
    }
}
