//! Scalar interpretation helpers for AST consumers.
//!
//! A scalar is simultaneously bool-like (`yes`/`true`/`no`/`false`),
//! number-like (integer or single-dot float, optional sign), and date-like
//! (`Y.M.D`). Quoted scalars are opaque unless interpretation is explicitly
//! opted in.

/// A `Y.M.D` date-like triple. No calendar validation is applied.
pub type DateLike = (i64, i64, i64);

/// Numeric reading of a scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Int(i64),
    Float(f64),
}

impl NumberValue {
    pub fn as_f64(self) -> f64 {
        match self {
            NumberValue::Int(value) => value as f64,
            NumberValue::Float(value) => value,
        }
    }

    pub fn is_int(self) -> bool {
        matches!(self, NumberValue::Int(_))
    }
}

/// All readings of one scalar text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarInterpretation {
    pub bool_value: Option<bool>,
    pub number_value: Option<NumberValue>,
    pub date_value: Option<DateLike>,
}

impl ScalarInterpretation {
    fn opaque() -> Self {
        Self {
            bool_value: None,
            number_value: None,
            date_value: None,
        }
    }
}

/// `yes`/`true` and `no`/`false`, case-insensitive.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}

/// Integer or single-dot float with optional sign.
pub fn parse_number(text: &str) -> Option<NumberValue> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.matches('.').count() > 1 {
        return None;
    }

    if is_integer_literal(trimmed) {
        // Game files carry integers beyond i64; keep them number-like by
        // falling back to a float reading.
        if let Ok(value) = trimmed.parse::<i64>() {
            return Some(NumberValue::Int(value));
        }
        return trimmed.parse::<f64>().ok().map(NumberValue::Float);
    }

    if is_float_literal(trimmed) {
        return trimmed.parse::<f64>().ok().map(NumberValue::Float);
    }

    None
}

/// `Y.M.D` triple with optional sign on the year.
pub fn parse_date_like(text: &str) -> Option<DateLike> {
    let trimmed = text.trim();
    let mut parts = trimmed.split('.');
    let year_part = parts.next()?;
    let month_part = parts.next()?;
    let day_part = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let year_digits = year_part
        .strip_prefix(['+', '-'])
        .unwrap_or(year_part);
    if year_digits.is_empty() || !all_digits(year_digits) {
        return None;
    }
    if month_part.is_empty() || !all_digits(month_part) {
        return None;
    }
    if day_part.is_empty() || !all_digits(day_part) {
        return None;
    }

    let year = year_part.parse::<i64>().ok()?;
    let month = month_part.parse::<i64>().ok()?;
    let day = day_part.parse::<i64>().ok()?;
    Some((year, month, day))
}

/// Interpret `text` in every supported reading.
///
/// Quoted scalars return an opaque interpretation unless `allow_quoted`.
pub fn interpret_scalar(text: &str, was_quoted: bool, allow_quoted: bool) -> ScalarInterpretation {
    if was_quoted && !allow_quoted {
        return ScalarInterpretation::opaque();
    }

    ScalarInterpretation {
        bool_value: parse_bool(text),
        number_value: parse_number(text),
        date_value: parse_date_like(text),
    }
}

fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && all_digits(digits)
}

fn is_float_literal(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let Some((int_part, frac_part)) = unsigned.split_once('.') else {
        return false;
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }
    // `\d+.\d+`, `\d+.`, or `.\d+`
    if int_part.is_empty() {
        return all_digits(frac_part);
    }
    if !all_digits(int_part) {
        return false;
    }
    frac_part.is_empty() || all_digits(frac_part)
}

fn all_digits(text: &str) -> bool {
    text.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_readings_are_case_insensitive() {
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("No"), Some(false));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn number_readings_accept_signs_and_single_dots() {
        assert_eq!(parse_number("1"), Some(NumberValue::Int(1)));
        assert_eq!(parse_number("-5"), Some(NumberValue::Int(-5)));
        assert_eq!(parse_number("+3"), Some(NumberValue::Int(3)));
        assert_eq!(parse_number("1.000"), Some(NumberValue::Float(1.0)));
        assert_eq!(parse_number("-0.5"), Some(NumberValue::Float(-0.5)));
        assert_eq!(parse_number(".25"), Some(NumberValue::Float(0.25)));
        assert_eq!(parse_number("1.2.3"), None);
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn oversized_integers_stay_number_like() {
        let value = parse_number("18446744073709547616");
        assert!(matches!(value, Some(NumberValue::Float(_))));
    }

    #[test]
    fn date_readings_require_three_components() {
        assert_eq!(parse_date_like("1821.1.1"), Some((1821, 1, 1)));
        assert_eq!(parse_date_like("1066.9.15"), Some((1066, 9, 15)));
        assert_eq!(parse_date_like("-100.1.1"), Some((-100, 1, 1)));
        assert_eq!(parse_date_like("1821.1"), None);
        assert_eq!(parse_date_like("1821.1.1.1"), None);
        assert_eq!(parse_date_like("a.b.c"), None);
    }

    #[test]
    fn quoted_scalars_are_opaque_by_default() {
        let opaque = interpret_scalar("10", true, false);
        assert_eq!(opaque.number_value, None);

        let opted_in = interpret_scalar("10", true, true);
        assert_eq!(opted_in.number_value, Some(NumberValue::Int(10)));
    }

    #[test]
    fn date_like_scalars_are_also_number_like_when_single_dotted() {
        let interpretation = interpret_scalar("1821.1", false, false);
        assert_eq!(interpretation.number_value, Some(NumberValue::Float(1821.1)));
        assert_eq!(interpretation.date_value, None);
    }
}
