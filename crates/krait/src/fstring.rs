//! Format-spec mini-language used by f-strings and `str.format`.
//!
//! Spec shape: `[[fill]align][sign][#][0][width][,|_][.precision][type]`
//! with `type ∈ {b,c,d,e,E,f,F,g,G,n,o,s,x,X,%}`. Parsing is strict; a
//! malformed spec or a type/value mismatch surfaces as `ValueError` or
//! `TypeError` at the evaluation site.

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

use crate::{
    exception_private::{ExcType, RunError, RunResult},
    value::float_repr,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedFormatSpec {
    pub fill: char,
    /// `<` left, `>` right, `^` center, `=` pad-after-sign (numeric only).
    pub align: Option<char>,
    /// `+`, `-`, or space.
    pub sign: Option<char>,
    /// `#`: alternate form (`0x` prefixes and friends).
    pub alternate: bool,
    pub width: Option<usize>,
    /// `,` or `_` digit grouping.
    pub grouping: Option<char>,
    pub precision: Option<usize>,
    pub spec_type: Option<char>,
}

impl Default for ParsedFormatSpec {
    fn default() -> Self {
        Self {
            fill: ' ',
            align: None,
            sign: None,
            alternate: false,
            width: None,
            grouping: None,
            precision: None,
            spec_type: None,
        }
    }
}

/// Parses a format spec string.
pub(crate) fn parse_format_spec(spec: &str) -> RunResult<ParsedFormatSpec> {
    let chars: Vec<char> = spec.chars().collect();
    let mut out = ParsedFormatSpec::default();
    let mut i = 0;

    // [[fill]align]
    if chars.len() >= 2 && matches!(chars[1], '<' | '>' | '^' | '=') {
        out.fill = chars[0];
        out.align = Some(chars[1]);
        i = 2;
    } else if !chars.is_empty() && matches!(chars[0], '<' | '>' | '^' | '=') {
        out.align = Some(chars[0]);
        i = 1;
    }

    if i < chars.len() && matches!(chars[i], '+' | '-' | ' ') {
        out.sign = Some(chars[i]);
        i += 1;
    }
    if i < chars.len() && chars[i] == '#' {
        out.alternate = true;
        i += 1;
    }
    if i < chars.len() && chars[i] == '0' {
        // Zero flag: numeric fill with sign-aware alignment.
        if out.align.is_none() {
            out.fill = '0';
            out.align = Some('=');
        }
        i += 1;
    }
    let mut width = String::new();
    while i < chars.len() && chars[i].is_ascii_digit() {
        width.push(chars[i]);
        i += 1;
    }
    if !width.is_empty() {
        out.width = Some(
            width
                .parse()
                .map_err(|_| format_error(spec, "width too large"))?,
        );
    }
    if i < chars.len() && matches!(chars[i], ',' | '_') {
        out.grouping = Some(chars[i]);
        i += 1;
    }
    if i < chars.len() && chars[i] == '.' {
        i += 1;
        let mut precision = String::new();
        while i < chars.len() && chars[i].is_ascii_digit() {
            precision.push(chars[i]);
            i += 1;
        }
        if precision.is_empty() {
            return Err(format_error(spec, "expected precision digits after '.'"));
        }
        out.precision = Some(
            precision
                .parse()
                .map_err(|_| format_error(spec, "precision too large"))?,
        );
    }
    if i < chars.len() {
        let t = chars[i];
        if !matches!(t, 'b' | 'c' | 'd' | 'e' | 'E' | 'f' | 'F' | 'g' | 'G' | 'n' | 'o' | 's' | 'x' | 'X' | '%') {
            return Err(format_error(spec, &format!("unknown format code '{t}'")));
        }
        out.spec_type = Some(t);
        i += 1;
    }
    if i != chars.len() {
        return Err(format_error(spec, "unexpected trailing characters"));
    }
    Ok(out)
}

fn format_error(spec: &str, why: &str) -> RunError {
    ExcType::value_error(format!("invalid format spec '{spec}': {why}"))
}

/// Formats an integer.
pub(crate) fn format_int(value: &BigInt, spec: &ParsedFormatSpec) -> RunResult<String> {
    match spec.spec_type {
        None | Some('d' | 'n') => {
            let digits = value.abs().to_string();
            let digits = apply_grouping(&digits, spec.grouping, 3);
            Ok(pad_numeric(&digits, value.is_negative(), spec, ""))
        }
        Some('b') => {
            let digits = value.abs().to_str_radix(2);
            let prefix = if spec.alternate { "0b" } else { "" };
            Ok(pad_numeric(&apply_grouping(&digits, underscore_only(spec), 4), value.is_negative(), spec, prefix))
        }
        Some('o') => {
            let digits = value.abs().to_str_radix(8);
            let prefix = if spec.alternate { "0o" } else { "" };
            Ok(pad_numeric(&apply_grouping(&digits, underscore_only(spec), 4), value.is_negative(), spec, prefix))
        }
        Some('x') => {
            let digits = value.abs().to_str_radix(16);
            let prefix = if spec.alternate { "0x" } else { "" };
            Ok(pad_numeric(&apply_grouping(&digits, underscore_only(spec), 4), value.is_negative(), spec, prefix))
        }
        Some('X') => {
            let digits = value.abs().to_str_radix(16).to_uppercase();
            let prefix = if spec.alternate { "0X" } else { "" };
            Ok(pad_numeric(&apply_grouping(&digits, underscore_only(spec), 4), value.is_negative(), spec, prefix))
        }
        Some('c') => {
            let code = value
                .to_u32()
                .and_then(char::from_u32)
                .ok_or_else(|| ExcType::value_error("%c arg not in range(0x110000)"))?;
            Ok(pad_text(&code.to_string(), spec))
        }
        Some('e' | 'E' | 'f' | 'F' | 'g' | 'G' | '%') => {
            let as_float = value
                .to_f64()
                .ok_or_else(|| ExcType::value_error("int too large to convert to float"))?;
            format_float(as_float, spec)
        }
        Some('s') => Err(ExcType::value_error("Unknown format code 's' for object of type 'int'")),
        Some(other) => Err(ExcType::value_error(format!(
            "Unknown format code '{other}' for object of type 'int'"
        ))),
    }
}

/// Formats a float.
pub(crate) fn format_float(value: f64, spec: &ParsedFormatSpec) -> RunResult<String> {
    if value.is_nan() || value.is_infinite() {
        let body = float_repr(value.abs());
        return Ok(pad_numeric(&body, value.is_sign_negative() && !value.is_nan(), spec, ""));
    }
    let body = match spec.spec_type {
        None => {
            let repr = float_repr(value.abs());
            match spec.precision {
                Some(p) => fixed_digits(value.abs(), p),
                None => repr,
            }
        }
        Some('f' | 'F') => {
            let text = fixed_digits(value.abs(), spec.precision.unwrap_or(6));
            apply_float_grouping(&text, spec.grouping)
        }
        Some('e' | 'E') => {
            let text = scientific(value.abs(), spec.precision.unwrap_or(6));
            if spec.spec_type == Some('E') {
                text.to_uppercase()
            } else {
                text
            }
        }
        Some('g' | 'G') => {
            let text = general(value.abs(), spec.precision.unwrap_or(6).max(1));
            if spec.spec_type == Some('G') {
                text.to_uppercase()
            } else {
                text
            }
        }
        Some('n') => fixed_digits(value.abs(), spec.precision.unwrap_or(6)),
        Some('%') => {
            let text = fixed_digits(value.abs() * 100.0, spec.precision.unwrap_or(6));
            format!("{text}%")
        }
        Some(other) => {
            return Err(ExcType::value_error(format!(
                "Unknown format code '{other}' for object of type 'float'"
            )));
        }
    };
    Ok(pad_numeric(&body, value.is_sign_negative() && !value.is_nan(), spec, ""))
}

/// Formats a string value (`s` or no type code).
pub(crate) fn format_str(value: &str, spec: &ParsedFormatSpec) -> RunResult<String> {
    match spec.spec_type {
        None | Some('s') => {
            let truncated: String = match spec.precision {
                Some(p) => value.chars().take(p).collect(),
                None => value.to_string(),
            };
            Ok(pad_text(&truncated, spec))
        }
        Some(other) => Err(ExcType::value_error(format!(
            "Unknown format code '{other}' for object of type 'str'"
        ))),
    }
}

/// `value` rendered with exactly `precision` fractional digits.
fn fixed_digits(value: f64, precision: usize) -> String {
    format!("{value:.precision$}")
}

/// Scientific notation with a two-digit, signed exponent.
fn scientific(value: f64, precision: usize) -> String {
    let raw = format!("{value:.precision$e}");
    // Rust prints "1.5e2"/"1.5e-7"; Python wants "1.5e+02"/"1.5e-07".
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(rest) => ('-', rest),
                None => ('+', exponent),
            };
            if digits.len() < 2 {
                format!("{mantissa}e{sign}0{digits}")
            } else {
                format!("{mantissa}e{sign}{digits}")
            }
        }
        None => raw,
    }
}

/// `g`-style general formatting with `precision` significant digits.
fn general(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let exponent = value.abs().log10().floor() as i64;
    if exponent < -4 || exponent >= precision as i64 {
        let sci = scientific(value, precision - 1);
        // Strip trailing zeros in the mantissa.
        match sci.split_once('e') {
            Some((mantissa, exp)) => {
                let trimmed = trim_fraction(mantissa);
                format!("{trimmed}e{exp}")
            }
            None => sci,
        }
    } else {
        let decimals = (precision as i64 - 1 - exponent).max(0) as usize;
        trim_fraction(&fixed_digits(value, decimals))
    }
}

fn trim_fraction(text: &str) -> String {
    if !text.contains('.') {
        return text.to_string();
    }
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

/// Inserts a grouping separator every `every` digits from the right.
fn apply_grouping(digits: &str, grouping: Option<char>, every: usize) -> String {
    let Some(sep) = grouping else {
        return digits.to_string();
    };
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::new();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % every == 0 {
            out.push(sep);
        }
        out.push(*c);
    }
    out
}

/// Grouping for fixed-point floats applies to the integer part only.
fn apply_float_grouping(text: &str, grouping: Option<char>) -> String {
    if grouping.is_none() {
        return text.to_string();
    }
    match text.split_once('.') {
        Some((int_part, frac)) => format!("{}.{frac}", apply_grouping(int_part, grouping, 3)),
        None => apply_grouping(text, grouping, 3),
    }
}

/// Binary/octal/hex only group with `_`; `,` is a ValueError in CPython but
/// tolerated here as no grouping.
fn underscore_only(spec: &ParsedFormatSpec) -> Option<char> {
    spec.grouping.filter(|&g| g == '_')
}

/// Pads a numeric body, handling sign placement and `=` alignment.
fn pad_numeric(body: &str, negative: bool, spec: &ParsedFormatSpec, prefix: &str) -> String {
    let sign = if negative {
        "-"
    } else {
        match spec.sign {
            Some('+') => "+",
            Some(' ') => " ",
            _ => "",
        }
    };
    let content_len = sign.chars().count() + prefix.chars().count() + body.chars().count();
    let width = spec.width.unwrap_or(0);
    let padding = width.saturating_sub(content_len);
    match spec.align.unwrap_or('>') {
        '=' => {
            let fill: String = std::iter::repeat_n(spec.fill, padding).collect();
            format!("{sign}{prefix}{fill}{body}")
        }
        '<' => {
            let fill: String = std::iter::repeat_n(spec.fill, padding).collect();
            format!("{sign}{prefix}{body}{fill}")
        }
        '^' => {
            let left: String = std::iter::repeat_n(spec.fill, padding / 2).collect();
            let right: String = std::iter::repeat_n(spec.fill, padding - padding / 2).collect();
            format!("{left}{sign}{prefix}{body}{right}")
        }
        _ => {
            let fill: String = std::iter::repeat_n(spec.fill, padding).collect();
            format!("{fill}{sign}{prefix}{body}")
        }
    }
}

/// Pads non-numeric text; default alignment is left.
fn pad_text(body: &str, spec: &ParsedFormatSpec) -> String {
    let width = spec.width.unwrap_or(0);
    let padding = width.saturating_sub(body.chars().count());
    match spec.align.unwrap_or('<') {
        '>' => {
            let fill: String = std::iter::repeat_n(spec.fill, padding).collect();
            format!("{fill}{body}")
        }
        '^' => {
            let left: String = std::iter::repeat_n(spec.fill, padding / 2).collect();
            let right: String = std::iter::repeat_n(spec.fill, padding - padding / 2).collect();
            format!("{left}{body}{right}")
        }
        _ => {
            let fill: String = std::iter::repeat_n(spec.fill, padding).collect();
            format!("{body}{fill}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt_int(value: i64, spec: &str) -> String {
        format_int(&BigInt::from(value), &parse_format_spec(spec).unwrap()).unwrap()
    }

    fn fmt_float(value: f64, spec: &str) -> String {
        format_float(value, &parse_format_spec(spec).unwrap()).unwrap()
    }

    fn fmt_str(value: &str, spec: &str) -> String {
        format_str(value, &parse_format_spec(spec).unwrap()).unwrap()
    }

    #[test]
    fn int_basic_and_bases() {
        assert_eq!(fmt_int(255, "d"), "255");
        assert_eq!(fmt_int(255, "x"), "ff");
        assert_eq!(fmt_int(255, "X"), "FF");
        assert_eq!(fmt_int(255, "#x"), "0xff");
        assert_eq!(fmt_int(5, "b"), "101");
        assert_eq!(fmt_int(8, "#o"), "0o10");
        assert_eq!(fmt_int(65, "c"), "A");
    }

    #[test]
    fn int_width_sign_and_grouping() {
        assert_eq!(fmt_int(42, "5"), "   42");
        assert_eq!(fmt_int(42, "<5"), "42   ");
        assert_eq!(fmt_int(42, "^6"), "  42  ");
        assert_eq!(fmt_int(42, "05"), "00042");
        assert_eq!(fmt_int(-42, "05"), "-0042");
        assert_eq!(fmt_int(42, "+"), "+42");
        assert_eq!(fmt_int(1234567, ","), "1,234,567");
        assert_eq!(fmt_int(1234567, "_"), "1_234_567");
        assert_eq!(fmt_int(42, "*>6"), "****42");
    }

    #[test]
    fn float_fixed_and_percent() {
        assert_eq!(fmt_float(3.14159, ".2f"), "3.14");
        assert_eq!(fmt_float(1.0, "f"), "1.000000");
        assert_eq!(fmt_float(-1.5, "+.1f"), "-1.5");
        assert_eq!(fmt_float(0.25, ".0%"), "25%");
        assert_eq!(fmt_float(1234.5, ",.1f"), "1,234.5");
    }

    #[test]
    fn float_scientific_and_general() {
        assert_eq!(fmt_float(150.0, ".2e"), "1.50e+02");
        assert_eq!(fmt_float(0.0000015, ".1e"), "1.5e-06");
        assert_eq!(fmt_float(150.0, ".2E"), "1.50E+02");
        assert_eq!(fmt_float(0.00001, "g"), "1e-05");
        assert_eq!(fmt_float(123.456, ".4g"), "123.5");
        assert_eq!(fmt_float(100.0, "g"), "100");
    }

    #[test]
    fn string_padding_and_precision() {
        assert_eq!(fmt_str("ab", "5"), "ab   ");
        assert_eq!(fmt_str("ab", ">5"), "   ab");
        assert_eq!(fmt_str("ab", "^6"), "  ab  ");
        assert_eq!(fmt_str("abcdef", ".3"), "abc");
        assert_eq!(fmt_str("ab", "*^6"), "**ab**");
    }

    #[test]
    fn invalid_specs_fail() {
        assert!(parse_format_spec(".q").is_err());
        assert!(parse_format_spec("z").is_err());
        assert!(format_str("x", &parse_format_spec("d").unwrap()).is_err());
    }

    #[test]
    fn oversized_width_and_precision_are_errors_not_panics() {
        assert!(parse_format_spec("99999999999999999999d").is_err());
        assert!(parse_format_spec(".99999999999999999999f").is_err());
    }
}
