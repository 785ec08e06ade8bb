//! printf-style `%` conversions.
//!
//! Used twice: positional interpolation of log messages (`"took %d ms"`), and
//! keyed lookups in formatter templates (`"%(name)-12s"`).

use crate::value::Value;
use std::iter::Peekable;
use std::str::Chars;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpolationError {
    #[error("not enough arguments for format string")]
    NotEnoughArguments,

    #[error("not all arguments converted during string formatting")]
    TooManyArguments,

    #[error("%{conversion} format requires a number, not {found}")]
    NotANumber { conversion: char, found: &'static str },

    #[error("unsupported format character {0:?}")]
    UnsupportedConversion(char),

    #[error("incomplete format")]
    Incomplete,
}

/// One parsed `%[flags][width][.precision]conversion` directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Conversion {
    left: bool,
    zero: bool,
    plus: bool,
    space: bool,
    width: Option<usize>,
    precision: Option<usize>,
    kind: char,
}

impl Conversion {
    /// Parse everything after the `%` (and after any `(key)`).
    pub(crate) fn parse(chars: &mut Peekable<Chars<'_>>) -> Result<Self, InterpolationError> {
        let mut conv = Conversion::default();
        while let Some(&c) = chars.peek() {
            match c {
                '-' => conv.left = true,
                '0' => conv.zero = true,
                '+' => conv.plus = true,
                ' ' => conv.space = true,
                '#' => {}
                _ => break,
            }
            chars.next();
        }
        conv.width = take_number(chars);
        if chars.peek() == Some(&'.') {
            chars.next();
            conv.precision = Some(take_number(chars).unwrap_or(0));
        }
        conv.kind = match chars.next() {
            Some(c @ ('s' | 'r' | 'd' | 'i' | 'u' | 'f' | 'F' | 'e' | 'E' | 'x' | 'X' | 'o')) => c,
            Some(other) => return Err(InterpolationError::UnsupportedConversion(other)),
            None => return Err(InterpolationError::Incomplete),
        };
        Ok(conv)
    }

    /// Render `value` under this directive.
    pub(crate) fn render(&self, value: &Value) -> Result<String, InterpolationError> {
        let body = match self.kind {
            's' => match self.precision {
                Some(p) => value.to_string().chars().take(p).collect(),
                None => value.to_string(),
            },
            'r' => match value {
                Value::Str(s) => quoted(s),
                other => other.to_string(),
            },
            'd' | 'i' | 'u' => self.signed(integer(value, self.kind)?.to_string()),
            'f' | 'F' => {
                let x = float(value, self.kind)?;
                self.signed(format!("{:.*}", self.precision.unwrap_or(6), x))
            }
            'e' | 'E' => {
                let x = float(value, self.kind)?;
                let rendered = exponent(x, self.precision.unwrap_or(6));
                self.signed(if self.kind == 'E' { rendered.to_uppercase() } else { rendered })
            }
            'x' => self.signed(radix(integer(value, self.kind)?, |n| format!("{n:x}"))),
            'X' => self.signed(radix(integer(value, self.kind)?, |n| format!("{n:X}"))),
            'o' => self.signed(radix(integer(value, self.kind)?, |n| format!("{n:o}"))),
            other => return Err(InterpolationError::UnsupportedConversion(other)),
        };
        Ok(self.pad(body))
    }

    /// Apply width and alignment only. Used for placeholders such as `None`.
    pub(crate) fn pad(&self, body: String) -> String {
        let len = body.chars().count();
        let width = match self.width {
            Some(w) if w > len => w,
            _ => return body,
        };
        let fill = width - len;
        if self.left {
            format!("{body}{}", " ".repeat(fill))
        } else if self.zero && self.is_numeric() {
            let (sign, digits) = match body.strip_prefix(['-', '+', ' ']) {
                Some(rest) => body.split_at(body.len() - rest.len()),
                None => ("", body.as_str()),
            };
            format!("{sign}{}{digits}", "0".repeat(fill))
        } else {
            format!("{}{body}", " ".repeat(fill))
        }
    }

    fn is_numeric(&self) -> bool {
        !matches!(self.kind, 's' | 'r')
    }

    fn signed(&self, body: String) -> String {
        if body.starts_with('-') {
            body
        } else if self.plus {
            format!("+{body}")
        } else if self.space {
            format!(" {body}")
        } else {
            body
        }
    }
}

/// Single-quoted string literal; double quotes when the text holds only
/// single quotes.
fn quoted(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn take_number(chars: &mut Peekable<Chars<'_>>) -> Option<usize> {
    let mut number: Option<usize> = None;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        number = Some(number.unwrap_or(0).saturating_mul(10).saturating_add(digit as usize));
        chars.next();
    }
    number
}

fn integer(value: &Value, conversion: char) -> Result<i128, InterpolationError> {
    match value {
        Value::Int(i) => Ok(i128::from(*i)),
        Value::UInt(u) => Ok(i128::from(*u)),
        Value::Bool(b) => Ok(i128::from(*b)),
        Value::Float(f) if f.is_finite() => Ok(f.trunc() as i128),
        other => Err(InterpolationError::NotANumber { conversion, found: other.type_name() }),
    }
}

fn float(value: &Value, conversion: char) -> Result<f64, InterpolationError> {
    value
        .as_f64()
        .ok_or(InterpolationError::NotANumber { conversion, found: value.type_name() })
}

fn radix(n: i128, render: impl Fn(u128) -> String) -> String {
    if n < 0 {
        format!("-{}", render(n.unsigned_abs()))
    } else {
        render(n.unsigned_abs())
    }
}

/// `1.5e+00` style: signed, at least two exponent digits.
fn exponent(x: f64, precision: usize) -> String {
    let rendered = format!("{x:.precision$e}");
    match rendered.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => rendered,
    }
}

/// Substitute positional `args` into `template`.
///
/// With no arguments the template is returned verbatim, so a literal `%` in
/// a plain message needs no escaping.
pub fn interpolate(template: &str, args: &[Value]) -> Result<String, InterpolationError> {
    if args.is_empty() {
        return Ok(template.to_string());
    }

    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }
        if chars.peek() == Some(&'(') {
            return Err(InterpolationError::UnsupportedConversion('('));
        }
        let conv = Conversion::parse(&mut chars)?;
        let arg = args.next().ok_or(InterpolationError::NotEnoughArguments)?;
        out.push_str(&conv.render(arg)?);
    }

    if args.next().is_some() {
        return Err(InterpolationError::TooManyArguments);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[Value]) -> Vec<Value> {
        values.to_vec()
    }

    #[test]
    fn test_plain_template_is_untouched_without_args() {
        assert_eq!(interpolate("100% done %s", &[]).unwrap(), "100% done %s");
    }

    #[test]
    fn test_string_and_integer_conversions() {
        let out = interpolate("%s %s", &args(&["INFO".into(), "message".into()])).unwrap();
        assert_eq!(out, "INFO message");
        let out = interpolate("took %d ms (%i%%)", &args(&[Value::from(42.9), Value::from(7)])).unwrap();
        assert_eq!(out, "took 42 ms (7%)");
    }

    #[test]
    fn test_width_precision_and_flags() {
        assert_eq!(interpolate("[%-6s]", &["ab".into()]).unwrap(), "[ab    ]");
        assert_eq!(interpolate("[%6s]", &["ab".into()]).unwrap(), "[    ab]");
        assert_eq!(interpolate("[%.2s]", &["abcdef".into()]).unwrap(), "[ab]");
        assert_eq!(interpolate("[%05d]", &[Value::from(-42)]).unwrap(), "[-0042]");
        assert_eq!(interpolate("[%+d]", &[Value::from(3)]).unwrap(), "[+3]");
        assert_eq!(interpolate("[%.2f]", &[Value::from(1.23456)]).unwrap(), "[1.23]");
        assert_eq!(interpolate("[%f]", &[Value::from(1)]).unwrap(), "[1.000000]");
        assert_eq!(interpolate("[%.3e]", &[Value::from(1234.0)]).unwrap(), "[1.234e+03]");
        assert_eq!(interpolate("[%x %X %o]", &[Value::from(255), Value::from(255), Value::from(8)]).unwrap(), "[ff FF 10]");
        assert_eq!(interpolate("%r", &["q".into()]).unwrap(), "'q'");
        assert_eq!(interpolate("%r", &["it's".into()]).unwrap(), "\"it's\"");
        assert_eq!(interpolate("%r", &["a'b\"c".into()]).unwrap(), "'a\\'b\"c'");
        assert_eq!(interpolate("%r", &["tab\there".into()]).unwrap(), "'tab\\there'");
        assert_eq!(interpolate("%s|%r", &[Value::from(1.0), Value::from(2.0)]).unwrap(), "1.0|2.0");
    }

    #[test]
    fn test_argument_count_mismatch() {
        assert_eq!(interpolate("%s and %s", &["one".into()]), Err(InterpolationError::NotEnoughArguments));
        assert_eq!(interpolate("%s", &["one".into(), "two".into()]), Err(InterpolationError::TooManyArguments));
        assert_eq!(interpolate("no directives", &["one".into()]), Err(InterpolationError::TooManyArguments));
    }

    #[test]
    fn test_type_mismatch_and_bad_directives() {
        assert_eq!(
            interpolate("%d", &["ten".into()]),
            Err(InterpolationError::NotANumber { conversion: 'd', found: "str" })
        );
        assert_eq!(interpolate("%y", &["x".into()]), Err(InterpolationError::UnsupportedConversion('y')));
        assert_eq!(interpolate("trailing %", &["x".into()]), Err(InterpolationError::Incomplete));
        assert_eq!(interpolate("%(key)s", &["x".into()]), Err(InterpolationError::UnsupportedConversion('(')));
    }
}
