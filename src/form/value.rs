use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Number, Value};

pub trait FieldValue: Send + Sync + 'static {
    fn to_form_string(&self) -> String;

    fn to_json_value(&self) -> Value;

    fn parse_input(text: &str) -> Option<Self>
    where
        Self: Sized;
}

impl FieldValue for String {
    fn to_form_string(&self) -> String {
        self.clone()
    }

    fn to_json_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn parse_input(text: &str) -> Option<Self> {
        Some(text.to_string())
    }
}

impl FieldValue for bool {
    fn to_form_string(&self) -> String {
        String::from(if *self { "true" } else { "false" })
    }

    fn to_json_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn parse_input(text: &str) -> Option<Self> {
        match text.trim() {
            "true" | "on" => Some(true),
            "false" | "off" => Some(false),
            _ => None,
        }
    }
}

macro_rules! impl_integer_field_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn to_form_string(&self) -> String {
                    self.to_string()
                }

                fn to_json_value(&self) -> Value {
                    Value::from(*self)
                }

                fn parse_input(text: &str) -> Option<Self> {
                    text.trim().parse().ok()
                }
            }
        )*
    };
}

impl_integer_field_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FieldValue for f64 {
    fn to_form_string(&self) -> String {
        format_number(*self, format!("{:e}", self))
    }

    fn to_json_value(&self) -> Value {
        Number::from_f64(*self).map_or(Value::Null, Value::Number)
    }

    fn parse_input(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl FieldValue for f32 {
    fn to_form_string(&self) -> String {
        format_number(f64::from(*self), format!("{:e}", self))
    }

    fn to_json_value(&self) -> Value {
        Number::from_f64(f64::from(*self)).map_or(Value::Null, Value::Number)
    }

    fn parse_input(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl FieldValue for Decimal {
    fn to_form_string(&self) -> String {
        self.normalize().to_string()
    }

    fn to_json_value(&self) -> Value {
        self.to_f64()
            .and_then(Number::from_f64)
            .map_or_else(|| Value::String(self.normalize().to_string()), Value::Number)
    }

    fn parse_input(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

/// Renders a float the way ECMAScript `Number::toString` does.
///
/// `scientific` is the shortest round-trip `{:e}` rendering of the same value,
/// which supplies the significant digits and the decimal exponent.
pub(crate) fn format_number(value: f64, scientific: String) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let (negative, unsigned) = match scientific.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, scientific.as_str()),
    };
    let Some((mantissa, exponent)) = unsigned.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };
    let digits = mantissa.replace('.', "");
    let k = digits.len() as i32;
    let n = exponent + 1;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let sign = if n - 1 < 0 { '-' } else { '+' };
        let magnitude = (n - 1).abs();
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{sign}{magnitude}")
        } else {
            format!("{first}.{rest}e{sign}{magnitude}")
        }
    };

    if negative { format!("-{body}") } else { body }
}
