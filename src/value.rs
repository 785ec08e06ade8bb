use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

/// Structured fields attached to a record, kept in key order.
pub type Fields = BTreeMap<String, Value>;

/// A structured field value or positional message argument.
///
/// `Set` holds the members of an unordered collection. It is normalized to a
/// sorted, de-duplicated sequence whenever it is rendered, so output does not
/// depend on hash iteration order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::UInt(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
        }
    }

    /// Normalize into a JSON value.
    ///
    /// Never fails: sets become sorted arrays and non-finite floats, which
    /// JSON cannot carry, become their textual form.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::UInt(u) => Json::from(*u),
            Value::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(n) => Json::Number(n),
                None => Json::String(f.to_string()),
            },
            Value::Str(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Set(items) => Json::Array(sorted_members(items).into_iter().map(Value::to_json).collect()),
            Value::Map(map) => Json::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
        }
    }

    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::UInt(u) => Some(*u as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

fn sorted_members(items: &[Value]) -> Vec<&Value> {
    let mut members: Vec<&Value> = items.iter().collect();
    members.sort_by(|a, b| canonical_cmp(a, b));
    members.dedup_by(|a, b| canonical_cmp(a, b) == Ordering::Equal);
    members
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::UInt(_) | Value::Float(_) => 2,
        Value::Str(_) => 3,
        Value::List(_) => 4,
        Value::Set(_) => 5,
        Value::Map(_) => 6,
    }
}

/// Total order over values: by type first, then by content.
fn canonical_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        (Value::List(x), Value::List(y)) => cmp_seq(x.iter(), y.iter()),
        (Value::Set(x), Value::Set(y)) => cmp_seq(sorted_members(x).into_iter(), sorted_members(y).into_iter()),
        (Value::Map(x), Value::Map(y)) => {
            let mut left = x.iter();
            let mut right = y.iter();
            loop {
                match (left.next(), right.next()) {
                    (None, None) => return Ordering::Equal,
                    (None, Some(_)) => return Ordering::Less,
                    (Some(_), None) => return Ordering::Greater,
                    (Some((ka, va)), Some((kb, vb))) => {
                        let ord = ka.cmp(kb).then_with(|| canonical_cmp(va, vb));
                        if ord != Ordering::Equal {
                            return ord;
                        }
                    }
                }
            }
        }
        _ => match (Number::of(a), Number::of(b)) {
            (Some(x), Some(y)) => x.total_order(y),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}

/// Numeric view used for ordering. Integers of either signedness widen to
/// `i128` so every `i64` and `u64` is exact.
#[derive(Debug, Clone, Copy)]
enum Number {
    Integer(i128),
    Float(f64),
}

impl Number {
    fn of(value: &Value) -> Option<Number> {
        match value {
            Value::Int(i) => Some(Number::Integer(i128::from(*i))),
            Value::UInt(u) => Some(Number::Integer(i128::from(*u))),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// Exact numeric order. An integer and a float of equal value are
    /// distinct members: the integer sorts first.
    fn total_order(self, other: Number) -> Ordering {
        match (self, other) {
            (Number::Integer(x), Number::Integer(y)) => x.cmp(&y),
            (Number::Float(x), Number::Float(y)) => x.total_cmp(&y),
            (Number::Integer(x), Number::Float(y)) => cmp_integer_float(x, y).then(Ordering::Less),
            (Number::Float(x), Number::Integer(y)) => cmp_integer_float(y, x).reverse().then(Ordering::Greater),
        }
    }
}

fn cmp_integer_float(i: i128, f: f64) -> Ordering {
    // Integers here fit in 65 bits; floats past 2^64 decide by sign alone.
    const BOUND: f64 = 18_446_744_073_709_551_616.0;
    if f.is_nan() {
        return if f.is_sign_negative() { Ordering::Greater } else { Ordering::Less };
    }
    if f >= BOUND {
        return Ordering::Less;
    }
    if f <= -BOUND {
        return Ordering::Greater;
    }
    let floor = f.floor();
    match i.cmp(&(floor as i128)) {
        Ordering::Equal if floor < f => Ordering::Less,
        ord => ord,
    }
}

fn cmp_seq<'a>(mut left: impl Iterator<Item = &'a Value>, mut right: impl Iterator<Item = &'a Value>) -> Ordering {
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => {
                let ord = canonical_cmp(a, b);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::UInt(u) => write!(f, "{u}"),
            Value::Float(x) => f.write_str(&float_text(*x)),
            Value::Str(s) => f.write_str(s),
            Value::List(_) | Value::Set(_) | Value::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

/// Float text with an explicit fractional part (`1.0`, `1e+16`, `nan`).
fn float_text(x: f64) -> String {
    if x.is_nan() {
        "nan".to_string()
    } else if x.is_infinite() {
        let text = if x > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else if x != 0.0 && !(1e-4..1e16).contains(&x.abs()) {
        let rendered = format!("{x:e}");
        match rendered.split_once('e') {
            Some((mantissa, exp)) if exp.starts_with('-') => format!("{mantissa}e-{:0>2}", &exp[1..]),
            Some((mantissa, exp)) => format!("{mantissa}e+{exp:0>2}"),
            None => rendered,
        }
    } else if x.fract() == 0.0 {
        format!("{x:.1}")
    } else {
        x.to_string()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

macro_rules! value_from_int {
    ($variant:ident as $target:ty: $($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v as $target)
            }
        })*
    };
}

value_from_int!(Int as i64: i8, i16, i32, i64, isize, u8, u16, u32);
value_from_int!(UInt as u64: u64, usize);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(v.clone())
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Str(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, S> From<HashSet<T, S>> for Value {
    fn from(v: HashSet<T, S>) -> Self {
        Value::Set(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeSet<T>> for Value {
    fn from(v: BTreeSet<T>) -> Self {
        Value::Set(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(v: BTreeMap<String, T>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>, S> From<HashMap<String, T, S>> for Value {
    fn from(v: HashMap<String, T, S>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match v {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    n.as_f64().map_or(Value::Null, Value::Float)
                }
            }
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List(items.into_iter().map(Into::into).collect()),
            Json::Object(map) => Value::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

/// Build a [`Fields`] map from `key => value` pairs.
///
/// ```
/// let fields = tiered_log::fields! { "user_id" => 42, "reason" => "timeout" };
/// assert_eq!(fields.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(fields.insert(::std::string::String::from($key), $crate::Value::from($value));)+
        fields
    }};
}
