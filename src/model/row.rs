use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Stable identity of a row within one grid instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Num(i64),
    Str(String),
}

impl RowId {
    /// Read an identity out of a JSON value. Only integers and strings qualify.
    pub fn from_value(value: &Value) -> Option<RowId> {
        match value {
            Value::Number(n) => n.as_i64().map(RowId::Num),
            Value::String(s) => Some(RowId::Str(s.clone())),
            _ => None,
        }
    }

    /// Parse a command-line token: integers become `Num`, anything else `Str`.
    pub fn parse(token: &str) -> RowId {
        match token.parse::<i64>() {
            Ok(n) => RowId::Num(n),
            Err(_) => RowId::Str(token.to_string()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RowId::Num(n) => Value::from(*n),
            RowId::Str(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Num(n) => write!(f, "{}", n),
            RowId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RowId {
    fn from(n: i64) -> Self {
        RowId::Num(n)
    }
}

impl From<i32> for RowId {
    fn from(n: i32) -> Self {
        RowId::Num(i64::from(n))
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        RowId::Str(s.to_string())
    }
}

/// What the grid needs from a row: an identity and attribute lookup.
/// Everything else about a row is opaque to the grid.
pub trait GridRow {
    fn row_id(&self) -> RowId;
    fn field(&self, key: &str) -> Option<&Value>;
}

/// An application record: a JSON object with an `id` attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Build a record from a JSON object. Returns None if `id` is missing or
    /// is not a string/integer.
    pub fn from_map(fields: Map<String, Value>) -> Option<Record> {
        RowId::from_value(fields.get("id")?)?;
        Some(Record { fields })
    }

    /// Build a record with the given identity and attributes.
    pub fn new(id: impl Into<RowId>, attrs: impl IntoIterator<Item = (String, Value)>) -> Record {
        let mut fields = Map::new();
        fields.insert("id".into(), id.into().to_value());
        for (k, v) in attrs {
            if k != "id" {
                fields.insert(k, v);
            }
        }
        Record { fields }
    }

    pub fn id(&self) -> RowId {
        self.fields
            .get("id")
            .and_then(RowId::from_value)
            .unwrap_or(RowId::Num(0))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set an attribute. The identity cannot be changed through this.
    pub fn set(&mut self, key: &str, value: Value) {
        if key != "id" {
            self.fields.insert(key.to_string(), value);
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl GridRow for Record {
    fn row_id(&self) -> RowId {
        self.id()
    }

    fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Stringify a cell value the way it is displayed, searched and matched.
/// Missing and null values are empty; strings are unquoted.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| display_value(Some(v)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Object(map)) => match map.get("name") {
            // Tag-like objects ({name, color}) display by name
            Some(name) => display_value(Some(name)),
            None => Value::Object(map.clone()).to_string(),
        },
    }
}

/// Rank used to order values of different JSON types against each other.
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Total order over cell values used for sorting.
///
/// Missing < bool < number < string < array < object. Numbers compare
/// numerically, strings lexically, arrays and objects by their display text.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => compare_numbers(x, y),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Array(_)), Some(Value::Array(_)))
        | (Some(Value::Object(_)), Some(Value::Object(_))) => {
            display_value(a).cmp(&display_value(b))
        }
        _ => Ordering::Equal,
    }
}

/// Integers as exact `i128`, so large ids never round through `f64`
fn as_int(n: &Number) -> Option<i128> {
    n.as_i64().map(i128::from).or_else(|| n.as_u64().map(i128::from))
}

/// Exact numeric order across integer and float representations.
/// JSON numbers are always finite.
fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    let fx = x.as_f64().unwrap_or(0.0);
    let fy = y.as_f64().unwrap_or(0.0);
    match (as_int(x), as_int(y)) {
        (Some(i), Some(j)) => i.cmp(&j),
        (Some(i), None) => int_vs_float(i, fy),
        (None, Some(j)) => int_vs_float(j, fx).reverse(),
        (None, None) => fx.partial_cmp(&fy).unwrap_or(Ordering::Equal),
    }
}

fn int_vs_float(i: i128, f: f64) -> Ordering {
    // 2^127, outside the i128 range
    const LIMIT: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;
    if f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }
    let floor = f.floor();
    match i.cmp(&(floor as i128)) {
        Ordering::Equal if f > floor => Ordering::Less,
        ord => ord,
    }
}
