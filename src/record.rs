use std::cmp::Ordering;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// A single scalar cell as delivered by the data store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Hashable identity of a `Value`, used wherever values are counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Bool(bool),
    Number(u64),
    Text(String),
}

impl Value {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Value::Null => ColumnKind::Unknown,
            Value::Bool(_) => ColumnKind::Boolean,
            Value::Number(_) => ColumnKind::Numeric,
            Value::Text(_) => ColumnKind::Text,
        }
    }

    pub fn key(&self) -> ValueKey {
        match self {
            Value::Null => ValueKey::Null,
            Value::Bool(b) => ValueKey::Bool(*b),
            // -0.0 and 0.0 are the same value
            Value::Number(n) if *n == 0.0 => ValueKey::Number(0f64.to_bits()),
            Value::Number(n) => ValueKey::Number(n.to_bits()),
            Value::Text(s) => ValueKey::Text(s.clone()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Plain text of the raw value, the form search matches against.
    pub fn as_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::Text(s) => s.clone(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::Text(_) => 3,
        }
    }

    /// Natural ordering: numbers numerically, text lexicographically,
    /// false before true. Mixed kinds order as null < bool < number < text.
    pub fn natural_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

/// Integral numbers print without a fraction, everything else in the
/// shortest form that round-trips.
pub fn number_to_string(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

static NULL: Value = Value::Null;

/// One row of the dataset. Keeps the key order of the source document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with(mut self, name: &str, value: Value) -> Self {
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name.to_string(), value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Missing keys read as null.
    pub fn value(&self, name: &str) -> &Value {
        self.get(name).unwrap_or(&NULL)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in self.fields.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a flat object of scalar values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
        let mut record = Record {
            fields: Vec::with_capacity(access.size_hint().unwrap_or(0)),
        };
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            if record.get(&key).is_some() {
                return Err(de::Error::custom(format!("duplicate column \"{key}\"")));
            }
            record.fields.push((key, value));
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Record, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Boolean,
    Numeric,
    Text,
    Unknown,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        *self == ColumnKind::Numeric
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, ColumnKind::Boolean | ColumnKind::Text)
    }
}

/// How column kinds are derived from a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ColumnInference {
    /// Classify by the first record only.
    FirstRecord,
    /// Classify by every non-null value in the column.
    FullScan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
    pub label: String,
}

/// "first_name" -> "First Name"
pub fn column_label(name: &str) -> String {
    let mut label = String::with_capacity(name.len());
    let mut prev_is_word = false;
    for c in name.replace('_', " ").chars() {
        if c.is_alphanumeric() && !prev_is_word {
            label.extend(c.to_uppercase());
        } else {
            label.push(c);
        }
        prev_is_word = c.is_alphanumeric();
    }
    label
}

/// Column names always come from the first record. Keys that only show up
/// in later records are not part of the table.
pub fn infer_columns(records: &[Record], inference: ColumnInference) -> Vec<ColumnDescriptor> {
    let Some(first) = records.first() else {
        return Vec::new();
    };
    first
        .iter()
        .map(|(name, value)| {
            let kind = match inference {
                ColumnInference::FirstRecord => value.kind(),
                ColumnInference::FullScan => scan_kind(records, name),
            };
            ColumnDescriptor {
                name: name.to_string(),
                kind,
                label: column_label(name),
            }
        })
        .collect()
}

fn scan_kind(records: &[Record], name: &str) -> ColumnKind {
    let mut kind = ColumnKind::Unknown;
    for record in records.iter() {
        match (kind, record.value(name).kind()) {
            (_, ColumnKind::Unknown) => {}
            (ColumnKind::Unknown, k) => kind = k,
            (a, b) if a == b => {}
            _ => return ColumnKind::Text,
        }
    }
    kind
}
