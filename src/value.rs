use std::{borrow::Cow, collections::BTreeMap, num::FpCategory};

/// A single piece of data addressable from a template.
///
/// Absent values are never represented here: lookups that miss return
/// `None` instead.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    /// Classifies the value for `{{#if}}` and `{{#unless}}`.
    ///
    /// `null`, `false`, the empty string and the empty sequence are falsy.
    /// Everything else is truthy, including `0`, `0.0` and the empty mapping.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(flag) => *flag,
            Self::String(text) => !text.is_empty(),
            Self::Sequence(items) => !items.is_empty(),
            Self::Int(_) | Self::Float(_) | Self::Mapping(_) => true,
        }
    }

    /// Looks up a field of a mapping. Every other kind of value has no fields.
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Mapping(fields) => fields.get(key),
            Self::Null
            | Self::Bool(_)
            | Self::Int(_)
            | Self::Float(_)
            | Self::String(_)
            | Self::Sequence(_) => None,
        }
    }

    pub const fn as_sequence(&self) -> Option<&Vec<Self>> {
        match self {
            Self::Sequence(items) => Some(items),
            Self::Null
            | Self::Bool(_)
            | Self::Int(_)
            | Self::Float(_)
            | Self::String(_)
            | Self::Mapping(_) => None,
        }
    }

    /// The text a placeholder emits for this value, before any escaping.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed(""),
            Self::Bool(true) => Cow::Borrowed("true"),
            Self::Bool(false) => Cow::Borrowed("false"),
            Self::Int(number) => Cow::Owned(number.to_string()),
            Self::Float(number) => float_text(*number),
            Self::String(text) => Cow::Borrowed(text.as_str()),
            Self::Sequence(items) => Cow::Owned(
                items
                    .iter()
                    .map(Self::to_text)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            Self::Mapping(_) => Cow::Borrowed("[object Object]"),
        }
    }
}

/// Shortest round-trip decimal, except that non-finite values print as
/// `NaN`, `Infinity` and `-Infinity` and negative zero prints as `0`.
fn float_text(number: f64) -> Cow<'static, str> {
    match number.classify() {
        FpCategory::Nan => Cow::Borrowed("NaN"),
        FpCategory::Infinite if number.is_sign_negative() => Cow::Borrowed("-Infinity"),
        FpCategory::Infinite => Cow::Borrowed("Infinity"),
        FpCategory::Zero => Cow::Borrowed("0"),
        FpCategory::Subnormal | FpCategory::Normal => Cow::Owned(number.to_string()),
    }
}

/// Truthiness of a path lookup, where `None` means the path was absent.
pub fn is_truthy(value: Option<&Value>) -> bool {
    value.is_some_and(Value::is_truthy)
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Self {
        Self::Int(i64::from(number))
    }
}

impl From<u32> for Value {
    fn from(number: u32) -> Self {
        Self::Int(i64::from(number))
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Self::Int(number)
    }
}

impl From<usize> for Value {
    #[allow(
        clippy::cast_precision_loss,
        reason = "only reached for counts beyond i64::MAX"
    )]
    fn from(number: usize) -> Self {
        i64::try_from(number).map_or_else(|_| Self::Float(number as f64), Self::Int)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self::Float(number)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::String(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::String(text)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Self>> for Value {
    fn from(fields: BTreeMap<String, Self>) -> Self {
        Self::Mapping(fields)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<K: Into<String>, V: Into<Self>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Mapping(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}
