use std::{borrow::Cow, collections::BTreeMap};

use crate::value::Value;

/// The root data a template is rendered against.
///
/// Rendering only ever reads from a context, so one context may be shared
/// between any number of renders.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Context {
    data: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<N: AsRef<str>, V: Into<Value>>(&mut self, name: N, value: V) -> &mut Self {
        self.data.insert(name.as_ref().to_string(), value.into());
        self
    }

    pub fn get<N: AsRef<str>>(&self, name: N) -> Option<&Value> {
        self.data.get(name.as_ref())
    }

    pub fn contains<N: AsRef<str>>(&self, name: N) -> bool {
        self.data.contains_key(name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Resolves a dotted path such as `user.profile.name`.
    ///
    /// Returns `None` as soon as a segment is missing or the value reached so
    /// far is not a mapping. Never panics, whatever the path.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        segments.try_fold(self.get(first)?, |current, segment| current.get(segment))
    }
}

impl From<BTreeMap<String, Value>> for Context {
    fn from(data: BTreeMap<String, Value>) -> Self {
        Self { data }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Lookup chain used while rendering.
///
/// Each `{{#each}}` iteration pushes an item scope in front of its parent
/// instead of copying the parent's data.
pub(crate) enum Scope<'a> {
    Root(&'a Context),
    Item {
        parent: &'a Scope<'a>,
        element: &'a Value,
        index: usize,
        count: usize,
    },
}

impl<'a> Scope<'a> {
    pub(crate) const fn item(
        parent: &'a Scope<'a>,
        element: &'a Value,
        index: usize,
        count: usize,
    ) -> Self {
        Self::Item {
            parent,
            element,
            index,
            count,
        }
    }

    /// Finds the first segment of a path, innermost scope first.
    fn lookup(&self, key: &str) -> Option<Cow<'a, Value>> {
        match self {
            Self::Root(context) => context.get(key).map(Cow::Borrowed),
            Self::Item {
                parent,
                element,
                index,
                count,
            } => match key {
                "@index" => Some(Cow::Owned(Value::from(*index))),
                "@first" => Some(Cow::Owned(Value::Bool(*index == 0))),
                "@last" => Some(Cow::Owned(Value::Bool(
                    index.checked_add(1) == Some(*count),
                ))),
                _ => {
                    let own = match element.get(key) {
                        Some(field) => Some(field),
                        None if key == "this" => Some(*element),
                        None => None,
                    };
                    own.map(Cow::Borrowed).or_else(|| parent.lookup(key))
                }
            },
        }
    }

    pub(crate) fn resolve(&self, path: &str) -> Option<Cow<'a, Value>> {
        let mut segments = path.split('.');
        let mut current = self.lookup(segments.next()?)?;
        for segment in segments {
            current = match current {
                Cow::Borrowed(value) => Cow::Borrowed(value.get(segment)?),
                Cow::Owned(value) => Cow::Owned(value.get(segment)?.clone()),
            };
        }
        Some(current)
    }
}
