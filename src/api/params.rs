use serde::Serialize;

/// One parameter value: a single string or a repeated parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    List(Vec<String>),
}

impl ParamValue {
    pub fn is_empty(&self) -> bool {
        match self {
            ParamValue::Single(s) => s.is_empty(),
            ParamValue::List(items) => items.is_empty(),
        }
    }

    /// Values in emission order.
    pub fn values(&self) -> &[String] {
        match self {
            ParamValue::Single(s) => std::slice::from_ref(s),
            ParamValue::List(items) => items,
        }
    }

    /// First value, used where only one makes sense (`offset`, `limit`).
    pub fn first(&self) -> Option<&str> {
        self.values().first().map(String::as_str)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::List(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// Ordered parameter name → value mapping for one request.
///
/// Merging never replaces: a second value for a name turns it into a list,
/// later values are appended, so N merged values always read back as N
/// elements in the order they arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, name: &str, value: impl Into<ParamValue>) {
        let value = value.into();
        if let ParamValue::List(items) = &value {
            if items.is_empty() {
                return;
            }
        }

        let Some(index) = self.entries.iter().position(|(n, _)| n == name) else {
            self.entries.push((name.to_string(), value));
            return;
        };

        let slot = &mut self.entries[index];
        let existing = std::mem::replace(&mut slot.1, ParamValue::List(Vec::new()));
        slot.1 = match (existing, value) {
            (ParamValue::Single(old), ParamValue::Single(new)) => ParamValue::List(vec![old, new]),
            (ParamValue::Single(old), ParamValue::List(new)) => {
                let mut items = Vec::with_capacity(new.len() + 1);
                items.push(old);
                items.extend(new);
                ParamValue::List(items)
            }
            (ParamValue::List(mut items), new) => {
                items.extend(new.values().iter().cloned());
                ParamValue::List(items)
            }
        };
    }

    /// Merges every entry of `other`, in order.
    pub fn extend(&mut self, other: &ParameterSet) {
        for (name, value) in other.iter() {
            self.merge(name, value.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Flattened `name=value` pairs; lists repeat the name.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(n, v)| v.values().iter().map(move |val| (n.as_str(), val.as_str())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
