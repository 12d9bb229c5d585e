//! Turns visitor query input into API parameters.
//!
//! Each record type accepts a fixed list of API parameter names, reachable
//! from the query string both as `vista-<name>` and as the bare name (older
//! links). The collection algorithm is shared; only the name table differs.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

use crate::api::params::{ParamValue, ParameterSet};
use crate::utils::text::sanitize_text;

/// Separators that turn one visitor value into several: `%2C+`, `, ` and `+`.
static LIST_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(%2C\+)|(, )|\+").unwrap());

/// Decoded visitor input, keys in arrival order. `name[]` keys arrive as lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryInput {
    entries: Vec<(String, ParamValue)>,
}

impl QueryInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw query string (without the leading `?`).
    pub fn parse(raw: &str) -> Self {
        let mut input = Self::new();
        let Ok(mut url) = Url::parse("http://localhost/") else {
            return input;
        };
        url.set_query(Some(raw.trim_start_matches('?')));

        for (key, value) in url.query_pairs() {
            match key.strip_suffix("[]") {
                Some(base) => input.push_list_item(base, value.into_owned()),
                None => input.insert(&key, value.into_owned()),
            }
        }
        input
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut input = Self::new();
        for (k, v) in pairs {
            input.insert(k.as_ref(), v.into());
        }
        input
    }

    /// Sets a scalar; a repeated key keeps the last value, like a form post.
    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    fn push_list_item(&mut self, key: &str, value: String) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, ParamValue::List(items))) => items.push(value),
            Some(slot) => slot.1 = ParamValue::List(vec![value]),
            None => self.entries.push((key.to_string(), ParamValue::List(vec![value]))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// First value of `key`, if any.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::first)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CollectOptions {
    /// Trim split tokens and drop the ones left empty.
    pub trim_tokens: bool,
}

/// External-name → API-name table for one record type.
#[derive(Debug, Clone, Copy)]
pub struct ParamMapping {
    prefix: &'static str,
    api_names: &'static [&'static str],
}

impl ParamMapping {
    pub const fn new(prefix: &'static str, api_names: &'static [&'static str]) -> Self {
        Self { prefix, api_names }
    }

    /// `(external, api)` pairs: every prefixed name first, then the bare names.
    pub fn entries(&self) -> impl Iterator<Item = (String, &'static str)> + '_ {
        let prefixed = self
            .api_names
            .iter()
            .map(move |name| (format!("{}{}", self.prefix, name), *name));
        let bare = self.api_names.iter().map(|name| (name.to_string(), *name));
        prefixed.chain(bare)
    }

    pub fn api_names(&self) -> &'static [&'static str] {
        self.api_names
    }
}

pub const LISTING_PARAMS: ParamMapping = ParamMapping::new(
    "vista-",
    &[
        "offset", "limit", "q", "status", "type", "subtype", "subTypeText", "agent",
        "salesAgent", "brokers", "specialListingConditions", "ownership", "minprice",
        "maxprice", "minarea", "maxarea", "minbaths", "maxbaths", "minbeds", "maxbeds",
        "maxdom", "minlistdate", "maxlistdate", "minyear", "maxyear", "minacres",
        "maxacres", "minGarageSpaces", "maxGarageSpaces", "lastId", "postalCodes",
        "features", "exteriorFeatures", "water", "neighborhoods", "cities", "state",
        "counties", "points", "idx", "include", "sort", "count", "listing_ids", "mls_area",
    ],
);

pub const OPEN_HOUSE_PARAMS: ParamMapping = ParamMapping::new(
    "vista-",
    &[
        "offset", "limit", "type", "listingId", "cities", "brokers", "agent", "minprice",
        "startdate", "lastId", "sort", "include",
    ],
);

pub const ANALYTICS_PARAMS: ParamMapping = ParamMapping::new(
    "vista-",
    &[
        "offset", "limit", "q", "status", "type", "subtype", "agent", "salesAgent",
        "brokers", "minprice", "maxprice", "minarea", "maxarea", "minbaths", "maxbaths",
        "minbeds", "maxbeds", "maxdom", "minyear", "maxyear", "minacres", "maxacres",
        "minGarageSpaces", "maxGarageSpaces", "lastId", "postalCodes", "features",
        "exteriorFeatures", "water", "neighborhoods", "cities", "counties", "points",
        "idx", "include", "sort", "count",
    ],
);

/// Collects a `ParameterSet` from visitor input using one mapping table.
#[derive(Debug, Clone, Copy)]
pub struct ParamCollector {
    mapping: ParamMapping,
    options: CollectOptions,
}

impl ParamCollector {
    pub fn new(mapping: ParamMapping, options: CollectOptions) -> Self {
        Self { mapping, options }
    }

    pub fn listings(options: CollectOptions) -> Self {
        Self::new(LISTING_PARAMS, options)
    }

    pub fn open_houses(options: CollectOptions) -> Self {
        Self::new(OPEN_HOUSE_PARAMS, options)
    }

    pub fn analytics(options: CollectOptions) -> Self {
        Self::new(ANALYTICS_PARAMS, options)
    }

    /// Never fails: absent, empty and unmapped inputs are skipped.
    pub fn collect(&self, source: &QueryInput) -> ParameterSet {
        let mut params = ParameterSet::new();
        for (external, api_name) in self.mapping.entries() {
            let Some(raw) = source.get(&external) else {
                continue;
            };
            if raw.is_empty() {
                continue;
            }
            let value = match raw {
                ParamValue::Single(text) => split_value(text, self.options),
                ParamValue::List(items) => ParamValue::List(items.clone()),
            };
            params.merge(api_name, value);
        }
        params
    }
}

/// Sanitizes one visitor string and splits it on the list separators.
/// A value without separators stays a scalar.
pub fn split_value(raw: &str, options: CollectOptions) -> ParamValue {
    let text = sanitize_text(raw);
    if !LIST_SEPARATOR.is_match(&text) {
        return ParamValue::Single(text);
    }

    let tokens: Vec<String> = LIST_SEPARATOR
        .split(&text)
        .map(|t| if options.trim_tokens { t.trim() } else { t })
        .filter(|t| !options.trim_tokens || !t.is_empty())
        .map(str::to_string)
        .collect();

    match tokens.len() {
        1 => ParamValue::Single(tokens.into_iter().next().unwrap_or_default()),
        _ => ParamValue::List(tokens),
    }
}
