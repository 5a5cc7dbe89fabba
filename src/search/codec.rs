//! Translation between location query strings and [`SearchParams`].

use im::OrdMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

pub const PAGE_KEY: &str = "page";

/// A single search parameter value
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<String>),
}

impl ParamValue {
    /// Empty scalars and empty lists carry no search constraint
    pub fn is_empty(&self) -> bool {
        match self {
            ParamValue::Scalar(value) => value.is_empty(),
            ParamValue::List(values) => values.is_empty(),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            ParamValue::Scalar(value) => vec![value.as_str()],
            ParamValue::List(values) => values.iter().map(String::as_str).collect(),
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.values().into_iter().next()
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Scalar(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Scalar(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Scalar(value.to_string())
    }
}

impl<S: Into<String>> From<Vec<S>> for ParamValue {
    fn from(values: Vec<S>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}

pub type SearchParams = OrdMap<String, ParamValue>;

/// Build params from literal pairs
pub fn params<K, V, I>(pairs: I) -> SearchParams
where
    K: Into<String>,
    V: Into<ParamValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Drop every empty value. Idempotent.
pub fn clean_params(params: &SearchParams) -> SearchParams {
    params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Decode a location search string. Repeated keys collapse into a list.
pub fn parse_query(search: &str) -> SearchParams {
    let search = search.strip_prefix('?').unwrap_or(search);
    let mut query = SearchParams::new();
    for (key, value) in form_urlencoded::parse(search.as_bytes()) {
        let key = key.into_owned();
        let value = value.into_owned();
        let merged = match query.remove(&key) {
            None => ParamValue::Scalar(value),
            Some(ParamValue::Scalar(existing)) => ParamValue::List(vec![existing, value]),
            Some(ParamValue::List(mut existing)) => {
                existing.push(value);
                ParamValue::List(existing)
            }
        };
        query.insert(key, merged);
    }
    query
}

/// Parse a page value. Anything that is not a finite number >= 1 is rejected.
pub fn parse_page(value: &ParamValue) -> Option<u32> {
    let page = value.first()?.trim().parse::<f64>().ok()?;
    if !page.is_finite() || page < 1.0 {
        return None;
    }
    Some(page.floor().min(u32::MAX as f64) as u32)
}

/// Merge the location query over `previous`, strip canonical query keys that the
/// location no longer carries and split off the page number.
pub fn parse_params(
    location_search: &str,
    previous: &SearchParams,
    default_page: u32,
    query_keys: &[String],
) -> (SearchParams, u32) {
    let mut query = parse_query(location_search);
    query.remove(PAGE_KEY);

    let mut merged = previous.clone();
    merged.extend(query.clone());
    let mut merged = clean_params(&merged);
    let page = merged
        .remove(PAGE_KEY)
        .and_then(|value| parse_page(&value))
        .unwrap_or(default_page);

    for key in query_keys {
        if !query.contains_key(key) {
            merged.remove(key);
        }
    }
    (merged, page)
}

/// Canonical search string, `?`-prefixed. Empty params give an empty string.
pub fn format_query(params: &SearchParams) -> String {
    let params = clean_params(params);
    if params.is_empty() {
        return String::new();
    }
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params.iter() {
        for v in value.values() {
            serializer.append_pair(key, v);
        }
    }
    format!("?{}", serializer.finish())
}

/// The subset of `params` that defines a distinct search
pub fn primary_query(params: &SearchParams, query_keys: &[String]) -> SearchParams {
    query_keys
        .iter()
        .filter_map(|key| {
            params
                .get(key)
                .filter(|value| !value.is_empty())
                .map(|value| (key.clone(), value.clone()))
        })
        .collect()
}

pub fn with_page(params: &SearchParams, page: u32) -> SearchParams {
    params.update(PAGE_KEY.to_string(), ParamValue::from(page))
}

/// Every `filter*` entry as `(key, value)` pairs, lists expanded
pub fn active_filters(params: &SearchParams) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(key, _)| key.starts_with("filter"))
        .flat_map(|(key, value)| {
            value
                .values()
                .into_iter()
                .map(|v| (key.clone(), v.to_string()))
                .collect_vec()
        })
        .collect()
}

/// Build the requested params for a UI update: location query, then the stored
/// params, then the new values, each overriding the previous.
pub fn merge_update(
    location_search: &str,
    params: &SearchParams,
    new_params: &SearchParams,
) -> SearchParams {
    let mut merged = parse_query(location_search);
    merged.extend(params.clone());
    merged.extend(new_params.clone());
    merged
}
