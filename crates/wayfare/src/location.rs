//! Locations: resolved route locations, raw navigation requests, and the
//! URL plumbing shared by both.

use std::fmt;
use std::sync::Arc;

use wayfare_path::{ParamValue, PathParams};

use crate::history::HistoryState;
use crate::record::{RouteMeta, RouteRecord};

/// Query values share the shape of path params: a string or a list
pub type Query = PathParams;

/// One entry of a matched chain: the record plus its own template
/// re-stringified with the final parameter set
#[derive(Debug, Clone)]
pub struct MatchedRecord {
    pub record: Arc<RouteRecord>,
    pub resolved_path: String,
}

impl MatchedRecord {
    /// Identity comparison: two entries naming the same table node
    pub fn is(&self, other: &MatchedRecord) -> bool {
        Arc::ptr_eq(&self.record, &other.record)
    }
}

/// A fully resolved location: the outcome of matching a request against
/// the route table
#[derive(Debug, Clone)]
pub struct RouteLocation {
    /// Name of the deepest matched record, when it has one
    pub name: Option<String>,
    /// Matched path, base stripped
    pub path: String,
    /// Path plus query string and hash
    pub full_path: String,
    pub params: PathParams,
    pub query: Query,
    /// Includes the leading `#` when non-empty
    pub hash: String,
    /// Ancestor metadata merged root-to-leaf; leaf wins on conflicts
    pub meta: RouteMeta,
    /// Matched records root-to-leaf
    pub matched: Vec<MatchedRecord>,
    /// The location originally requested, when a redirect intervened
    pub redirected_from: Option<Arc<RouteLocation>>,
}

impl RouteLocation {
    /// The location every router starts at, before any navigation
    pub fn start() -> Self {
        RouteLocation {
            name: None,
            path: "/".to_string(),
            full_path: "/".to_string(),
            params: PathParams::new(),
            query: Query::new(),
            hash: String::new(),
            meta: RouteMeta::new(),
            matched: Vec::new(),
            redirected_from: None,
        }
    }
}

/// The three request shapes a navigation can take
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationSpec {
    /// Resolve by path (absolute, or relative to the current location)
    Path(String),
    /// Resolve through the name index
    Name(String),
    /// Re-resolve the current location with parameter overrides
    Relative,
}

/// A navigation request: target spec plus parameters, query, hash, and
/// the navigation options
#[derive(Debug, Clone)]
pub struct RawLocation {
    pub spec: LocationSpec,
    pub params: PathParams,
    pub query: Query,
    pub hash: String,
    /// Replace the current history entry instead of pushing
    pub replace: bool,
    /// Navigate even when the target equals the current location
    pub force: bool,
    /// Drop cached view instances of the target records before commit
    pub refresh: bool,
    /// State payload for the history entry
    pub state: Option<HistoryState>,
}

impl RawLocation {
    fn with_spec(spec: LocationSpec) -> Self {
        RawLocation {
            spec,
            params: PathParams::new(),
            query: Query::new(),
            hash: String::new(),
            replace: false,
            force: false,
            refresh: false,
            state: None,
        }
    }

    /// Request by path; `"/a/b?x=1#top"` style strings are split here
    pub fn path(path: impl Into<String>) -> Self {
        let raw: String = path.into();
        let (path, query, hash) = split_url(&raw);
        let mut location = RawLocation::with_spec(LocationSpec::Path(path));
        location.query = query;
        location.hash = hash;
        location
    }

    /// Request by route name
    pub fn named(name: impl Into<String>) -> Self {
        RawLocation::with_spec(LocationSpec::Name(name.into()))
    }

    /// Relative request: keep the current target, override params
    pub fn relative() -> Self {
        RawLocation::with_spec(LocationSpec::Relative)
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        let hash: String = hash.into();
        self.hash = if hash.is_empty() || hash.starts_with('#') {
            hash
        } else {
            format!("#{hash}")
        };
        self
    }

    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn with_state(mut self, state: HistoryState) -> Self {
        self.state = Some(state);
        self
    }

    /// Short description of the requested target, for error reporting
    pub(crate) fn describe(&self) -> String {
        match &self.spec {
            LocationSpec::Path(path) => format!("path {path:?}"),
            LocationSpec::Name(name) => format!("name {name:?}"),
            LocationSpec::Relative => "the current location".to_string(),
        }
    }
}

impl From<&str> for RawLocation {
    fn from(path: &str) -> Self {
        RawLocation::path(path)
    }
}

impl From<String> for RawLocation {
    fn from(path: String) -> Self {
        RawLocation::path(path)
    }
}

impl fmt::Display for RawLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Splits `path?query#hash` into its decoded parts; the hash keeps its
/// leading `#`
pub(crate) fn split_url(raw: &str) -> (String, Query, String) {
    let (without_hash, hash) = match raw.find('#') {
        Some(index) => (&raw[..index], decode_text(&raw[index..])),
        None => (raw, String::new()),
    };

    let (path, query) = match without_hash.find('?') {
        Some(index) => (
            &without_hash[..index],
            parse_query(&without_hash[index + 1..]),
        ),
        None => (without_hash, Query::new()),
    };

    (path.to_string(), query, hash)
}

/// Resolves a possibly relative path against the current location's path
///
/// `""` keeps the current path, `.` and `..` walk the hierarchy, and a
/// bare segment replaces the current leaf.
pub(crate) fn resolve_relative_path(to: &str, from: &str) -> String {
    if to.starts_with('/') {
        return to.to_string();
    }
    if to.is_empty() {
        return from.to_string();
    }

    let mut stack: Vec<&str> = from.split('/').collect();
    // drop the leaf; relative requests resolve against its parent
    stack.pop();
    if stack.is_empty() {
        stack.push("");
    }

    for segment in to.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            other => stack.push(other),
        }
    }

    let joined = stack.join("/");
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}

/// Removes a configured base prefix from a concrete path
pub(crate) fn strip_base(path: &str, base: &str) -> String {
    if base.is_empty() || base == "/" {
        return path.to_string();
    }

    match path.strip_prefix(base) {
        Some("") => "/".to_string(),
        Some(rest) => rest.to_string(),
        None => path.to_string(),
    }
}

/// Rebuilds `path?query#hash`
pub(crate) fn stringify_url(path: &str, query: &Query, hash: &str) -> String {
    let mut url = path.to_string();
    if !query.is_empty() {
        url.push('?');
        url.push_str(&stringify_query(query));
    }
    url.push_str(hash);
    url
}

/// Parses a query string into decoded key/value pairs; repeated keys
/// collect into a list
pub fn parse_query(search: &str) -> Query {
    let mut query = Query::new();

    for pair in search.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_text(key);
        let value = decode_text(value);

        match query.remove(&key) {
            None => {
                query.insert(key, ParamValue::Value(value));
            }
            Some(ParamValue::Value(first)) => {
                query.insert(key, ParamValue::List(vec![first, value]));
            }
            Some(ParamValue::List(mut items)) => {
                items.push(value);
                query.insert(key, ParamValue::List(items));
            }
        }
    }

    query
}

/// Renders a query map with sorted keys, percent-encoding both sides
pub fn stringify_query(query: &Query) -> String {
    let mut keys: Vec<&String> = query.keys().collect();
    keys.sort();

    let mut parts: Vec<String> = Vec::new();
    for key in keys {
        let encoded_key = encode_text(key);
        match &query[key] {
            ParamValue::Value(value) => parts.push(format!("{encoded_key}={}", encode_text(value))),
            ParamValue::List(items) => {
                for item in items {
                    parts.push(format!("{encoded_key}={}", encode_text(item)));
                }
            }
        }
    }

    parts.join("&")
}

/// Percent-decodes, tolerating malformed input by keeping it verbatim
pub(crate) fn decode_text(text: &str) -> String {
    match urlencoding::decode(text) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            tracing::warn!(text, %err, "keeping malformed percent-encoding verbatim");
            text.to_string()
        }
    }
}

pub(crate) fn encode_text(text: &str) -> String {
    urlencoding::encode(text).into_owned()
}

fn transform_value(value: &ParamValue, f: impl Fn(&str) -> String) -> ParamValue {
    match value {
        ParamValue::Value(value) => ParamValue::Value(f(value)),
        ParamValue::List(items) => ParamValue::List(items.iter().map(|item| f(item)).collect()),
    }
}

/// Percent-encodes every param value (before substituting into a path)
pub(crate) fn encode_params(params: &PathParams) -> PathParams {
    params
        .iter()
        .map(|(key, value)| (key.clone(), transform_value(value, encode_text)))
        .collect()
}

/// Percent-decodes every param value (after extracting from a path)
pub(crate) fn decode_params(params: &PathParams) -> PathParams {
    params
        .iter()
        .map(|(key, value)| (key.clone(), transform_value(value, decode_text)))
        .collect()
}

fn param_values_equal(a: &ParamValue, b: &ParamValue) -> bool {
    match (a, b) {
        (ParamValue::Value(a), ParamValue::Value(b)) => a == b,
        (ParamValue::List(a), ParamValue::List(b)) => a == b,
        // a single value and a one-element list are interchangeable
        (ParamValue::Value(value), ParamValue::List(items))
        | (ParamValue::List(items), ParamValue::Value(value)) => {
            items.len() == 1 && items[0] == *value
        }
    }
}

/// Key-by-key parameter equality, treating `"a"` and `["a"]` as equal
pub fn params_equal(a: &PathParams, b: &PathParams) -> bool {
    a.len() == b.len()
        && a.iter().all(|(key, value)| {
            b.get(key)
                .is_some_and(|other| param_values_equal(value, other))
        })
}

/// Value equality between two resolved locations: identical chain tail,
/// equal params, hash, and query
pub fn is_same_route_location(a: &RouteLocation, b: &RouteLocation) -> bool {
    let (Some(tail_a), Some(tail_b)) = (a.matched.last(), b.matched.last()) else {
        return false;
    };

    a.matched.len() == b.matched.len()
        && tail_a.is(tail_b)
        && a.hash == b.hash
        && params_equal(&a.params, &b.params)
        && params_equal(&a.query, &b.query)
}

/// Merges two optional state payloads; `over` wins field by field
pub(crate) fn merge_state(
    base: Option<HistoryState>,
    over: Option<HistoryState>,
) -> Option<HistoryState> {
    match (base, over) {
        (None, over) => over,
        (base, None) => base,
        (Some(base), Some(mut over)) => {
            if over.scroll.is_none() {
                over.scroll = base.scroll;
            }
            let mut extra = base.extra;
            extra.extend(over.extra);
            over.extra = extra;
            Some(over)
        }
    }
}

/// Records present in `from`'s chain but absent from `to`'s
pub(crate) fn leaving_records(to: &RouteLocation, from: &RouteLocation) -> Vec<MatchedRecord> {
    from.matched
        .iter()
        .filter(|record| !to.matched.iter().any(|entry| entry.is(record)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_url() {
        let (path, query, hash) = split_url("/users/7?tab=posts#bio");
        assert_eq!(path, "/users/7");
        assert_eq!(query.get("tab"), Some(&ParamValue::from("posts")));
        assert_eq!(hash, "#bio");

        let (path, query, hash) = split_url("/plain");
        assert_eq!(path, "/plain");
        assert!(query.is_empty());
        assert_eq!(hash, "");
    }

    #[test]
    fn test_resolve_relative_path() {
        assert_eq!(resolve_relative_path("/abs", "/a/b"), "/abs");
        assert_eq!(resolve_relative_path("", "/a/b"), "/a/b");
        assert_eq!(resolve_relative_path("c", "/a/b"), "/a/c");
        assert_eq!(resolve_relative_path("../c", "/a/b/d"), "/a/c");
        assert_eq!(resolve_relative_path("./c", "/a/b"), "/a/c");
        assert_eq!(resolve_relative_path("../../../x", "/a/b"), "/x");
        assert_eq!(resolve_relative_path("c", "/a"), "/c");
    }

    #[test]
    fn test_strip_base() {
        assert_eq!(strip_base("/app/users", "/app"), "/users");
        assert_eq!(strip_base("/app", "/app"), "/");
        assert_eq!(strip_base("/other", "/app"), "/other");
        assert_eq!(strip_base("/users", ""), "/users");
    }

    #[test]
    fn test_query_round_trip() {
        let query = parse_query("b=2&a=1&b=3&empty");
        assert_eq!(query.get("a"), Some(&ParamValue::from("1")));
        assert_eq!(query.get("b"), Some(&ParamValue::from(vec!["2", "3"])));
        assert_eq!(query.get("empty"), Some(&ParamValue::from("")));

        // sorted keys make the rendering deterministic
        assert_eq!(stringify_query(&query), "a=1&b=2&b=3&empty=");
    }

    #[test]
    fn test_query_encoding() {
        let query = parse_query("name=j%C3%BCrgen");
        assert_eq!(query.get("name"), Some(&ParamValue::from("jürgen")));
        assert_eq!(stringify_query(&query), "name=j%C3%BCrgen");
    }

    #[test]
    fn test_params_equal_flattens_single_lists() {
        let mut a = PathParams::new();
        a.insert("id".into(), ParamValue::from("x"));
        let mut b = PathParams::new();
        b.insert("id".into(), ParamValue::from(vec!["x"]));
        assert!(params_equal(&a, &b));

        b.insert("extra".into(), ParamValue::from("y"));
        assert!(!params_equal(&a, &b));
    }

    #[test]
    fn test_raw_location_from_str() {
        let raw = RawLocation::from("/users/7?tab=posts#bio");
        assert_eq!(raw.spec, LocationSpec::Path("/users/7".into()));
        assert_eq!(raw.query.get("tab"), Some(&ParamValue::from("posts")));
        assert_eq!(raw.hash, "#bio");
        assert!(!raw.replace);
    }
}
