use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use serde_json_path::JsonPath;

use super::{SelectionError, ValueType};

/// One step of a dotted selector path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// `name` — an object key, or an array index when applied to an array
    Field(String),
    /// `[n]` — an array index only
    Index(usize),
}

impl PathSegment {
    fn jsonpath(&self) -> String {
        match self {
            PathSegment::Field(name) => name.to_owned(),
            PathSegment::Index(i) => format!("[{i}]"),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.jsonpath())
    }
}

/// A value reached while walking a selector, with the route taken to reach it
#[derive(Debug, Clone, PartialEq)]
struct ValuePath<'a> {
    value: &'a Value,
    path: Vec<String>,
}

impl<'a> ValuePath<'a> {
    fn new(value: &'a Value) -> ValuePath<'a> {
        ValuePath {
            value,
            path: Vec::new(),
        }
    }

    fn jsonpath(&self) -> String {
        let mut jsonpath = String::from("$");
        for part in &self.path {
            if part.starts_with('[') {
                jsonpath.push_str(part);
            } else {
                jsonpath.push('.');
                jsonpath.push_str(part);
            }
        }
        jsonpath
    }

    fn child(&self, value: &'a Value, part: String) -> ValuePath<'a> {
        let mut path = self.path.to_vec();
        path.push(part);
        ValuePath { value, path }
    }

    fn index(&self, items: &'a [Value], index: usize) -> Result<ValuePath<'a>, SelectionError> {
        match items.get(index) {
            Some(value) => Ok(self.child(value, format!("[{index}]"))),
            None => Err(SelectionError::IndexOutOfBounds {
                index,
                len: items.len(),
                at: self.jsonpath(),
            }),
        }
    }

    fn step(&self, segment: &PathSegment) -> Result<ValuePath<'a>, SelectionError> {
        match (self.value, segment) {
            (Value::Object(map), PathSegment::Field(key)) => match map.get(key) {
                Some(value) => Ok(self.child(value, key.to_owned())),
                None => Err(SelectionError::MissingKey {
                    key: key.to_owned(),
                    at: self.jsonpath(),
                }),
            },
            (Value::Object(_), PathSegment::Index(index)) => Err(SelectionError::IndexIntoObject {
                index: *index,
                at: self.jsonpath(),
            }),
            (Value::Array(items), PathSegment::Field(name)) => {
                let index = parse_index(name).ok_or_else(|| SelectionError::NotAnIndex {
                    segment: name.to_owned(),
                    at: self.jsonpath(),
                })?;
                self.index(items, index)
            }
            (Value::Array(items), PathSegment::Index(index)) => self.index(items, *index),
            (Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_), segment) => {
                Err(SelectionError::NotAContainer {
                    segment: segment.to_string(),
                    found: self.value.value_type(),
                    at: self.jsonpath(),
                })
            }
        }
    }
}

/// Digits only: `usize::from_str` would also accept a leading `+`
fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// A parsed dot/bracket path such as `bitcoin.usd`, `items.0.name` or `[1].email`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorPath {
    pub segments: Vec<PathSegment>,
}

impl SelectorPath {
    pub fn parse(path: &str) -> Result<SelectorPath, SelectionError> {
        let invalid = |reason| SelectionError::InvalidPath {
            path: path.to_owned(),
            reason,
        };

        let mut segments = Vec::new();
        for part in path.split('.') {
            if part.is_empty() {
                return Err(invalid("empty segment"));
            }
            let (name, mut brackets) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };
            if !name.is_empty() {
                segments.push(PathSegment::Field(name.to_owned()));
            }
            while !brackets.is_empty() {
                let close = brackets.find(']').ok_or_else(|| invalid("unclosed '['"))?;
                let index = parse_index(&brackets[1..close])
                    .ok_or_else(|| invalid("bracket must hold a non-negative integer"))?;
                segments.push(PathSegment::Index(index));
                brackets = &brackets[close + 1..];
                if !brackets.is_empty() && !brackets.starts_with('[') {
                    return Err(invalid("unexpected text after ']'"));
                }
            }
        }
        Ok(SelectorPath { segments })
    }

    /// Walks the segments in order, stopping at the first mismatch
    pub fn resolve<'a>(&self, value: &'a Value) -> Result<&'a Value, SelectionError> {
        let mut current = ValuePath::new(value);
        for segment in &self.segments {
            current = current.step(segment)?;
        }
        log::trace!("selected {}", current.jsonpath());
        Ok(current.value)
    }
}

/// A compiled selector, parsed once per request
#[derive(Debug)]
pub enum Selector {
    /// Empty path: the input is returned unchanged
    Identity,
    Dotted(SelectorPath),
    /// `$`-prefixed RFC 9535 query; [`Selector::select`] needs exactly one match
    Query { path: String, query: JsonPath },
}

impl Selector {
    pub fn parse(path: &str) -> Result<Selector, SelectionError> {
        if path.is_empty() {
            Ok(Selector::Identity)
        } else if path.starts_with('$') {
            let query = JsonPath::parse(path)?;
            Ok(Selector::Query {
                path: path.to_owned(),
                query,
            })
        } else {
            Ok(Selector::Dotted(SelectorPath::parse(path)?))
        }
    }

    /// Narrows `value` to the selected sub-value without copying it
    pub fn select<'a>(&self, value: &'a Value) -> Result<&'a Value, SelectionError> {
        match self {
            Selector::Identity => Ok(value),
            Selector::Dotted(selector_path) => selector_path.resolve(value),
            Selector::Query { path, query } => {
                let mut nodes = query.query(value).all();
                match nodes.len() {
                    0 => Err(SelectionError::NoMatch {
                        path: path.to_owned(),
                    }),
                    1 => Ok(nodes.remove(0)),
                    count => Err(SelectionError::MultipleMatches {
                        path: path.to_owned(),
                        count,
                    }),
                }
            }
        }
    }

    /// Like [`Selector::select`], but a query matching several nodes yields
    /// an owned Array of the matches, in document order
    pub fn select_all<'a>(&self, value: &'a Value) -> Result<Cow<'a, Value>, SelectionError> {
        match self {
            Selector::Query { path, query } => {
                let mut nodes = query.query(value).all();
                match nodes.len() {
                    0 => Err(SelectionError::NoMatch {
                        path: path.to_owned(),
                    }),
                    1 => Ok(Cow::Borrowed(nodes.remove(0))),
                    count => {
                        log::debug!("{path} matched {count} nodes");
                        Ok(Cow::Owned(Value::Array(
                            nodes.into_iter().cloned().collect(),
                        )))
                    }
                }
            }
            Selector::Identity | Selector::Dotted(_) => self.select(value).map(Cow::Borrowed),
        }
    }
}

impl FromStr for Selector {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

/// Parses `path` (if any) and selects from `value` in one go
pub fn select<'a>(value: &'a Value, path: Option<&str>) -> Result<&'a Value, SelectionError> {
    match path {
        None => Ok(value),
        Some(path) => Selector::parse(path)?.select(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn empty_or_absent_path_is_identity() {
        let v = json!({"a": 1});
        assert_eq!(select(&v, None).unwrap(), &v);
        assert_eq!(select(&v, Some("")).unwrap(), &v);
        assert!(std::ptr::eq(select(&v, Some("")).unwrap(), &v));
    }

    #[test]
    fn nested_object_lookup() {
        let v = json!({"bitcoin": {"usd": 42000}});
        assert_eq!(select(&v, Some("bitcoin.usd")).unwrap(), &json!(42000));
    }

    #[test]
    fn dotted_array_index() {
        let v = json!({"a": [10, 20, 30]});
        assert_eq!(select(&v, Some("a.1")).unwrap(), &json!(20));
    }

    #[test]
    fn index_out_of_bounds() {
        let v = json!({"a": [10]});
        let err = select(&v, Some("a.5")).unwrap_err();
        assert!(matches!(
            err,
            SelectionError::IndexOutOfBounds { index: 5, len: 1, ref at } if at == "$.a"
        ));
    }

    #[test]
    fn bracket_indexes() {
        let v = json!([{"email": "a@x"}, {"email": "b@y"}]);
        assert_eq!(select(&v, Some("[1].email")).unwrap(), &json!("b@y"));

        let v = json!({"items": [[1, 2], [3, 4]]});
        assert_eq!(select(&v, Some("items[1][0]")).unwrap(), &json!(3));
    }

    #[test]
    fn numeric_field_is_an_object_key_on_objects() {
        let v = json!({"0": "zero"});
        assert_eq!(select(&v, Some("0")).unwrap(), &json!("zero"));
    }

    #[test]
    fn missing_key_reports_location() {
        let v = json!({"bitcoin": {"usd": 1}});
        let err = select(&v, Some("bitcoin.eur")).unwrap_err();
        assert_eq!(err.to_string(), "key 'eur' not found at $.bitcoin");
    }

    #[test]
    fn non_numeric_index_against_array() {
        let v = json!({"a": [1]});
        assert!(matches!(
            select(&v, Some("a.first")),
            Err(SelectionError::NotAnIndex { .. })
        ));
        assert!(matches!(
            select(&v, Some("a.+0")),
            Err(SelectionError::NotAnIndex { .. })
        ));
    }

    #[test]
    fn bracket_against_object_fails() {
        let v = json!({"a": {"0": 1}});
        assert!(matches!(
            select(&v, Some("a[0]")),
            Err(SelectionError::IndexIntoObject { index: 0, .. })
        ));
    }

    #[test]
    fn cannot_descend_into_scalars() {
        for v in [json!({"a": 1}), json!({"a": "s"}), json!({"a": null}), json!({"a": true})] {
            let err = select(&v, Some("a.b")).unwrap_err();
            assert!(matches!(err, SelectionError::NotAContainer { ref at, .. } if at == "$.a"));
        }
    }

    #[test]
    fn invalid_dotted_paths() {
        for path in ["a..b", ".a", "a.", "a[", "a[x]", "a[-1]", "a[0]b"] {
            assert!(
                matches!(
                    SelectorPath::parse(path),
                    Err(SelectionError::InvalidPath { .. })
                ),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn parse_segments() {
        let parsed = SelectorPath::parse("items[0][2].name.3").unwrap();
        assert_eq!(
            parsed.segments,
            vec![
                PathSegment::Field("items".to_string()),
                PathSegment::Index(0),
                PathSegment::Index(2),
                PathSegment::Field("name".to_string()),
                PathSegment::Field("3".to_string()),
            ]
        );
    }

    #[test]
    fn selection_does_not_mutate_input() {
        let v = json!({"a": [1, {"b": 2}]});
        let before = v.clone();
        let _ = select(&v, Some("a.1.b"));
        let _ = select(&v, Some("a.9"));
        assert_eq!(v, before);
    }

    #[test]
    fn jsonpath_query_single_match() {
        let v = json!({"first": {"second": [{"active": 1}, {"passive": 1}]}});
        let selector: Selector = "$.first.second[?@.active]".parse().unwrap();
        assert_eq!(selector.select(&v).unwrap(), &json!({"active": 1}));
    }

    #[test]
    fn jsonpath_query_no_match_and_multiple_matches() {
        let v = json!([{"email": "a"}, {"email": "b"}]);
        assert!(matches!(
            select(&v, Some("$[10].email")),
            Err(SelectionError::NoMatch { .. })
        ));
        let err = select(&v, Some("$[*].email")).unwrap_err();
        assert!(err.to_string().contains("more than one match"));
    }

    #[test]
    fn select_all_collects_multiple_matches() {
        let v = json!({"bitcoin": {"usd": 1}, "ethereum": {"usd": 2}});
        let selector = Selector::parse("$..usd").unwrap();
        assert!(matches!(
            selector.select(&v),
            Err(SelectionError::MultipleMatches { count: 2, .. })
        ));
        let selected = selector.select_all(&v).unwrap();
        assert!(matches!(selected, Cow::Owned(_)));
        assert_eq!(selected.as_ref(), &json!([1, 2]));
    }

    #[test]
    fn select_all_borrows_single_results() {
        let v = json!({"bitcoin": {"usd": 1}, "ethereum": {"usd": 2}});
        for path in ["", "bitcoin.usd", "$.bitcoin.usd"] {
            let selected = Selector::parse(path).unwrap().select_all(&v).unwrap();
            assert!(matches!(selected, Cow::Borrowed(_)), "{path}");
        }
        assert!(matches!(
            Selector::parse("$..eur").unwrap().select_all(&v),
            Err(SelectionError::NoMatch { .. })
        ));
        assert!(matches!(
            Selector::parse("bitcoin.eur").unwrap().select_all(&v),
            Err(SelectionError::MissingKey { .. })
        ));
    }

    #[test]
    fn jsonpath_query_parse_error() {
        assert!(matches!(
            Selector::parse("$/#$"),
            Err(SelectionError::Query(_))
        ));
    }
}
