//! Pattern compiler
//!
//! Compiles tokenized segments into an executable matcher: an anchored,
//! case-insensitive regular expression tolerant of one trailing slash,
//! plus the per-segment specificity scores, the ordered parameter keys,
//! and the `parse` / `stringify` pair.

use std::cmp::Ordering;
use std::collections::HashMap;

use regex::{Regex, RegexBuilder};

use crate::error::TemplateError;
use crate::score;
use crate::token::{tokenize, Segment, Token};

/// Character class used when a param carries no inline pattern
const DEFAULT_PARAM_CLASS: &str = "[^/]+?";

/// A single parameter value: one string, or a list for repeatable params
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Value(String),
    List(Vec<String>),
}

impl ParamValue {
    /// The value rendered as path text; lists join with `/`
    pub fn text(&self) -> String {
        match self {
            ParamValue::Value(value) => value.clone(),
            ParamValue::List(items) => items.join("/"),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ParamValue::Value(value) => value.is_empty(),
            ParamValue::List(items) => items.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Value(value) => Some(value),
            ParamValue::List(_) => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Value(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Value(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(items: Vec<String>) -> Self {
        ParamValue::List(items)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(items: Vec<&str>) -> Self {
        ParamValue::List(items.into_iter().map(str::to_string).collect())
    }
}

/// Parameters extracted from (or substituted into) a path
pub type PathParams = HashMap<String, ParamValue>;

/// Ordered descriptor of one capture key of a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamKey {
    pub name: String,
    pub optional: bool,
    pub repeatable: bool,
}

/// A compiled path template
#[derive(Debug, Clone)]
pub struct PathPattern {
    regex: Regex,
    score: Vec<Vec<i32>>,
    keys: Vec<ParamKey>,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compiles tokenized segments into a matcher
    pub fn compile(segments: Vec<Segment>) -> Result<Self, TemplateError> {
        let mut score: Vec<Vec<i32>> = Vec::with_capacity(segments.len());
        let mut pattern = String::from("^");
        let mut keys: Vec<ParamKey> = Vec::new();

        for segment in &segments {
            let mut segment_scores: Vec<i32> = if segment.is_empty() {
                vec![score::ROOT]
            } else {
                Vec::new()
            };

            for (index, token) in segment.iter().enumerate() {
                let mut token_score = score::TOKEN;

                match token {
                    Token::Static { value } => {
                        if index == 0 {
                            pattern.push('/');
                        }
                        pattern.push_str(&regex::escape(value));
                        token_score += score::STATIC;
                    }
                    Token::Param {
                        name,
                        pattern: custom,
                        optional,
                        repeatable,
                    } => {
                        keys.push(ParamKey {
                            name: name.clone(),
                            optional: *optional,
                            repeatable: *repeatable,
                        });

                        let class = custom.as_deref().unwrap_or(DEFAULT_PARAM_CLASS);

                        if class != DEFAULT_PARAM_CLASS {
                            token_score += score::CUSTOM_REGEXP;

                            // validate the inline pattern in isolation
                            Regex::new(&format!("({class})")).map_err(|source| {
                                TemplateError::InvalidParamPattern {
                                    name: name.clone(),
                                    pattern: class.to_string(),
                                    source,
                                }
                            })?;
                        }

                        let mut group = if *repeatable {
                            format!("((?:{class})(?:/(?:{class}))*)")
                        } else {
                            format!("({class})")
                        };

                        if index == 0 {
                            // a lone optional param absorbs its own slash
                            group = if *optional && segment.len() < 2 {
                                format!("(?:/{group})")
                            } else {
                                format!("/{group}")
                            };
                        }

                        if *optional {
                            group.push('?');
                        }

                        pattern.push_str(&group);

                        token_score += score::DYNAMIC;
                        if *optional {
                            token_score += score::OPTIONAL;
                        }
                        if *repeatable {
                            token_score += score::REPEATABLE;
                        }
                        if class == ".*" {
                            token_score += score::WILD_CARD;
                        }
                    }
                }

                segment_scores.push(token_score);
            }

            score.push(segment_scores);
        }

        pattern.push_str("/?$");

        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| TemplateError::PatternCompile { pattern, source })?;

        Ok(PathPattern {
            regex,
            score,
            keys,
            segments,
        })
    }

    /// Whether the matcher accepts the path at all
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Extracts parameters from a concrete path
    ///
    /// Returns `None` when the path does not match; callers must not
    /// conflate that with `Some` of an empty map, which a parameterless
    /// template produces for its own path.
    pub fn parse(&self, path: &str) -> Option<PathParams> {
        let captures = self.regex.captures(path)?;
        let mut params = PathParams::new();

        for (index, key) in self.keys.iter().enumerate() {
            let value = captures
                .get(index + 1)
                .map(|group| group.as_str())
                .unwrap_or("");

            let value = if !value.is_empty() && key.repeatable {
                ParamValue::List(value.split('/').map(str::to_string).collect())
            } else {
                ParamValue::Value(value.to_string())
            };

            params.insert(key.name.clone(), value);
        }

        Some(params)
    }

    /// Rebuilds a concrete path from parameter values
    ///
    /// An empty optional param that is the sole token of its segment
    /// collapses the segment together with its leading slash.
    pub fn stringify(&self, params: &PathParams) -> Result<String, TemplateError> {
        let mut result = String::new();
        let mut hold_slash = false;

        for segment in &self.segments {
            if !hold_slash || !result.ends_with('/') {
                result.push('/');
            }
            hold_slash = false;

            for token in segment {
                match token {
                    Token::Static { value } => result.push_str(value),
                    Token::Param {
                        name,
                        optional,
                        repeatable,
                        ..
                    } => {
                        let text = match params.get(name) {
                            Some(ParamValue::List(items)) => {
                                if !repeatable {
                                    return Err(TemplateError::UnexpectedListValue {
                                        name: name.clone(),
                                    });
                                }
                                items.join("/")
                            }
                            Some(ParamValue::Value(value)) => value.clone(),
                            None => String::new(),
                        };

                        if text.is_empty() {
                            if *optional {
                                if segment.len() < 2 {
                                    if result.ends_with('/') {
                                        result.pop();
                                    } else {
                                        hold_slash = true;
                                    }
                                }
                            } else {
                                return Err(TemplateError::MissingRequiredParam {
                                    name: name.clone(),
                                });
                            }
                        }

                        result.push_str(&text);
                    }
                }
            }
        }

        if result.is_empty() {
            Ok("/".to_string())
        } else {
            Ok(result)
        }
    }

    /// Per-segment specificity score vectors
    pub fn score(&self) -> &[Vec<i32>] {
        &self.score
    }

    /// Ordered parameter keys
    pub fn keys(&self) -> &[ParamKey] {
        &self.keys
    }

    /// The compiled expression, mainly for diagnostics
    pub fn as_regex_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Ranks two compiled patterns by specificity; `Less` sorts `a` first
    pub fn compare(a: &PathPattern, b: &PathPattern) -> Ordering {
        score::compare_scores(&a.score, &b.score)
    }
}

/// Tokenizes and compiles a template in one step
///
/// # Examples
///
/// ```
/// use wayfare_path::{parse_path_pattern, ParamValue};
///
/// let pattern = parse_path_pattern("/users/:id").unwrap();
/// let params = pattern.parse("/users/7").unwrap();
/// assert_eq!(params.get("id"), Some(&ParamValue::Value("7".into())));
/// assert_eq!(pattern.stringify(&params).unwrap(), "/users/7");
/// ```
pub fn parse_path_pattern(path: &str) -> Result<PathPattern, TemplateError> {
    PathPattern::compile(tokenize(path)?)
}
