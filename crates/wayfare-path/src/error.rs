//! Errors raised while tokenizing, compiling, or stringifying templates

use thiserror::Error;

/// Failure while turning a path template into a matcher, or while
/// rebuilding a path from parameter values
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Every non-empty template must start with `/`
    #[error("route path must start with '/': {path:?}")]
    MissingLeadingSlash { path: String },

    /// An inline `(...)` pattern was never closed
    #[error("unclosed custom pattern group in route path {path:?}")]
    UnclosedPattern { path: String },

    /// A `*`/`+` param shared its segment with earlier tokens
    #[error("a repeatable parameter must lead its segment: {path:?}")]
    RepeatInCompoundSegment { path: String },

    /// The template could not be scanned at all (e.g. a dangling escape)
    #[error("route template {path:?} could not be parsed")]
    Malformed { path: String },

    /// An inline param pattern failed to compile on its own
    #[error("pattern {pattern:?} of param {name:?} is not a valid regular expression")]
    InvalidParamPattern {
        name: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The assembled matcher failed to compile
    #[error("compiled matcher {pattern:?} is not a valid regular expression")]
    PatternCompile {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A bare `*` template; catch-alls must be spelled as a wildcard param
    #[error("a bare '*' path cannot be registered; use a parameter with an explicit wildcard pattern such as ':rest(.*)'")]
    BareWildcard,

    /// `stringify` was given no (or an empty) value for a required param
    #[error("missing value for required parameter {name:?}")]
    MissingRequiredParam { name: String },

    /// `stringify` was given a list for a non-repeatable param
    #[error("parameter {name:?} is not repeatable and cannot take a list value")]
    UnexpectedListValue { name: String },
}
