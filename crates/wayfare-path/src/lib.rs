//! # Wayfare Path
//!
//! The path-matching engine behind the wayfare router:
//!
//! - **Tokenizer** for declarative templates (`/users/:id(\d+)/posts/:post?`)
//! - **Pattern compiler** producing an anchored, case-insensitive matcher
//!   with `parse`/`stringify` round-tripping
//! - **Specificity scoring** that deterministically ranks overlapping
//!   templates (static beats dynamic beats optional beats repeatable
//!   beats wildcard)
//!
//! ## Template syntax
//!
//! - Static segments: `/about`
//! - Params: `/:id`, with an inline pattern `/:id(\d+)`
//! - Modifiers: `?` optional, `+` repeatable, `*` optional + repeatable
//! - Compound segments: `/:year-:month`, `/v:major(\d+)`
//! - `\` escapes the next character
//!
//! ## Example
//!
//! ```
//! use wayfare_path::{parse_path_pattern, ParamValue};
//!
//! let pattern = parse_path_pattern("/docs/:chapters+").unwrap();
//!
//! let params = pattern.parse("/docs/intro/setup").unwrap();
//! assert_eq!(
//!     params.get("chapters"),
//!     Some(&ParamValue::from(vec!["intro", "setup"]))
//! );
//!
//! assert_eq!(pattern.stringify(&params).unwrap(), "/docs/intro/setup");
//! ```

mod error;
pub mod pattern;
pub mod score;
pub mod token;

pub use error::TemplateError;
pub use pattern::{parse_path_pattern, ParamKey, ParamValue, PathParams, PathPattern};
pub use score::compare_scores;
pub use token::{tokenize, Segment, Token};
