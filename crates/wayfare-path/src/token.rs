//! Path template tokenizer
//!
//! Turns a declarative template like `/users/:id(\d+)?` into ordered
//! segments of typed tokens. A segment is one `/`-delimited portion of the
//! template and may hold several tokens (`/:id-:tab` is one segment with a
//! param, a static `-`, and a second param).

use crate::error::TemplateError;

/// One typed unit inside a segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text, matched verbatim (case-insensitively)
    Static { value: String },
    /// Named parameter with an optional inline pattern and modifiers
    Param {
        name: String,
        /// Inline pattern from `:name(...)`, verbatim
        pattern: Option<String>,
        optional: bool,
        repeatable: bool,
    },
}

impl Token {
    /// Static token helper, mostly for tests and fixtures
    pub fn stat(value: impl Into<String>) -> Self {
        Token::Static {
            value: value.into(),
        }
    }

    /// Plain required parameter helper
    pub fn param(name: impl Into<String>) -> Self {
        Token::Param {
            name: name.into(),
            pattern: None,
            optional: false,
            repeatable: false,
        }
    }
}

/// One `/`-delimited portion of a template
pub type Segment = Vec<Token>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Static,
    Param,
    ParamRegex,
    ParamRegexEnd,
    EscapeNext,
}

struct Scanner<'a> {
    path: &'a str,
    state: LexState,
    prev_state: LexState,
    segments: Vec<Segment>,
    /// Initialized by the first `/`; templates always start with one
    segment: Option<Segment>,
    buffer: String,
    custom: String,
}

impl<'a> Scanner<'a> {
    fn new(path: &'a str) -> Self {
        Scanner {
            path,
            state: LexState::Static,
            prev_state: LexState::Static,
            segments: Vec::new(),
            segment: None,
            buffer: String::new(),
            custom: String::new(),
        }
    }

    /// Flush the buffer as a token of the current segment. `terminator` is
    /// the character that ended the token; for params it carries the
    /// modifier (`*`, `+`, `?`) when one was present.
    fn flush_token(&mut self, terminator: char) -> Result<(), TemplateError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        match self.state {
            LexState::Static => {
                if let Some(segment) = self.segment.as_mut() {
                    segment.push(Token::Static {
                        value: std::mem::take(&mut self.buffer),
                    });
                }
            }
            LexState::Param | LexState::ParamRegex | LexState::ParamRegexEnd => {
                let Some(segment) = self.segment.as_mut() else {
                    return Err(TemplateError::Malformed {
                        path: self.path.to_string(),
                    });
                };

                // A repeatable param cannot follow other tokens in its segment
                if segment.len() > 1 && (terminator == '*' || terminator == '+') {
                    return Err(TemplateError::RepeatInCompoundSegment {
                        path: self.path.to_string(),
                    });
                }

                segment.push(Token::Param {
                    name: std::mem::take(&mut self.buffer),
                    pattern: if self.custom.is_empty() {
                        None
                    } else {
                        Some(self.custom.clone())
                    },
                    repeatable: terminator == '*' || terminator == '+',
                    optional: terminator == '*' || terminator == '?',
                });
            }
            LexState::EscapeNext => {
                return Err(TemplateError::Malformed {
                    path: self.path.to_string(),
                });
            }
        }

        Ok(())
    }

    fn finish_segment(&mut self) {
        if let Some(segment) = self.segment.take() {
            self.segments.push(segment);
        }
        self.segment = Some(Vec::new());
    }
}

/// Tokenizes a path template into segments
///
/// - `""` yields a single empty segment ("no additional path")
/// - `"/"` yields a single segment holding one empty static token (root)
/// - any other template must start with `/`
///
/// `:name` opens a parameter, `(...)` attaches an inline pattern, and a
/// trailing `*` / `+` / `?` marks it optional+repeatable / repeatable /
/// optional. A backslash escapes the next character.
///
/// # Examples
///
/// ```
/// use wayfare_path::{tokenize, Token};
///
/// let segments = tokenize("/users/:id").unwrap();
/// assert_eq!(segments.len(), 2);
/// assert_eq!(segments[0], vec![Token::stat("users")]);
/// assert_eq!(segments[1], vec![Token::param("id")]);
/// ```
pub fn tokenize(path: &str) -> Result<Vec<Segment>, TemplateError> {
    if path.is_empty() {
        return Ok(vec![Vec::new()]);
    }

    if path == "/" {
        return Ok(vec![vec![Token::stat("")]]);
    }

    if !path.starts_with('/') {
        return Err(TemplateError::MissingLeadingSlash {
            path: path.to_string(),
        });
    }

    let mut scanner = Scanner::new(path);
    let chars: Vec<char> = path.chars().collect();
    let mut index = 0;
    let mut ch = '\0';

    while index < chars.len() {
        ch = chars[index];
        index += 1;

        if ch == '\\' && scanner.state != LexState::ParamRegex {
            scanner.prev_state = scanner.state;
            scanner.state = LexState::EscapeNext;
            continue;
        }

        match scanner.state {
            LexState::Static => {
                if ch == '/' {
                    scanner.flush_token(ch)?;
                    scanner.finish_segment();
                } else if ch == ':' {
                    scanner.flush_token(ch)?;
                    scanner.state = LexState::Param;
                } else {
                    scanner.buffer.push(ch);
                }
            }
            LexState::EscapeNext => {
                scanner.buffer.push(ch);
                scanner.state = scanner.prev_state;
            }
            LexState::Param => {
                if ch == '(' {
                    scanner.state = LexState::ParamRegex;
                } else if ch.is_ascii_alphanumeric() || ch == '_' {
                    scanner.buffer.push(ch);
                } else {
                    scanner.flush_token(ch)?;
                    scanner.state = LexState::Static;

                    // anything but a modifier belongs to the next token
                    if ch != '*' && ch != '?' && ch != '+' {
                        index -= 1;
                    }
                }
            }
            LexState::ParamRegex => {
                if ch == ')' {
                    if scanner.custom.ends_with('\\') {
                        scanner.custom.pop();
                        scanner.custom.push(ch);
                    } else {
                        scanner.state = LexState::ParamRegexEnd;
                    }
                } else {
                    scanner.custom.push(ch);
                }
            }
            LexState::ParamRegexEnd => {
                scanner.flush_token(ch)?;
                scanner.state = LexState::Static;

                if ch != '*' && ch != '?' && ch != '+' {
                    index -= 1;
                }

                scanner.custom.clear();
            }
        }
    }

    if scanner.state == LexState::ParamRegex {
        return Err(TemplateError::UnclosedPattern {
            path: path.to_string(),
        });
    }

    scanner.flush_token(ch)?;
    if let Some(segment) = scanner.segment.take() {
        scanner.segments.push(segment);
    }

    Ok(scanner.segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom_param(name: &str, pattern: &str, optional: bool, repeatable: bool) -> Token {
        Token::Param {
            name: name.to_string(),
            pattern: Some(pattern.to_string()),
            optional,
            repeatable,
        }
    }

    #[test]
    fn test_tokenize_root_and_empty() {
        assert_eq!(tokenize("").unwrap(), vec![vec![]]);
        assert_eq!(tokenize("/").unwrap(), vec![vec![Token::stat("")]]);
    }

    #[test]
    fn test_tokenize_static() {
        assert_eq!(tokenize("/home").unwrap(), vec![vec![Token::stat("home")]]);
        assert_eq!(
            tokenize("/one/two/three").unwrap(),
            vec![
                vec![Token::stat("one")],
                vec![Token::stat("two")],
                vec![Token::stat("three")],
            ]
        );
    }

    #[test]
    fn test_tokenize_param() {
        assert_eq!(tokenize("/:id").unwrap(), vec![vec![Token::param("id")]]);
        assert_eq!(
            tokenize("/:id(\\d+)").unwrap(),
            vec![vec![custom_param("id", "\\d+", false, false)]]
        );
    }

    #[test]
    fn test_tokenize_param_with_static_suffix() {
        assert_eq!(
            tokenize("/:id(\\d+)hello").unwrap(),
            vec![vec![
                custom_param("id", "\\d+", false, false),
                Token::stat("hello"),
            ]]
        );
        assert_eq!(
            tokenize("/:id(\\d+)/hello").unwrap(),
            vec![
                vec![custom_param("id", "\\d+", false, false)],
                vec![Token::stat("hello")],
            ]
        );
    }

    #[test]
    fn test_tokenize_modifiers() {
        let optional = tokenize("/:id?").unwrap();
        assert_eq!(
            optional,
            vec![vec![Token::Param {
                name: "id".into(),
                pattern: None,
                optional: true,
                repeatable: false,
            }]]
        );

        let repeatable = tokenize("/:id+").unwrap();
        assert_eq!(
            repeatable,
            vec![vec![Token::Param {
                name: "id".into(),
                pattern: None,
                optional: false,
                repeatable: true,
            }]]
        );

        let both = tokenize("/:id*").unwrap();
        assert_eq!(
            both,
            vec![vec![Token::Param {
                name: "id".into(),
                pattern: None,
                optional: true,
                repeatable: true,
            }]]
        );

        assert_eq!(
            tokenize("/:id(\\d+)?").unwrap(),
            vec![vec![custom_param("id", "\\d+", true, false)]]
        );
    }

    #[test]
    fn test_tokenize_multi_param_segment() {
        assert_eq!(
            tokenize("/:one:two:three").unwrap(),
            vec![vec![
                Token::param("one"),
                Token::param("two"),
                Token::param("three"),
            ]]
        );
        assert_eq!(
            tokenize("/:one-:two").unwrap(),
            vec![vec![
                Token::param("one"),
                Token::stat("-"),
                Token::param("two"),
            ]]
        );
    }

    #[test]
    fn test_tokenize_escape() {
        // `\:` keeps the colon literal
        assert_eq!(tokenize("/\\:").unwrap(), vec![vec![Token::stat(":")]]);
    }

    #[test]
    fn test_tokenize_escaped_paren_in_pattern() {
        assert_eq!(
            tokenize("/:id(\\d\\))").unwrap(),
            vec![vec![custom_param("id", "\\d)", false, false)]]
        );
    }

    #[test]
    fn test_tokenize_requires_leading_slash() {
        assert!(matches!(
            tokenize("aaa"),
            Err(TemplateError::MissingLeadingSlash { .. })
        ));
    }

    #[test]
    fn test_tokenize_unclosed_pattern() {
        assert!(matches!(
            tokenize("/:id(\\d+"),
            Err(TemplateError::UnclosedPattern { .. })
        ));
    }

    #[test]
    fn test_tokenize_repeatable_in_compound_segment() {
        assert!(matches!(
            tokenize("/:a-:b+"),
            Err(TemplateError::RepeatInCompoundSegment { .. })
        ));
        // a leading static prefix is fine, the param is only the second token
        assert!(tokenize("/home-:id+").is_ok());
    }

    #[test]
    fn test_tokenize_trailing_slash_adds_empty_segment() {
        assert_eq!(
            tokenize("/home/").unwrap(),
            vec![vec![Token::stat("home")], vec![]]
        );
    }
}
