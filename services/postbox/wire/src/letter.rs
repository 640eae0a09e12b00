//! Letter data model.

use crate::kind::{ErrorVariant, Kind};
use bytes::Bytes;
use std::collections::HashMap;

/// Marker byte opening every letter
pub const LETTER_MARKER: u8 = b'=';
/// Separator between a param key and its value
pub const PARAM_SEPARATOR: u8 = b'=';
/// Line terminator for the kind line and param lines
pub const LINE_END: u8 = b'\n';
/// Terminator of the body
pub const BODY_END: u8 = 0;

/// One framed unit of exchange: kind, params and body.
///
/// ```text
/// =error.internal\n
/// key1=value1\n
/// key2=value2\n
/// \n
/// body\0
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Letter {
    /// Kind of the letter
    pub kind: Kind,
    /// Params, keys are unique and their order is irrelevant
    pub params: HashMap<String, String>,
    /// Raw body
    pub body: Bytes,
}

impl Letter {
    /// Create a letter with no params and an empty body
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            params: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Create an error letter with the given description as body
    pub fn error(variant: ErrorVariant, body: impl Into<Bytes>) -> Self {
        Self::new(Kind::Error(variant)).with_body(body)
    }

    /// Add or replace a param
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Replace the body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Value of a param
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Whether a param is present
    pub fn has_param(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Body as text, `None` if it is not valid UTF-8
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Whether every field can be framed without corruption.
    ///
    /// Keys must not contain `=` or newlines, values must not contain
    /// newlines, and the body must not contain NUL. Nothing is escaped on the
    /// wire, so a letter failing this check does not survive encoding.
    pub fn is_wire_safe(&self) -> bool {
        let kind_ok = self
            .kind
            .variant()
            .map_or(true, |variant| !variant.contains(&['.', '\n'][..]));
        let params_ok = self.params.iter().all(|(key, value)| {
            !key.is_empty() && !key.contains(&['=', '\n'][..]) && !value.contains('\n')
        });
        kind_ok && params_ok && !self.body.contains(&BODY_END)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::UserVariant;

    #[test]
    fn test_builder() {
        let letter = Letter::new(Kind::User(UserVariant::LogIn))
            .with_param("user_id", "bob")
            .with_param("password", "hunter2")
            .with_param("user_id", "alice");

        assert_eq!(letter.params.len(), 2);
        assert_eq!(letter.param("user_id"), Some("alice"));
        assert!(letter.has_param("password"));
        assert!(letter.body.is_empty());
    }

    #[test]
    fn test_error_letter() {
        let letter = Letter::error(ErrorVariant::TimedOut, "upstream took too long");
        assert_eq!(letter.kind, Kind::Error(ErrorVariant::TimedOut));
        assert_eq!(letter.body_str(), Some("upstream took too long"));
        assert!(letter.params.is_empty());
    }

    #[test]
    fn test_body_str_non_utf8() {
        let letter = Letter::new(Kind::Message).with_body(vec![0xc3, 0x28]);
        assert_eq!(letter.body_str(), None);
    }

    #[test]
    fn test_wire_safe() {
        let letter = Letter::new(Kind::Message)
            .with_param("name", "bob")
            .with_body("hello");
        assert!(letter.is_wire_safe());

        assert!(!letter.clone().with_param("a=b", "c").is_wire_safe());
        assert!(!letter.clone().with_param("", "c").is_wire_safe());
        assert!(!letter.clone().with_param("a", "line\nbreak").is_wire_safe());
        assert!(!letter.clone().with_body(&b"nul\0inside"[..]).is_wire_safe());
        assert!(!Letter::error(ErrorVariant::Other("a.b".into()), "x").is_wire_safe());
    }
}
