//! Structural validation of decoded letters.
//!
//! Rules by category:
//!
//! | category    | rules                                                   |
//! |-------------|---------------------------------------------------------|
//! | `error`     | known variant, non-empty body                           |
//! | `user`      | known variant; `log_in` needs `user_id` and `password`  |
//! | `status`    | known variant                                           |
//! | `message`   | non-empty body                                          |
//! | `reciept`   | none                                                    |
//! | `undefined` | none                                                    |
//!
//! Every failing rule is reported; checks never short-circuit.

use crate::error::{ValidationError, ValidationErrors};
use crate::kind::{Kind, UserVariant};
use crate::letter::Letter;

/// Params required by `user.log_in`
pub const LOG_IN_PARAMS: [&str; 2] = ["user_id", "password"];

/// Check a letter against the rules of its kind
pub fn validate(letter: &Letter) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let category = letter.kind.category().as_str();

    match &letter.kind {
        Kind::Error(variant) => {
            errors.record(ensure_known(category, variant.is_known(), variant.as_str()));
            errors.record(ensure_body_not_empty(letter));
        }
        Kind::User(variant) => {
            errors.record(ensure_known(category, variant.is_known(), variant.as_str()));
            if *variant == UserVariant::LogIn {
                for key in LOG_IN_PARAMS {
                    errors.record(ensure_contains_param(letter, key));
                }
            }
        }
        Kind::Status(variant) => {
            errors.record(ensure_known(category, variant.is_known(), variant.as_str()));
        }
        Kind::Message => errors.record(ensure_body_not_empty(letter)),
        Kind::Reciept | Kind::Undefined => {}
    }

    errors
}

impl Letter {
    /// Check the letter against the rules of its kind, see [`validate`]
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validate(self).into_result()
    }
}

fn ensure_known(category: &'static str, known: bool, value: &str) -> Result<(), ValidationError> {
    if known {
        Ok(())
    } else {
        Err(ValidationError::InvalidVariant {
            category,
            value: value.to_string(),
        })
    }
}

pub(crate) fn ensure_body_not_empty_bytes(body: &[u8]) -> Result<(), ValidationError> {
    if body.is_empty() {
        Err(ValidationError::BodyEmpty)
    } else {
        Ok(())
    }
}

fn ensure_body_not_empty(letter: &Letter) -> Result<(), ValidationError> {
    ensure_body_not_empty_bytes(&letter.body)
}

fn ensure_contains_param(letter: &Letter, key: &str) -> Result<(), ValidationError> {
    if letter.has_param(key) {
        Ok(())
    } else {
        Err(ValidationError::missing_param(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::read_letter;
    use crate::kind::{ErrorVariant, StatusVariant};

    fn decode(input: &[u8]) -> Letter {
        let mut source = input;
        read_letter(&mut source).unwrap()
    }

    #[test]
    fn test_valid_message() {
        let letter = decode(b"=message\nname=bob\n\nhello\x00");
        assert!(validate(&letter).is_empty());
        assert!(letter.validate().is_ok());
    }

    #[test]
    fn test_valid_error() {
        let letter = decode(b"=error.internal\n\nsomething broke\x00");
        assert!(validate(&letter).is_empty());
    }

    #[test]
    fn test_error_invalid_variant() {
        let letter = decode(b"=error.bogus\n\nX\x00");
        let errors = validate(&letter);
        assert_eq!(
            errors.as_slice(),
            &[ValidationError::InvalidVariant {
                category: "error",
                value: "bogus".to_string(),
            }]
        );
    }

    #[test]
    fn test_error_invalid_variant_and_empty_body() {
        let letter = Letter::new(Kind::Error(ErrorVariant::Other("bogus".into())));
        let errors = validate(&letter);
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors.as_slice()[0],
            ValidationError::InvalidVariant { category: "error", .. }
        ));
        assert_eq!(errors.as_slice()[1], ValidationError::BodyEmpty);
    }

    #[test]
    fn test_other_with_known_spelling_is_valid() {
        let letter = Letter::error(ErrorVariant::Other("internal".into()), "x");
        assert!(letter.validate().is_ok());

        let letter = Letter::new(Kind::User(UserVariant::Other("log_in".into())));
        assert_eq!(validate(&letter).len(), 2);
    }

    #[test]
    fn test_error_empty_body() {
        let letter = Letter::new(Kind::Error(ErrorVariant::Internal));
        assert_eq!(validate(&letter).as_slice(), &[ValidationError::BodyEmpty]);
    }

    #[test]
    fn test_log_in_missing_both_params() {
        let letter = decode(b"=user.log_in\n\n\x00");
        let errors = validate(&letter);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.as_slice(),
            &[
                ValidationError::MissingParam {
                    key: "user_id".to_string()
                },
                ValidationError::MissingParam {
                    key: "password".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_log_in_missing_one_param() {
        let letter = decode(b"=user.log_in\nuser_id=bob\n\n\x00");
        let errors = validate(&letter);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.as_slice()[0],
            ValidationError::MissingParam {
                key: "password".to_string()
            }
        );

        let letter = decode(b"=user.log_in\nuser_id=bob\npassword=x\n\n\x00");
        assert!(validate(&letter).is_empty());
    }

    #[test]
    fn test_other_user_variants_need_no_params() {
        for variant in UserVariant::KNOWN.iter().filter(|v| **v != "log_in") {
            let letter = Letter::new(Kind::User(UserVariant::from_wire(variant)));
            assert!(validate(&letter).is_empty(), "user.{variant}");
        }
    }

    #[test]
    fn test_user_invalid_variant() {
        let letter = decode(b"=user.promote\n\n\x00");
        let errors = validate(&letter).into_result().unwrap_err();
        assert_eq!(
            errors.to_string(),
            "letter kind \"user\" has invalid variant \"promote\""
        );
    }

    #[test]
    fn test_status_variants() {
        let letter = Letter::new(Kind::Status(StatusVariant::Leave));
        assert!(validate(&letter).is_empty());

        let letter = Letter::new(Kind::Status(StatusVariant::Other("away".into())));
        assert_eq!(validate(&letter).len(), 1);
    }

    #[test]
    fn test_message_empty_body() {
        let letter = Letter::new(Kind::Message).with_param("name", "bob");
        assert_eq!(validate(&letter).as_slice(), &[ValidationError::BodyEmpty]);
    }

    #[test]
    fn test_reciept_and_undefined_unconstrained() {
        assert!(validate(&Letter::new(Kind::Reciept)).is_empty());
        assert!(validate(&Letter::new(Kind::Undefined)).is_empty());
    }

    #[test]
    fn test_validate_is_idempotent() {
        let letter = decode(b"=user.log_in\n\n\x00");
        let before = letter.clone();
        assert_eq!(validate(&letter), validate(&letter));
        assert_eq!(letter, before);
    }
}
