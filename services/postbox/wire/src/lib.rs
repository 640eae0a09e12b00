//! Letter envelope codec: kind taxonomy, framing, encoding and validation.
//!
//! A letter is the unit peers exchange over a byte stream. This crate turns a
//! buffered byte source into [`Letter`]s, writes letters back to any
//! [`std::io::Write`], and checks them against per-kind structural rules.
//! Transport, dispatch and authentication live elsewhere.
//!
//! ## Features
//!
//! - **Closed Kind Taxonomy**: `error`, `user`, `status`, `message`,
//!   `reciept` and `undefined`, with stable canonical spellings
//! - **Single-Pass Decoding**: one byte of lookahead, positional errors
//! - **Deterministic Encoding**: sorted or arbitrary param order
//! - **Aggregated Validation**: every defect of a letter in one report
//! - **Legacy Format**: header-only messages without a kind line
//!
//! ## Wire Format
//!
//! ```text
//! +----------------------+----------------------------+
//! | '='                  | letter marker              |
//! +----------------------+----------------------------+
//! | kind line            | category[.variant] '\n'    |
//! +----------------------+----------------------------+
//! | param lines          | key '=' value '\n' (0..N)  |
//! +----------------------+----------------------------+
//! | '\n'                 | end of params              |
//! +----------------------+----------------------------+
//! | body                 | any bytes except NUL       |
//! +----------------------+----------------------------+
//! | NUL                  | end of letter              |
//! +----------------------+----------------------------+
//! ```
//!
//! ## Example
//!
//! ```rust
//! use letter_wire::{read_letter, Kind, Letter};
//!
//! let letter = Letter::new(Kind::Message)
//!     .with_param("name", "bob")
//!     .with_body("hello");
//! let bytes = letter.to_bytes_sorted();
//! assert_eq!(&bytes[..], b"=message\nname=bob\n\nhello\0");
//!
//! let mut source: &[u8] = &bytes;
//! let decoded = read_letter(&mut source).unwrap();
//! assert_eq!(decoded, letter);
//! assert!(decoded.validate().is_ok());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decode;
pub mod encode;
pub mod error;
pub mod kind;
pub mod legacy;
pub mod letter;
pub mod source;
pub mod validate;

// Re-export main types
pub use decode::{read_letter, Decode, LetterReader};
pub use encode::ParamOrder;
pub use error::{DecodeError, ErrorClass, KindError, ValidationError, ValidationErrors};
pub use kind::{Category, ErrorVariant, Kind, StatusVariant, UserVariant, KIND_SEPARATOR};
pub use legacy::{read_legacy_message, LegacyMessage};
pub use letter::{Letter, BODY_END, LETTER_MARKER, LINE_END, PARAM_SEPARATOR};
pub use source::ByteSource;
pub use validate::{validate, LOG_IN_PARAMS};
