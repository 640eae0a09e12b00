//! Letter kind taxonomy.
//!
//! A kind is a closed set of categories, some of which carry a variant. The
//! canonical wire spelling is `category` or `category.variant`, and
//! [`Kind::parse`] is the exact inverse of the [`fmt::Display`] output.

use crate::error::KindError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Separator between category and variant on the kind line
pub const KIND_SEPARATOR: char = '.';

macro_rules! kind_variants {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal,)+
        }
    ) => {
        $(#[$meta])*
        ///
        /// Equality and hashing go by wire spelling, so `Other` holding an
        /// enumerated spelling is the same value as the named variant.
        #[derive(Debug, Clone)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// Variant outside the enumerated set, kept verbatim so the
            /// validator can report it
            Other(String),
        }

        impl $name {
            /// Wire spellings of every enumerated variant
            pub const KNOWN: &'static [&'static str] = &[$($wire),+];

            /// Map a wire spelling to a variant, never fails
            pub fn from_wire(value: &str) -> Self {
                match value {
                    $($wire => $name::$variant,)+
                    other => $name::Other(other.to_string()),
                }
            }

            /// Wire spelling of this variant
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Other(value) => value,
                }
            }

            /// Whether this is one of the enumerated variants
            pub fn is_known(&self) -> bool {
                Self::KNOWN.contains(&self.as_str())
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.as_str() == other.as_str()
            }
        }

        impl Eq for $name {}

        impl std::hash::Hash for $name {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                std::hash::Hash::hash(self.as_str(), state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

kind_variants! {
    /// Variants of the `error` category
    ErrorVariant {
        /// Internal failure on the sending side
        Internal => "internal",
        /// Caller is not allowed to perform the request
        AccessDenied => "access_denied",
        /// Request was malformed
        BadRequest => "bad_request",
        /// Request did not complete in time
        TimedOut => "timed_out",
        /// Application specific error, described in the body
        Custom => "custom",
    }
}

kind_variants! {
    /// Variants of the `user` category
    UserVariant {
        /// Register a new user
        Create => "create",
        /// Remove a user
        Delete => "delete",
        /// Authenticate, requires `user_id` and `password` params
        LogIn => "log_in",
        /// End the session
        LogOut => "log_out",
        /// Change user details
        Modify => "modify",
        /// Look a user up
        Query => "query",
        /// Ban a user
        Ban => "ban",
        /// Lift a ban
        Unban => "unban",
    }
}

kind_variants! {
    /// Variants of the `status` category
    StatusVariant {
        /// Peer came online
        Enter => "enter",
        /// Peer went offline
        Leave => "leave",
        /// Peer is idle
        Idle => "idle",
        /// Peer does not want to be disturbed
        DoNotDisturb => "do_not_disturb",
    }
}

/// Top-level kind discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Error report
    Error,
    /// User management command
    User,
    /// Presence update
    Status,
    /// Chat message
    Message,
    /// Delivery receipt
    Reciept,
    /// Unclassified letter
    Undefined,
}

impl Category {
    /// Every category in the taxonomy
    pub const ALL: [Category; 6] = [
        Category::Error,
        Category::User,
        Category::Status,
        Category::Message,
        Category::Reciept,
        Category::Undefined,
    ];

    /// Wire spelling of the category
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Error => "error",
            Category::User => "user",
            Category::Status => "status",
            Category::Message => "message",
            Category::Reciept => "reciept",
            Category::Undefined => "undefined",
        }
    }

    /// Look a category up by its wire spelling
    pub fn from_wire(value: &str) -> Option<Self> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
    }

    /// Whether a kind of this category must carry a variant
    pub fn requires_variant(self) -> bool {
        matches!(self, Category::Error | Category::User | Category::Status)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Letter kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `error.<variant>`
    Error(ErrorVariant),
    /// `user.<variant>`
    User(UserVariant),
    /// `status.<variant>`
    Status(StatusVariant),
    /// `message`
    Message,
    /// `reciept`
    Reciept,
    /// `undefined`
    Undefined,
}

impl Kind {
    /// Parse a kind line (without its trailing newline)
    pub fn parse(input: &str) -> Result<Self, KindError> {
        let mut parts = input.split(KIND_SEPARATOR);
        let head = parts.next().unwrap_or_default();
        let category = Category::from_wire(head)
            .ok_or_else(|| KindError::UnknownCategory(head.to_string()))?;
        let rest: Vec<&str> = parts.collect();

        match (category, rest.as_slice()) {
            (Category::Error, [variant]) => Ok(Kind::Error(ErrorVariant::from_wire(variant))),
            (Category::User, [variant]) => Ok(Kind::User(UserVariant::from_wire(variant))),
            (Category::Status, [variant]) => Ok(Kind::Status(StatusVariant::from_wire(variant))),
            (Category::Error | Category::User | Category::Status, _) => {
                Err(KindError::MissingVariant {
                    category: category.as_str(),
                })
            }
            (Category::Message, []) => Ok(Kind::Message),
            (Category::Reciept, []) => Ok(Kind::Reciept),
            (Category::Undefined, []) => Ok(Kind::Undefined),
            (Category::Message | Category::Reciept | Category::Undefined, rest) => {
                Err(KindError::UnexpectedVariant {
                    category: category.as_str(),
                    variant: rest.join("."),
                })
            }
        }
    }

    /// Category of this kind
    pub fn category(&self) -> Category {
        match self {
            Kind::Error(_) => Category::Error,
            Kind::User(_) => Category::User,
            Kind::Status(_) => Category::Status,
            Kind::Message => Category::Message,
            Kind::Reciept => Category::Reciept,
            Kind::Undefined => Category::Undefined,
        }
    }

    /// Wire spelling of the variant, if the category has one
    pub fn variant(&self) -> Option<&str> {
        match self {
            Kind::Error(variant) => Some(variant.as_str()),
            Kind::User(variant) => Some(variant.as_str()),
            Kind::Status(variant) => Some(variant.as_str()),
            Kind::Message | Kind::Reciept | Kind::Undefined => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category().as_str())?;
        if let Some(variant) = self.variant() {
            write!(f, "{}{}", KIND_SEPARATOR, variant)?;
        }
        Ok(())
    }
}

impl FromStr for Kind {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::parse(s)
    }
}

impl Serialize for Kind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Kind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Kind::parse(&raw).map_err(de::Error::custom)
    }
}
