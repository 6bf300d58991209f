use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable classification.
/// `class` says what went wrong, `origin` says which layer noticed it.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a configuration error (bad descriptor, unknown name, unsupported operator).
    pub fn configuration(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Configuration, origin, message)
    }

    /// Construct a query-origin translation error.
    pub fn query_translation(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Translation, ErrorOrigin::Query, message)
    }

    /// Construct a query-origin configuration error.
    pub fn query_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Configuration, ErrorOrigin::Query, message)
    }

    /// Construct a codec-origin mapping error for one entity attribute.
    pub fn codec_mapping(entity: &str, attribute: &str, message: impl fmt::Display) -> Self {
        Self::new(
            ErrorClass::Mapping,
            ErrorOrigin::Codec,
            format!("cannot map attribute [{attribute}] of entity {entity}: {message}"),
        )
    }

    /// Construct a serialization error naming the offending attribute.
    pub fn serialization(entity: &str, attribute: &str, message: impl fmt::Display) -> Self {
        Self::new(
            ErrorClass::Serialization,
            ErrorOrigin::Serialize,
            format!("attribute [{attribute}] of entity {entity}: {message}"),
        )
    }

    /// Construct a store-origin failure.
    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Store, ErrorOrigin::Store, message)
    }

    /// Construct a relation-origin configuration error.
    pub fn relation_configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Configuration, ErrorOrigin::Relation, message)
    }

    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.class, ErrorClass::Configuration)
    }

    #[must_use]
    pub const fn is_translation(&self) -> bool {
        matches!(self.class, ErrorClass::Translation)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
///
/// NotFound and broken references are deliberately absent: a missing record
/// is `Ok(None)` and a dangling reference is reported inside the result.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Configuration,
    Translation,
    Mapping,
    Serialization,
    Store,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Configuration => "configuration",
            Self::Translation => "translation",
            Self::Mapping => "mapping",
            Self::Serialization => "serialization",
            Self::Store => "store",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Codec,
    Config,
    Client,
    Model,
    Query,
    Relation,
    Serialize,
    Store,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Codec => "codec",
            Self::Config => "config",
            Self::Client => "client",
            Self::Model => "model",
            Self::Query => "query",
            Self::Relation => "relation",
            Self::Serialize => "serialize",
            Self::Store => "store",
        };
        write!(f, "{label}")
    }
}
