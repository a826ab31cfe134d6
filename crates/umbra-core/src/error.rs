use crate::{
    config::ConfigError,
    traits::MemberError,
    types::ObserverId,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Structured runtime error with a stable classification.
/// Every public operation of the engine reports failures through this type.
///

#[derive(Clone, Debug, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    pub detail: Option<ErrorDetail>,
}

impl Error {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct an error carrying a structured detail payload.
    pub fn with_detail(
        class: ErrorClass,
        origin: ErrorOrigin,
        message: impl Into<String>,
        detail: ErrorDetail,
    ) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: Some(detail),
        }
    }

    /// Construct an unknown-member argument error.
    pub(crate) fn unknown_member(origin: ErrorOrigin, owner: &str, member: &str) -> Self {
        ArgumentError::UnknownMember {
            owner: owner.to_string(),
            member: member.to_string(),
        }
        .into_error(origin)
    }

    /// Construct a not-found error for an object that is no longer alive.
    pub(crate) fn stale_instance(origin: ErrorOrigin, observer: ObserverId) -> Self {
        Self::new(
            ErrorClass::NotFound,
            origin,
            format!("observer {observer} is no longer bound to a live instance"),
        )
    }

    pub(crate) fn observer_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Observer,
            message,
        )
    }

    pub(crate) fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Persistence, ErrorOrigin::Persistence, message)
    }

    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.class, ErrorClass::Configuration)
    }

    #[must_use]
    pub const fn is_argument(&self) -> bool {
        matches!(self.class, ErrorClass::Argument)
    }

    #[must_use]
    pub const fn is_consistency(&self) -> bool {
        matches!(self.class, ErrorClass::Consistency)
    }

    /// Every aggregated consistency failure message, if this is a consistency error.
    #[must_use]
    pub fn consistency_failures(&self) -> &[String] {
        match &self.detail {
            Some(ErrorDetail::Consistency(ConsistencyError::Failed { failures })) => failures,
            _ => &[],
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, class-specific error detail carried by [`Error`].
///

#[derive(Clone, Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Configuration(ConfigurationError),

    #[error("{0}")]
    Argument(ArgumentError),

    #[error("{0}")]
    Consistency(ConsistencyError),

    #[error("{0}")]
    Member(MemberError),

    #[error("{0}")]
    Config(ConfigError),
}

///
/// ConfigurationError
///
/// Contradictory or duplicate metadata detected while building a template.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConfigurationError {
    #[error("cannot have multiple configurations for class {class}")]
    DuplicateClassConfiguration { class: String },

    #[error("cannot have multiple configurations for property {class}.{property}")]
    DuplicatePropertyConfiguration { class: String, property: String },

    #[error("cannot have multiple configurations for method {class}.{method}")]
    DuplicateMethodConfiguration { class: String, method: String },

    #[error("cannot have multiple configurations for parameter {class}.{method}({parameter})")]
    DuplicateParameterConfiguration {
        class: String,
        method: String,
        parameter: String,
    },

    #[error("{owner} declares '{attribute}' more than once with conflicting values")]
    ConflictingAttribute { owner: String, attribute: String },

    #[error("{owner} declares member '{member}' more than once")]
    DuplicateMember { owner: String, member: String },

    #[error("configuration targets unknown member {owner}.{member}")]
    UnknownConfiguredMember { owner: String, member: String },

    #[error("{owner} declares more than one {role} property")]
    AmbiguousTrackingProperty { owner: String, role: String },
}

impl ConfigurationError {
    #[must_use]
    pub const fn class() -> ErrorClass {
        ErrorClass::Configuration
    }

    pub(crate) fn into_error(self, origin: ErrorOrigin) -> Error {
        Error::with_detail(
            Self::class(),
            origin,
            self.to_string(),
            ErrorDetail::Configuration(self),
        )
    }
}

impl From<ConfigurationError> for Error {
    fn from(err: ConfigurationError) -> Self {
        err.into_error(ErrorOrigin::Template)
    }
}

///
/// ArgumentError
///
/// Rejected request, raised before any mutation of the object graph.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ArgumentError {
    #[error("{owner} has no member named '{member}'")]
    UnknownMember { owner: String, member: String },

    #[error("required parameters are missing for {method}: {}", missing.join(", "))]
    MissingParameters { method: String, missing: Vec<String> },

    #[error("{owner}.{member} expects {expected}, received {actual}")]
    KindMismatch {
        owner: String,
        member: String,
        expected: String,
        actual: String,
    },

    #[error("{owner}.{member} expects {expected} arguments, received {actual}")]
    ArityMismatch {
        owner: String,
        member: String,
        expected: usize,
        actual: usize,
    },

    #[error("{owner}.{member} is not readable")]
    NotReadable { owner: String, member: String },

    #[error("{owner}.{member} is not writable")]
    NotWritable { owner: String, member: String },

    #[error("{type_name} cannot be created")]
    NotCreatable { type_name: String },

    #[error("expected {expected}, found {actual}")]
    UnexpectedObserver { expected: String, actual: String },
}

impl ArgumentError {
    #[must_use]
    pub const fn class() -> ErrorClass {
        ErrorClass::Argument
    }

    pub(crate) fn into_error(self, origin: ErrorOrigin) -> Error {
        Error::with_detail(
            Self::class(),
            origin,
            self.to_string(),
            ErrorDetail::Argument(self),
        )
    }
}

impl From<ArgumentError> for Error {
    fn from(err: ArgumentError) -> Self {
        err.into_error(ErrorOrigin::Command)
    }
}

///
/// ConsistencyError
///
/// Aggregated result of a failed consistency check over a save set.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ConsistencyError {
    #[error("consistency check failed with {} problem(s): {}", failures.len(), failures.join("; "))]
    Failed { failures: Vec<String> },
}

impl From<ConsistencyError> for Error {
    fn from(err: ConsistencyError) -> Self {
        Self::with_detail(
            ErrorClass::Consistency,
            ErrorOrigin::Command,
            err.to_string(),
            ErrorDetail::Consistency(err),
        )
    }
}

impl From<MemberError> for Error {
    fn from(err: MemberError) -> Self {
        Self::with_detail(
            err.class(),
            ErrorOrigin::Domain,
            err.to_string(),
            ErrorDetail::Member(err),
        )
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::with_detail(
            ErrorClass::Configuration,
            ErrorOrigin::Config,
            err.to_string(),
            ErrorDetail::Config(err),
        )
    }
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Configuration,
    Argument,
    Consistency,
    IdentityAnomaly,
    NotFound,
    Domain,
    Persistence,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Configuration => "configuration",
            Self::Argument => "argument",
            Self::Consistency => "consistency",
            Self::IdentityAnomaly => "identity_anomaly",
            Self::NotFound => "not_found",
            Self::Domain => "domain",
            Self::Persistence => "persistence",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Config,
    Template,
    Attribute,
    Cache,
    Observer,
    Tracker,
    Proxy,
    Command,
    Persistence,
    Domain,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Config => "config",
            Self::Template => "template",
            Self::Attribute => "attribute",
            Self::Cache => "cache",
            Self::Observer => "observer",
            Self::Tracker => "tracker",
            Self::Proxy => "proxy",
            Self::Command => "command",
            Self::Persistence => "persistence",
            Self::Domain => "domain",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_converts_with_template_origin() {
        let err: Error = ConfigurationError::DuplicatePropertyConfiguration {
            class: "Customer".to_string(),
            property: "name".to_string(),
        }
        .into();

        assert!(err.is_configuration());
        assert_eq!(err.origin, ErrorOrigin::Template);
        assert_eq!(
            err.message,
            "cannot have multiple configurations for property Customer.name"
        );
    }

    #[test]
    fn consistency_error_keeps_every_failure() {
        let err: Error = ConsistencyError::Failed {
            failures: vec!["a is required".to_string(), "b is too long".to_string()],
        }
        .into();

        assert!(err.is_consistency());
        assert_eq!(err.consistency_failures().len(), 2);
        assert_eq!(
            err.display_with_class(),
            "command:consistency: consistency check failed with 2 problem(s): a is required; b is too long"
        );
    }

    #[test]
    fn missing_parameters_lists_names() {
        let err = ArgumentError::MissingParameters {
            method: "Customer.rename".to_string(),
            missing: vec!["first".to_string(), "last".to_string()],
        };

        assert_eq!(
            err.to_string(),
            "required parameters are missing for Customer.rename: first, last"
        );
    }
}
