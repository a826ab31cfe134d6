use crate::{error::ErrorClass, model::ClassDeclaration, value::Value};
use std::any::Any;
use thiserror::Error as ThisError;

///
/// DomainObject
///
/// Explicit member surface a domain type exposes to the engine.
/// Properties are read and written by name; methods are invoked by name.
///

pub trait DomainObject: Any + Send + Sync {
    fn get(&self, name: &str) -> Result<Value, MemberError>;

    fn set(&mut self, name: &str, value: Value) -> Result<(), MemberError>;

    fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value, MemberError> {
        let _ = args;
        Err(MemberError::Unknown(name.to_string()))
    }

    /// Domain-level validation run before a save. Every problem is reported.
    fn check_consistency(&self) -> Result<(), Vec<String>> {
        Ok(())
    }
}

///
/// Declare
///
/// Static declaration of a domain type's structure.
///

pub trait Declare: DomainObject + Sized {
    fn declaration() -> ClassDeclaration;
}

///
/// MemberError
///
/// Failure reported by a domain object while serving a member call.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MemberError {
    #[error("no member named '{0}'")]
    Unknown(String),

    #[error("member '{member}' cannot accept a value of kind {actual}")]
    InvalidValue { member: String, actual: String },

    #[error("{0}")]
    Rejected(String),
}

impl MemberError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Unknown(_) | Self::InvalidValue { .. } => ErrorClass::Argument,
            Self::Rejected(_) => ErrorClass::Domain,
        }
    }

    /// Read a positional argument, failing when it is absent.
    pub fn argument(args: &[Value], index: usize, method: &str) -> Result<Value, Self> {
        args.get(index).cloned().ok_or_else(|| Self::InvalidValue {
            member: format!("{method}[{index}]"),
            actual: "missing".to_string(),
        })
    }
}
