use crate::{error::Error, tracking::Modifications};

///
/// ActionResult
///
/// Outcome of a command. A failed result carries every message the caller
/// should see together with the underlying error.
///

#[derive(Clone, Debug)]
pub enum ActionResult<T> {
    Passed { value: T, messages: Vec<String> },
    Failed { messages: Vec<String>, error: Error },
}

impl<T> ActionResult<T> {
    pub const fn passed(value: T) -> Self {
        Self::Passed {
            value,
            messages: Vec::new(),
        }
    }

    pub const fn passed_with(value: T, messages: Vec<String>) -> Self {
        Self::Passed { value, messages }
    }

    /// Failed result; consistency errors expand into one message per problem.
    pub fn failed(error: Error) -> Self {
        let failures = error.consistency_failures();
        let messages = if failures.is_empty() {
            vec![error.message.clone()]
        } else {
            failures.to_vec()
        };

        Self::Failed { messages, error }
    }

    pub fn from_result(result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => Self::passed(value),
            Err(error) => Self::failed(error),
        }
    }

    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Passed { messages, .. } | Self::Failed { messages, .. } => messages,
        }
    }

    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Passed { value, .. } => Some(value),
            Self::Failed { .. } => None,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        match self {
            Self::Passed { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    pub fn into_result(self) -> Result<T, Error> {
        match self {
            Self::Passed { value, .. } => Ok(value),
            Self::Failed { error, .. } => Err(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ActionResult<U> {
        match self {
            Self::Passed { value, messages } => ActionResult::Passed {
                value: f(value),
                messages,
            },
            Self::Failed { messages, error } => ActionResult::Failed { messages, error },
        }
    }
}

///
/// Tracked
/// A command's value together with everything it changed.
///

#[derive(Debug)]
pub struct Tracked<T> {
    pub value: T,
    pub modifications: Modifications,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConsistencyError, ErrorClass, ErrorOrigin};

    #[test]
    fn consistency_failure_lists_every_problem() {
        let err: Error = ConsistencyError::Failed {
            failures: vec!["name is required".to_string(), "quantity must be positive".to_string()],
        }
        .into();

        let result: ActionResult<()> = ActionResult::failed(err);

        assert!(result.is_failed());
        assert_eq!(result.messages().len(), 2);
        assert!(result.error().is_some_and(Error::is_consistency));
    }

    #[test]
    fn other_failures_carry_the_error_message() {
        let err = Error::new(ErrorClass::NotFound, ErrorOrigin::Observer, "gone");

        let result: ActionResult<u32> = ActionResult::from_result(Err(err));

        assert_eq!(result.messages(), ["gone".to_string()]);
        assert!(result.value().is_none());
    }

    #[test]
    fn map_keeps_messages() {
        let result = ActionResult::passed_with(2, vec!["saved".to_string()]).map(|n| n * 10);

        assert_eq!(result.value(), Some(&20));
        assert_eq!(result.messages(), ["saved".to_string()]);
        assert_eq!(result.into_result().expect("result should pass"), 20);
    }
}
