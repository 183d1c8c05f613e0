//! Per-call exception flag
//!
//! `Idle -> Pending -> consumed by the caller`. The first message wins;
//! later attempts are reported as [`MarshalError::ExceptionAlreadySet`].

use crate::error::MarshalError;
use core::fmt;

/// Exception raised by a native function through the generic context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptException {
    pub function: String,
    pub message: String,
}

impl fmt::Display for ScriptException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exception in '{}': {}", self.function, self.message)
    }
}

impl std::error::Error for ScriptException {}

#[derive(Debug, Default)]
pub(crate) enum ExceptionFlag {
    #[default]
    Idle,
    Pending(ScriptException),
}

impl ExceptionFlag {
    pub(crate) fn set(&mut self, function: &str, message: String) -> Result<(), MarshalError> {
        match self {
            Self::Idle => {
                *self = Self::Pending(ScriptException {
                    function: function.to_string(),
                    message,
                });
                Ok(())
            }
            Self::Pending(existing) => Err(MarshalError::ExceptionAlreadySet {
                existing: existing.message.clone(),
            }),
        }
    }

    #[inline]
    pub(crate) fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    pub(crate) fn take(&mut self) -> Option<ScriptException> {
        match core::mem::take(self) {
            Self::Pending(exception) => Some(exception),
            Self::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_message_wins() {
        let mut flag = ExceptionFlag::default();
        assert!(!flag.is_pending());

        flag.set("f", "first".into()).unwrap();
        let err = flag.set("f", "second".into()).unwrap_err();
        assert_eq!(
            err,
            MarshalError::ExceptionAlreadySet {
                existing: "first".into()
            }
        );

        let exception = flag.take().unwrap();
        assert_eq!(exception.message, "first");
        assert_eq!(exception.to_string(), "exception in 'f': first");
        assert!(!flag.is_pending());
    }
}
