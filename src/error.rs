//! Error types for the stream pipeline.
//!
//! Two channels exist. [`ElementError`] is data: it rides along with an
//! [`Element`](crate::core::Element) until a stage handles it or a terminal
//! operation reports it. [`Error`] is control flow: it aborts an evaluation.

use std::fmt;
use std::sync::Arc;

/// Boxed error accepted from user supplied functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A failure recorded on a single element.
///
/// Cloning is cheap; the underlying error is shared.
#[derive(Clone)]
pub struct ElementError(Arc<dyn std::error::Error + Send + Sync>);

impl ElementError {
    /// Wrap anything convertible into a boxed error (`&str`, `String`, any
    /// `std::error::Error`).
    pub fn new<E: Into<BoxError>>(error: E) -> Self {
        ElementError(Arc::from(error.into()))
    }

    /// Borrow the wrapped error.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Debug for ElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ElementError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

/// The main error type for stream evaluation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A terminal operation without error handling was started on a checked stream
    #[error("cannot process a checked stream with no error handling")]
    CheckedStream,

    /// Element errors reached a terminal operation unhandled
    #[error("terminal operation encountered {} element error(s): {}", .0.len(), ErrorList(.0))]
    ErrorsAtTerminal(Vec<ElementError>),

    /// A terminal operation received more elements than it accepts
    #[error("{operation} cannot accept more than one element")]
    TooManyElements { operation: &'static str },

    /// A producer was asked for an element after it was exhausted
    #[error("producer has no more elements")]
    Exhausted,
}

impl Error {
    /// Create an aggregate error from element errors
    pub fn at_terminal(errors: Vec<ElementError>) -> Self {
        Error::ErrorsAtTerminal(errors)
    }

    /// Create a protocol error for a terminal that got one element too many
    pub fn too_many_elements(operation: &'static str) -> Self {
        Error::TooManyElements { operation }
    }

    /// The element errors carried by an aggregate error, empty otherwise.
    pub fn element_errors(&self) -> &[ElementError] {
        match self {
            Error::ErrorsAtTerminal(errors) => errors,
            _ => &[],
        }
    }
}

struct ErrorList<'a>(&'a [ElementError]);

impl fmt::Display for ErrorList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[{}]", error)?;
        }
        Ok(())
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_error_from_str_and_error() {
        let from_str = ElementError::new("bad input");
        assert_eq!(from_str.to_string(), "bad input");

        let parse = "x".parse::<i32>().unwrap_err();
        let from_err = ElementError::new(parse.clone());
        assert_eq!(from_err.to_string(), parse.to_string());
        assert!(std::error::Error::source(&from_err).is_some());
    }

    #[test]
    fn test_aggregate_display_lists_every_error() {
        let error = Error::at_terminal(vec![ElementError::new("a"), ElementError::new("b")]);
        assert_eq!(
            error.to_string(),
            "terminal operation encountered 2 element error(s): [a], [b]"
        );
        assert_eq!(error.element_errors().len(), 2);
    }

    #[test]
    fn test_protocol_errors() {
        assert_eq!(
            Error::too_many_elements("find_first").to_string(),
            "find_first cannot accept more than one element"
        );
        assert!(Error::CheckedStream.element_errors().is_empty());
    }
}
