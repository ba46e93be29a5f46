//! The unit of data flowing through a pipeline.

use std::hash::{Hash, Hasher};

use crate::error::ElementError;

#[derive(Clone, Debug)]
enum Repr<T> {
    Value(T),
    // never empty
    Errors(Vec<ElementError>),
}

/// Either a value or a non-empty, ordered list of accumulated errors.
///
/// Once an element carries an error its value is gone; later stages only
/// ever append to the error list. Equality and hashing look at the value
/// alone, so two value-bearing elements are equal when their values are,
/// regardless of how they were produced.
///
/// ```rust
/// use lazypipe::core::Element;
/// use lazypipe::ElementError;
///
/// let ok = Element::of(7);
/// assert_eq!(ok.value(), Some(&7));
///
/// let failed = ok.with_error_added(ElementError::new("boom"));
/// assert!(failed.has_errors());
/// assert_eq!(failed.value(), None);
/// assert_eq!(failed.errors()[0].to_string(), "boom");
/// ```
#[derive(Clone, Debug)]
pub struct Element<T> {
    repr: Repr<T>,
}

impl<T> Element<T> {
    /// A value-bearing element.
    pub fn of(value: T) -> Self {
        Element {
            repr: Repr::Value(value),
        }
    }

    /// An element carrying a single error.
    pub fn failed(error: ElementError) -> Self {
        Element {
            repr: Repr::Errors(vec![error]),
        }
    }

    /// Append an error, dropping the value if there was one.
    pub fn with_error_added(self, error: ElementError) -> Self {
        let mut errors = match self.repr {
            Repr::Value(_) => Vec::with_capacity(1),
            Repr::Errors(errors) => errors,
        };
        errors.push(error);
        Element {
            repr: Repr::Errors(errors),
        }
    }

    pub fn has_errors(&self) -> bool {
        matches!(self.repr, Repr::Errors(_))
    }

    /// The accumulated errors in the order they were added; empty for a value.
    pub fn errors(&self) -> &[ElementError] {
        match &self.repr {
            Repr::Value(_) => &[],
            Repr::Errors(errors) => errors,
        }
    }

    /// The value, or `None` once errors are present.
    pub fn value(&self) -> Option<&T> {
        match &self.repr {
            Repr::Value(value) => Some(value),
            Repr::Errors(_) => None,
        }
    }

    /// Take the value out, or hand back the errors retyped for any `R`.
    pub fn into_value<R>(self) -> Result<T, Element<R>> {
        match self.repr {
            Repr::Value(value) => Ok(value),
            Repr::Errors(errors) => Err(Element {
                repr: Repr::Errors(errors),
            }),
        }
    }

    /// Retype an error-bearing element. Returns `None` for a value-bearing one,
    /// since its value cannot be carried over.
    pub fn reinterpret<R>(self) -> Option<Element<R>> {
        self.into_value().err()
    }

    /// Consume the element, keeping only its errors.
    pub fn into_errors(self) -> Vec<ElementError> {
        match self.repr {
            Repr::Value(_) => Vec::new(),
            Repr::Errors(errors) => errors,
        }
    }
}

impl<T> From<ElementError> for Element<T> {
    fn from(error: ElementError) -> Self {
        Element::failed(error)
    }
}

impl<T: PartialEq> PartialEq for Element<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl<T: Eq> Eq for Element<T> {}

impl<T: Hash> Hash for Element<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_errors_append_in_order() {
        let element = Element::of("x")
            .with_error_added(ElementError::new("first"))
            .with_error_added(ElementError::new("second"));

        let messages: Vec<String> = element.errors().iter().map(|e| e.to_string()).collect();
        assert_eq!(messages, vec!["first", "second"]);
        assert_eq!(element.value(), None);
    }

    #[test]
    fn test_value_element_has_no_errors() {
        let element = Element::of(3);
        assert!(!element.has_errors());
        assert!(element.errors().is_empty());
        assert_eq!(element.into_value::<()>().ok(), Some(3));
    }

    #[test]
    fn test_reinterpret_keeps_errors() {
        let failed: Element<i32> = Element::failed(ElementError::new("nope"));
        let retyped: Element<String> = failed.reinterpret().unwrap();
        assert_eq!(retyped.errors().len(), 1);
        assert_eq!(retyped.errors()[0].to_string(), "nope");

        assert!(Element::of(1).reinterpret::<String>().is_none());
    }

    #[test]
    fn test_equality_ignores_errors() {
        assert_eq!(Element::of(1), Element::of(1));
        assert_ne!(Element::of(1), Element::of(2));
        assert_ne!(Element::of(1), Element::of(1).with_error_added(ElementError::new("e")));

        let mut set = HashSet::new();
        assert!(set.insert(Element::of(5)));
        assert!(!set.insert(Element::of(5)));
    }
}
