//! Stages that deal with element errors.

use std::marker::PhantomData;

use crate::core::{Characteristics, CheckedUpdate, Element, Operation, Stage};
use crate::error::{BoxError, ElementError, Result};

/// Forwards value elements and drops every element carrying errors.
///
/// Nothing erroneous can get past this stage, so the checked flag is cleared.
#[derive(Debug, Default, Clone, Copy)]
pub struct OnErrorFilter;

impl<T> Stage<T> for OnErrorFilter {
    type Out = T;

    fn modify_characteristics(&self, upstream: Characteristics) -> Characteristics {
        upstream.with_unknown_size().with_checked(false)
    }

    fn accept_element<O>(&mut self, element: Element<T>, downstream: &mut O) -> Result<()>
    where
        O: Operation<T>,
    {
        if element.has_errors() {
            tracing::trace!(errors = element.errors().len(), "dropping failed element");
            return Ok(());
        }
        downstream.accept_element(element)
    }
}

/// Replaces error-bearing elements with a value computed from their errors.
pub struct OnErrorMap<F, E> {
    recover: F,
    checked: CheckedUpdate,
    _phantom: PhantomData<fn() -> E>,
}

impl<F, E> OnErrorMap<F, E> {
    pub fn new(recover: F, checked: CheckedUpdate) -> Self {
        Self {
            recover,
            checked,
            _phantom: PhantomData,
        }
    }
}

impl<T, F, E> Stage<T> for OnErrorMap<F, E>
where
    F: FnMut(&[ElementError]) -> std::result::Result<T, E>,
    E: Into<BoxError>,
{
    type Out = T;

    fn modify_characteristics(&self, upstream: Characteristics) -> Characteristics {
        self.checked.apply(upstream.with_distinct(false))
    }

    fn accept_element<O>(&mut self, element: Element<T>, downstream: &mut O) -> Result<()>
    where
        O: Operation<T>,
    {
        if !element.has_errors() {
            return downstream.accept_element(element);
        }
        match (self.recover)(element.errors()) {
            Ok(replacement) => downstream.accept_element(Element::of(replacement)),
            Err(error) => {
                let error = ElementError::new(error);
                tracing::trace!(%error, "error recovery failed");
                downstream.accept_element(element.with_error_added(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::testing::Recorder;
    use crate::processors::ChainedOperation;
    use std::convert::Infallible;

    fn input() -> Vec<Element<i32>> {
        vec![
            Element::of(1),
            Element::failed(ElementError::new("broken")),
            Element::of(3),
        ]
    }

    #[test]
    fn test_on_error_filter_drops_failures() {
        let mut op = ChainedOperation::new(OnErrorFilter, Recorder::<i32>::new());
        op.start(Characteristics::regular().with_size(Some(3)).with_checked(true))
            .unwrap();
        for element in input() {
            op.accept_element(element).unwrap();
        }
        op.finish().unwrap();

        let recorder = op.into_downstream();
        assert_eq!(recorder.values(), vec![&1, &3]);
        let started = recorder.started.unwrap();
        assert_eq!(started.size(), None);
        assert!(!started.is_checked());
    }

    #[test]
    fn test_on_error_map_replaces_failures() {
        let recover = OnErrorMap::new(
            |errors: &[ElementError]| Ok::<_, Infallible>(-(errors.len() as i32)),
            CheckedUpdate::Clear,
        );
        let mut op = ChainedOperation::new(recover, Recorder::new());
        op.start(Characteristics::regular().with_size(Some(3)).with_checked(true))
            .unwrap();
        for element in input() {
            op.accept_element(element).unwrap();
        }

        let recorder = op.into_downstream();
        assert_eq!(recorder.values(), vec![&1, &-1, &3]);
        let started = recorder.started.unwrap();
        assert_eq!(started.size(), Some(3));
        assert!(!started.is_checked());
    }

    #[test]
    fn test_failed_recovery_appends_error() {
        let recover = OnErrorMap::new(
            |_: &[ElementError]| Err::<i32, _>("still broken"),
            CheckedUpdate::Set,
        );
        let mut op = ChainedOperation::new(recover, Recorder::new());
        op.start(Characteristics::regular()).unwrap();
        op.accept_element(Element::failed(ElementError::new("broken")))
            .unwrap();

        let recorder = op.into_downstream();
        assert!(recorder.started.unwrap().is_checked());
        let messages: Vec<String> = recorder.elements[0]
            .errors()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(messages, vec!["broken", "still broken"]);
    }
}
