//! Intermediate stages for the lazypipe library.
//!
//! Every stage is a [`Stage`] implementation driven by [`ChainedOperation`],
//! which owns the downstream operation and forwards the lifecycle calls the
//! stage does not care about.

pub mod distinct;
pub mod recovery;

pub use distinct::Distinct;
pub use recovery::{OnErrorFilter, OnErrorMap};

use std::marker::PhantomData;

use crate::core::{Characteristics, CheckedUpdate, Element, Operation, Stage};
use crate::error::{BoxError, ElementError, Result};

/// An operation made of a [`Stage`] and the operation it feeds.
pub struct ChainedOperation<S, O> {
    stage: S,
    downstream: O,
}

impl<S, O> ChainedOperation<S, O> {
    pub fn new(stage: S, downstream: O) -> Self {
        Self { stage, downstream }
    }

    pub fn downstream(&self) -> &O {
        &self.downstream
    }

    /// Give back the downstream operation once evaluation is over.
    pub fn into_downstream(self) -> O {
        self.downstream
    }
}

impl<In, S, O> Operation<In> for ChainedOperation<S, O>
where
    S: Stage<In>,
    O: Operation<S::Out>,
{
    fn start(&mut self, upstream: Characteristics) -> Result<()> {
        let characteristics = self.stage.modify_characteristics(upstream);
        self.stage.on_start(&upstream);
        self.downstream.start(characteristics)
    }

    fn accept_element(&mut self, element: Element<In>) -> Result<()> {
        self.stage.accept_element(element, &mut self.downstream)
    }

    fn needs_more_elements(&self) -> bool {
        self.stage.needs_more_elements(&self.downstream)
    }

    fn finish(&mut self) -> Result<()> {
        self.stage.flush(&mut self.downstream)?;
        self.downstream.finish()
    }
}

/// Keeps elements whose value satisfies a predicate.
///
/// Error-bearing elements pass untouched. A failing predicate turns the
/// element into an error-bearing one instead of dropping it.
pub struct Filter<F, E> {
    predicate: F,
    checked: CheckedUpdate,
    _phantom: PhantomData<fn() -> E>,
}

impl<F, E> Filter<F, E> {
    pub fn new(predicate: F, checked: CheckedUpdate) -> Self {
        Self {
            predicate,
            checked,
            _phantom: PhantomData,
        }
    }
}

impl<T, F, E> Stage<T> for Filter<F, E>
where
    F: FnMut(&T) -> std::result::Result<bool, E>,
    E: Into<BoxError>,
{
    type Out = T;

    fn modify_characteristics(&self, upstream: Characteristics) -> Characteristics {
        self.checked.apply(upstream.with_unknown_size())
    }

    fn accept_element<O>(&mut self, element: Element<T>, downstream: &mut O) -> Result<()>
    where
        O: Operation<T>,
    {
        let verdict = match element.value() {
            Some(value) => (self.predicate)(value),
            None => return downstream.accept_element(element),
        };
        match verdict {
            Ok(true) => downstream.accept_element(element),
            Ok(false) => Ok(()),
            Err(error) => {
                let error = ElementError::new(error);
                tracing::trace!(%error, "filter predicate failed");
                downstream.accept_element(element.with_error_added(error))
            }
        }
    }
}

/// Transforms each value one-to-one.
///
/// Error-bearing elements are retyped and forwarded without calling the mapper.
pub struct Map<F, R, E> {
    mapper: F,
    checked: CheckedUpdate,
    _phantom: PhantomData<fn() -> (R, E)>,
}

impl<F, R, E> Map<F, R, E> {
    pub fn new(mapper: F, checked: CheckedUpdate) -> Self {
        Self {
            mapper,
            checked,
            _phantom: PhantomData,
        }
    }
}

impl<T, F, R, E> Stage<T> for Map<F, R, E>
where
    F: FnMut(T) -> std::result::Result<R, E>,
    E: Into<BoxError>,
{
    type Out = R;

    fn modify_characteristics(&self, upstream: Characteristics) -> Characteristics {
        self.checked.apply(upstream.with_distinct(false))
    }

    fn accept_element<O>(&mut self, element: Element<T>, downstream: &mut O) -> Result<()>
    where
        O: Operation<R>,
    {
        let value = match element.into_value() {
            Ok(value) => value,
            Err(errored) => return downstream.accept_element(errored),
        };
        match (self.mapper)(value) {
            Ok(mapped) => downstream.accept_element(Element::of(mapped)),
            Err(error) => {
                let error = ElementError::new(error);
                tracing::trace!(%error, "map function failed");
                downstream.accept_element(Element::failed(error))
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::Recorder;
    use super::*;
    use std::convert::Infallible;

    fn push_all<T, Op: Operation<T>>(op: &mut Op, elements: Vec<Element<T>>) {
        op.start(Characteristics::regular().with_size(Some(elements.len() as u64)))
            .unwrap();
        for element in elements {
            op.accept_element(element).unwrap();
        }
        op.finish().unwrap();
    }

    #[test]
    fn test_filter_keeps_matching_values() {
        let filter = Filter::new(|x: &i32| Ok::<_, Infallible>(x % 2 == 0), CheckedUpdate::Preserve);
        let mut op = ChainedOperation::new(filter, Recorder::new());
        push_all(&mut op, (1..=6).map(Element::of).collect());

        let recorder = op.into_downstream();
        assert_eq!(recorder.values(), vec![&2, &4, &6]);
        assert!(recorder.finished);
        let started = recorder.started.unwrap();
        assert_eq!(started.size(), None);
        assert!(!started.is_checked());
    }

    #[test]
    fn test_filter_converts_failures_and_passes_errors_through() {
        let filter = Filter::new(
            |x: &i32| if *x == 2 { Err("two") } else { Ok(true) },
            CheckedUpdate::Set,
        );
        let mut op = ChainedOperation::new(filter, Recorder::new());
        push_all(
            &mut op,
            vec![
                Element::of(1),
                Element::of(2),
                Element::failed(ElementError::new("upstream")),
            ],
        );

        let recorder = op.into_downstream();
        assert!(recorder.started.unwrap().is_checked());
        assert_eq!(recorder.elements.len(), 3);
        assert_eq!(recorder.elements[1].errors()[0].to_string(), "two");
        assert_eq!(recorder.elements[2].errors()[0].to_string(), "upstream");
    }

    #[test]
    fn test_map_transforms_and_retypes_errors() {
        let map = Map::new(
            |x: i32| if x < 0 { Err("negative") } else { Ok(x.to_string()) },
            CheckedUpdate::Preserve,
        );
        let mut op = ChainedOperation::new(map, Recorder::new());
        op.start(Characteristics::regular().with_size(Some(3)).with_distinct(true))
            .unwrap();
        op.accept_element(Element::of(4)).unwrap();
        op.accept_element(Element::of(-1)).unwrap();
        op.accept_element(Element::failed(ElementError::new("earlier")))
            .unwrap();
        op.finish().unwrap();

        let recorder: Recorder<String> = op.into_downstream();
        let started = recorder.started.unwrap();
        assert_eq!(started.size(), Some(3));
        assert!(!started.is_distinct());
        assert_eq!(recorder.values(), vec!["4"]);
        assert_eq!(recorder.elements[1].errors()[0].to_string(), "negative");
        assert_eq!(recorder.elements[2].errors()[0].to_string(), "earlier");
    }

    #[test]
    fn test_needs_more_elements_delegates_downstream() {
        let map = Map::new(|x: i32| Ok::<_, Infallible>(x), CheckedUpdate::Preserve);
        let mut op = ChainedOperation::new(map, Recorder::with_limit(1));
        op.start(Characteristics::regular()).unwrap();
        assert!(op.needs_more_elements());
        op.accept_element(Element::of(1)).unwrap();
        assert!(!op.needs_more_elements());
    }
}
