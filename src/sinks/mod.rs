//! Terminal operations for the lazypipe library.
//!
//! A terminal sits at the end of an evaluation chain, decides how many
//! elements it wants and turns what it received into the evaluation result.
//! None of the terminals here handle element errors: they refuse a checked
//! upstream at `start` and report any error that still reaches them as one
//! aggregate [`Error::ErrorsAtTerminal`].

use std::marker::PhantomData;

use crate::core::{reject_checked, Characteristics, Element, Operation, TerminalOperation};
use crate::error::{ElementError, Error, Result};

/// Element errors that reached a terminal.
#[derive(Debug, Default)]
struct Unresolved {
    errors: Vec<ElementError>,
}

impl Unresolved {
    /// Take the value out of `element`, recording its errors if it has none.
    fn absorb<T>(&mut self, element: Element<T>) -> Option<T> {
        match element.into_value::<T>() {
            Ok(value) => Some(value),
            Err(errored) => {
                self.errors.extend(errored.into_errors());
                None
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn into_result<R>(self, output: R) -> Result<R> {
        if self.errors.is_empty() {
            Ok(output)
        } else {
            Err(Error::at_terminal(self.errors))
        }
    }
}

/// Counts elements, or reports the upstream's known size without pulling anything.
pub struct CountSink<T> {
    count: u64,
    known_size: bool,
    unresolved: Unresolved,
    _phantom: PhantomData<fn(T)>,
}

impl<T> CountSink<T> {
    pub fn new() -> Self {
        Self {
            count: 0,
            known_size: false,
            unresolved: Unresolved::default(),
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for CountSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Operation<T> for CountSink<T> {
    fn start(&mut self, upstream: Characteristics) -> Result<()> {
        reject_checked(&upstream)?;
        self.count = 0;
        self.known_size = false;
        if let Some(size) = upstream.size() {
            tracing::debug!(size, "count answered from known size");
            self.count = size;
            self.known_size = true;
        }
        Ok(())
    }

    fn accept_element(&mut self, element: Element<T>) -> Result<()> {
        if self.unresolved.absorb(element).is_some() {
            self.count += 1;
        }
        Ok(())
    }

    fn needs_more_elements(&self) -> bool {
        !self.known_size
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T> TerminalOperation<T> for CountSink<T> {
    type Output = u64;

    fn into_output(self) -> Result<u64> {
        self.unresolved.into_result(self.count)
    }
}

/// Keeps the first element and asks for nothing more.
pub struct FindFirstSink<T> {
    value: Option<T>,
    unresolved: Unresolved,
}

impl<T> FindFirstSink<T> {
    pub fn new() -> Self {
        Self {
            value: None,
            unresolved: Unresolved::default(),
        }
    }
}

impl<T> Default for FindFirstSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Operation<T> for FindFirstSink<T> {
    fn start(&mut self, upstream: Characteristics) -> Result<()> {
        reject_checked(&upstream)
    }

    fn accept_element(&mut self, element: Element<T>) -> Result<()> {
        if self.value.is_some() || !self.unresolved.is_empty() {
            return Err(Error::too_many_elements("find_first"));
        }
        self.value = self.unresolved.absorb(element);
        Ok(())
    }

    fn needs_more_elements(&self) -> bool {
        self.value.is_none() && self.unresolved.is_empty()
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T> TerminalOperation<T> for FindFirstSink<T> {
    type Output = Option<T>;

    fn into_output(self) -> Result<Option<T>> {
        self.unresolved.into_result(self.value)
    }
}

/// Left fold without a seed value.
pub struct ReduceSink<T, F> {
    accumulator: F,
    current: Option<T>,
    unresolved: Unresolved,
}

impl<T, F> ReduceSink<T, F>
where
    F: FnMut(T, T) -> T,
{
    pub fn new(accumulator: F) -> Self {
        Self {
            accumulator,
            current: None,
            unresolved: Unresolved::default(),
        }
    }
}

impl<T, F> Operation<T> for ReduceSink<T, F>
where
    F: FnMut(T, T) -> T,
{
    fn start(&mut self, upstream: Characteristics) -> Result<()> {
        reject_checked(&upstream)
    }

    fn accept_element(&mut self, element: Element<T>) -> Result<()> {
        let Some(value) = self.unresolved.absorb(element) else {
            return Ok(());
        };
        self.current = Some(match self.current.take() {
            Some(current) => (self.accumulator)(current, value),
            None => value,
        });
        Ok(())
    }

    fn needs_more_elements(&self) -> bool {
        true
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T, F> TerminalOperation<T> for ReduceSink<T, F>
where
    F: FnMut(T, T) -> T,
{
    type Output = Option<T>;

    fn into_output(self) -> Result<Option<T>> {
        self.unresolved.into_result(self.current)
    }
}

/// Materializes every element, in encounter order, into a container made by
/// a caller-supplied factory.
///
/// The factory is called in `start`, after a checked upstream has been
/// rejected, so a failed evaluation never builds a container.
pub struct CollectSink<T, F, C> {
    factory: F,
    collection: Option<C>,
    unresolved: Unresolved,
    _phantom: PhantomData<fn(T)>,
}

impl<T, F, C> CollectSink<T, F, C>
where
    F: FnMut() -> C,
    C: Extend<T>,
{
    /// `factory` is expected to return an empty container.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            collection: None,
            unresolved: Unresolved::default(),
            _phantom: PhantomData,
        }
    }
}

impl<T, F, C> Operation<T> for CollectSink<T, F, C>
where
    F: FnMut() -> C,
    C: Extend<T>,
{
    fn start(&mut self, upstream: Characteristics) -> Result<()> {
        reject_checked(&upstream)?;
        self.collection = Some((self.factory)());
        Ok(())
    }

    fn accept_element(&mut self, element: Element<T>) -> Result<()> {
        if let Some(value) = self.unresolved.absorb(element) {
            self.collection
                .get_or_insert_with(&mut self.factory)
                .extend(Some(value));
        }
        Ok(())
    }

    fn needs_more_elements(&self) -> bool {
        true
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T, F, C> TerminalOperation<T> for CollectSink<T, F, C>
where
    F: FnMut() -> C,
    C: Extend<T>,
{
    type Output = C;

    fn into_output(mut self) -> Result<C> {
        let collection = match self.collection.take() {
            Some(collection) => collection,
            None => (self.factory)(),
        };
        self.unresolved.into_result(collection)
    }
}
