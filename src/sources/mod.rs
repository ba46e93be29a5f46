//! Producer implementations for the lazypipe library.
//!
//! These are thin adapters that put existing data behind the [`Producer`]
//! contract. Collections with a known length report it so that terminals
//! such as `count` can answer without pulling.

use std::collections::VecDeque;
use std::iter::Peekable;
use std::ops::Range;

use crate::core::{Element, Producer};
use crate::error::{BoxError, ElementError, Error, Result};

/// A producer that yields items from a vector
pub struct VecSource<T> {
    items: VecDeque<T>,
}

impl<T> VecSource<T> {
    /// Create a new vector producer
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Get the number of remaining items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the producer has more items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Producer for VecSource<T> {
    type Item = T;

    fn has_next(&mut self) -> bool {
        !self.items.is_empty()
    }

    fn next_element(&mut self) -> Result<Element<T>> {
        self.items.pop_front().map(Element::of).ok_or(Error::Exhausted)
    }

    fn size(&self) -> Option<u64> {
        Some(self.items.len() as u64)
    }
}

/// A producer that yields already tagged elements, errors included
pub struct ElementSource<T> {
    elements: VecDeque<Element<T>>,
}

impl<T> ElementSource<T> {
    pub fn new(elements: Vec<Element<T>>) -> Self {
        Self {
            elements: elements.into(),
        }
    }
}

impl<T> Producer for ElementSource<T> {
    type Item = T;

    fn has_next(&mut self) -> bool {
        !self.elements.is_empty()
    }

    fn next_element(&mut self) -> Result<Element<T>> {
        self.elements.pop_front().ok_or(Error::Exhausted)
    }

    fn size(&self) -> Option<u64> {
        Some(self.elements.len() as u64)
    }
}

/// A producer that generates numbers from a range
pub struct RangeSource {
    range: Range<i64>,
}

impl RangeSource {
    /// Create a new range producer
    pub fn new(range: Range<i64>) -> Self {
        Self { range }
    }
}

impl Producer for RangeSource {
    type Item = i64;

    fn has_next(&mut self) -> bool {
        !self.range.is_empty()
    }

    fn next_element(&mut self) -> Result<Element<i64>> {
        self.range.next().map(Element::of).ok_or(Error::Exhausted)
    }

    fn size(&self) -> Option<u64> {
        if self.range.start < self.range.end {
            Some(self.range.end.abs_diff(self.range.start))
        } else {
            Some(0)
        }
    }
}

/// A producer that repeats a single value a fixed number of times
pub struct RepeatSource<T> {
    value: T,
    remaining: u64,
}

impl<T: Clone> RepeatSource<T> {
    /// Create a producer that repeats a value n times
    pub fn times(value: T, count: u64) -> Self {
        Self {
            value,
            remaining: count,
        }
    }
}

impl<T: Clone> Producer for RepeatSource<T> {
    type Item = T;

    fn has_next(&mut self) -> bool {
        self.remaining > 0
    }

    fn next_element(&mut self) -> Result<Element<T>> {
        if self.remaining == 0 {
            return Err(Error::Exhausted);
        }
        self.remaining -= 1;
        Ok(Element::of(self.value.clone()))
    }

    fn size(&self) -> Option<u64> {
        Some(self.remaining)
    }
}

/// A producer over any iterator.
///
/// The size is unknown unless built with [`IterSource::exact`].
pub struct IterSource<I: Iterator> {
    iter: Peekable<I>,
    remaining: Option<u64>,
}

impl<I: Iterator> IterSource<I> {
    pub fn new<C>(iterable: C) -> Self
    where
        C: IntoIterator<IntoIter = I>,
    {
        Self {
            iter: iterable.into_iter().peekable(),
            remaining: None,
        }
    }
}

impl<I: ExactSizeIterator> IterSource<I> {
    /// Create a producer that reports the iterator's exact length
    pub fn exact<C>(iterable: C) -> Self
    where
        C: IntoIterator<IntoIter = I>,
    {
        let iter = iterable.into_iter();
        let remaining = Some(iter.len() as u64);
        Self {
            iter: iter.peekable(),
            remaining,
        }
    }
}

impl<I: Iterator> Producer for IterSource<I> {
    type Item = I::Item;

    fn has_next(&mut self) -> bool {
        self.iter.peek().is_some()
    }

    fn next_element(&mut self) -> Result<Element<I::Item>> {
        let item = self.iter.next().ok_or(Error::Exhausted)?;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        Ok(Element::of(item))
    }

    fn size(&self) -> Option<u64> {
        self.remaining
    }
}

/// A producer over an iterator of results; every `Err` becomes an error-bearing element.
pub struct ResultSource<I: Iterator> {
    iter: Peekable<I>,
}

impl<I, T, E> ResultSource<I>
where
    I: Iterator<Item = std::result::Result<T, E>>,
    E: Into<BoxError>,
{
    pub fn new<C>(iterable: C) -> Self
    where
        C: IntoIterator<IntoIter = I>,
    {
        Self {
            iter: iterable.into_iter().peekable(),
        }
    }
}

impl<I, T, E> Producer for ResultSource<I>
where
    I: Iterator<Item = std::result::Result<T, E>>,
    E: Into<BoxError>,
{
    type Item = T;

    fn has_next(&mut self) -> bool {
        self.iter.peek().is_some()
    }

    fn next_element(&mut self) -> Result<Element<T>> {
        match self.iter.next().ok_or(Error::Exhausted)? {
            Ok(value) => Ok(Element::of(value)),
            Err(error) => Ok(Element::failed(ElementError::new(error))),
        }
    }
}

/// Helper function to create a producer from a function returning `None` when done
pub fn from_fn<F, T>(f: F) -> FnSource<F, T>
where
    F: FnMut() -> Option<T>,
{
    FnSource { f, pending: None }
}

/// A producer created from a function
pub struct FnSource<F, T> {
    f: F,
    pending: Option<T>,
}

impl<F, T> Producer for FnSource<F, T>
where
    F: FnMut() -> Option<T>,
{
    type Item = T;

    fn has_next(&mut self) -> bool {
        if self.pending.is_none() {
            self.pending = (self.f)();
        }
        self.pending.is_some()
    }

    fn next_element(&mut self) -> Result<Element<T>> {
        let item = match self.pending.take() {
            Some(item) => Some(item),
            None => (self.f)(),
        };
        item.map(Element::of).ok_or(Error::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<P: Producer>(mut producer: P) -> Vec<Element<P::Item>> {
        let mut elements = Vec::new();
        while producer.has_next() {
            elements.push(producer.next_element().unwrap());
        }
        assert!(matches!(producer.next_element(), Err(Error::Exhausted)));
        elements
    }

    #[test]
    fn test_vec_source_reports_size() {
        let source = VecSource::new(vec![1, 2, 3]);
        assert_eq!(source.size(), Some(3));
        assert_eq!(source.len(), 3);
        assert_eq!(drain(source).len(), 3);
    }

    #[test]
    fn test_range_source() {
        let source = RangeSource::new(1..6);
        assert_eq!(source.size(), Some(5));
        let values: Vec<i64> = drain(source)
            .into_iter()
            .filter_map(|e| e.into_value::<()>().ok())
            .collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);

        assert_eq!(RangeSource::new(5..1).size(), Some(0));
        assert_eq!(RangeSource::new(i64::MIN..i64::MAX).size(), Some(u64::MAX));
        assert_eq!(RangeSource::new(-3..i64::MAX).size(), Some(i64::MAX as u64 + 3));
    }

    #[test]
    fn test_repeat_source() {
        let source = RepeatSource::times("x", 2);
        assert_eq!(source.size(), Some(2));
        assert_eq!(drain(source).len(), 2);
    }

    #[test]
    fn test_iter_source_sizes() {
        assert_eq!(IterSource::new(vec![1, 2]).size(), None);

        let mut exact = IterSource::exact(vec![1, 2]);
        assert_eq!(exact.size(), Some(2));
        exact.next_element().unwrap();
        assert_eq!(exact.size(), Some(1));
    }

    #[test]
    fn test_result_source_tags_errors() {
        let source = ResultSource::new(vec![Ok(1), Err("bad"), Ok(3)]);
        let elements = drain(source);
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[1].errors()[0].to_string(), "bad");
    }

    #[test]
    fn test_fn_source_looks_ahead_once() {
        let mut next = 0;
        let source = from_fn(move || {
            next += 1;
            (next <= 3).then_some(next)
        });
        let values: Vec<i32> = drain(source)
            .into_iter()
            .filter_map(|e| e.into_value::<()>().ok())
            .collect();
        assert_eq!(values, vec![1, 2, 3]);
    }
}
