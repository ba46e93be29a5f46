//! Pipeline construction and evaluation.
//!
//! A [`Stream`] wraps the most recently attached pipeline part. Attaching a
//! stage moves the stream into the new part, so a part can have only one
//! downstream link and a stream can be consumed only once; the compiler
//! enforces both:
//!
//! ```compile_fail,E0382
//! use lazypipe::Stream;
//!
//! let numbers = Stream::of(vec![1, 2, 3]);
//! let evens = numbers.filter(|x| x % 2 == 0);
//! let odds = numbers.filter(|x| x % 2 == 1); // `numbers` was moved
//! ```
//!
//! ```compile_fail,E0382
//! use lazypipe::Stream;
//!
//! let numbers = Stream::of(vec![1, 2, 3]).map(|x| x * 2);
//! let total = numbers.count();
//! let again = numbers.to_vec(); // already consumed
//! ```
//!
//! Nothing is read while the chain is being built. Calling a terminal
//! operation builds a fresh chain of operations from the parts, hands its
//! head to the [`SourcePart`] and lets the source drive it to completion.

use std::convert::Infallible;
use std::hash::Hash;

use crate::core::{
    Characteristics, CheckedUpdate, Operation, Producer, Stage, TerminalOperation,
};
use crate::error::{BoxError, ElementError, Result};
use crate::processors::{ChainedOperation, Distinct, Filter, Map, OnErrorFilter, OnErrorMap};
use crate::sinks::{CollectSink, CountSink, FindFirstSink, ReduceSink};
use crate::sources::{ElementSource, IterSource, ResultSource, VecSource};

/// A builder-side node of a pipeline.
pub trait Part {
    /// Element type this part hands downstream
    type Output;

    /// Wrap `downstream` in this part's operation and pass it up to the
    /// source, which evaluates the chain. Returns `downstream` once
    /// evaluation has finished.
    fn drive<O>(self, downstream: O) -> Result<O>
    where
        O: Operation<Self::Output>;
}

/// The root of a pipeline: owns the producer and the initial characteristics.
///
/// The source is not an operation itself; it is the only place evaluation
/// can start from.
pub struct SourcePart<P> {
    producer: P,
    characteristics: Characteristics,
    label: Option<String>,
}

impl<P: Producer> SourcePart<P> {
    pub fn new(producer: P) -> Self {
        let characteristics = Characteristics::regular().with_size(producer.size());
        Self::with_characteristics(producer, characteristics)
    }

    pub fn with_characteristics(producer: P, characteristics: Characteristics) -> Self {
        Self {
            producer,
            characteristics,
            label: None,
        }
    }
}

impl<P: Producer> Part for SourcePart<P> {
    type Output = P::Item;

    fn drive<O>(mut self, mut head: O) -> Result<O>
    where
        O: Operation<P::Item>,
    {
        let label = self.label.as_deref().unwrap_or("stream");
        let characteristics = self.characteristics;
        tracing::debug!(
            label,
            size = ?characteristics.size(),
            distinct = characteristics.is_distinct(),
            checked = characteristics.is_checked(),
            "starting stream evaluation"
        );

        head.start(characteristics)?;
        let mut pulled: u64 = 0;
        while head.needs_more_elements() && self.producer.has_next() {
            head.accept_element(self.producer.next_element()?)?;
            pulled += 1;
        }
        let short_circuited = !head.needs_more_elements();
        head.finish()?;

        tracing::debug!(label, pulled, short_circuited, "stream evaluation finished");
        #[cfg(feature = "metrics")]
        {
            metrics::counter!("lazypipe.evaluations").increment(1);
            metrics::counter!("lazypipe.elements_pulled").increment(pulled);
        }
        Ok(head)
    }
}

/// A stage attached to the part before it.
pub struct IntermediatePart<P, S> {
    previous: P,
    stage: S,
}

impl<P, S> Part for IntermediatePart<P, S>
where
    P: Part,
    S: Stage<P::Output>,
{
    type Output = S::Out;

    fn drive<O>(self, downstream: O) -> Result<O>
    where
        O: Operation<S::Out>,
    {
        let chained = self
            .previous
            .drive(ChainedOperation::new(self.stage, downstream))?;
        Ok(chained.into_downstream())
    }
}

/// A lazily evaluated pipeline.
///
/// # Examples
///
/// ```rust
/// use lazypipe::Stream;
///
/// let squares = Stream::of(vec![1, 2, 3, 2, 4])
///     .distinct()
///     .filter(|x| x % 2 == 0)
///     .map(|x| x * x)
///     .to_vec()?;
/// assert_eq!(squares, vec![4, 16]);
/// # Ok::<(), lazypipe::Error>(())
/// ```
pub struct Stream<P> {
    part: P,
}

impl<P: Producer> Stream<SourcePart<P>> {
    /// Create a stream reading from `producer`, taking its known size.
    pub fn from_producer(producer: P) -> Self {
        Stream {
            part: SourcePart::new(producer),
        }
    }

    /// Create a stream whose source declares `characteristics` as given.
    pub fn with_characteristics(producer: P, characteristics: Characteristics) -> Self {
        Stream {
            part: SourcePart::with_characteristics(producer, characteristics),
        }
    }

    /// Set the label used in log events
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.part.label = Some(label.into());
        self
    }

    /// Replace the source characteristics
    pub fn characteristics(mut self, characteristics: Characteristics) -> Self {
        self.part.characteristics = characteristics;
        self
    }

    /// Declare that the producer never yields two equal values
    pub fn assume_distinct(mut self) -> Self {
        self.part.characteristics = self.part.characteristics.with_distinct(true);
        self
    }
}

impl<T> Stream<SourcePart<VecSource<T>>> {
    /// Stream over the items of a vector (known size)
    pub fn of(items: Vec<T>) -> Self {
        Stream::from_producer(VecSource::new(items))
    }
}

impl<I: Iterator> Stream<SourcePart<IterSource<I>>> {
    /// Stream over any iterable (unknown size)
    pub fn from_iterable<C>(iterable: C) -> Self
    where
        C: IntoIterator<IntoIter = I>,
    {
        Stream::from_producer(IterSource::new(iterable))
    }
}

impl<I: ExactSizeIterator> Stream<SourcePart<IterSource<I>>> {
    /// Stream over an iterable whose length is known up front
    pub fn from_exact<C>(iterable: C) -> Self
    where
        C: IntoIterator<IntoIter = I>,
    {
        Stream::from_producer(IterSource::exact(iterable))
    }
}

impl<I, T, E> Stream<SourcePart<ResultSource<I>>>
where
    I: Iterator<Item = std::result::Result<T, E>>,
    E: Into<BoxError>,
{
    /// Stream over results; every `Err` becomes an error-bearing element
    pub fn from_results<C>(iterable: C) -> Self
    where
        C: IntoIterator<IntoIter = I>,
    {
        Stream::from_producer(ResultSource::new(iterable))
    }
}

impl<T> Stream<SourcePart<ElementSource<T>>> {
    /// Stream over already tagged elements
    pub fn from_elements(elements: Vec<crate::core::Element<T>>) -> Self {
        Stream::from_producer(ElementSource::new(elements))
    }
}

impl<P: Part> Stream<P> {
    /// Attach a custom stage.
    pub fn with_stage<S>(self, stage: S) -> Stream<IntermediatePart<P, S>>
    where
        S: Stage<P::Output>,
    {
        Stream {
            part: IntermediatePart {
                previous: self.part,
                stage,
            },
        }
    }

    /// Keep values matching `predicate`.
    pub fn filter<F>(self, mut predicate: F) -> Stream<impl Part<Output = P::Output>>
    where
        F: FnMut(&P::Output) -> bool,
    {
        let predicate = move |value: &P::Output| Ok::<_, Infallible>(predicate(value));
        self.with_stage(Filter::new(predicate, CheckedUpdate::Preserve))
    }

    /// Keep values matching a fallible `predicate`. A failure turns the
    /// element into an error that the terminal reports unless handled.
    pub fn try_filter<F, E>(self, predicate: F) -> Stream<impl Part<Output = P::Output>>
    where
        F: FnMut(&P::Output) -> std::result::Result<bool, E>,
        E: Into<BoxError>,
    {
        self.with_stage(Filter::new(predicate, CheckedUpdate::Preserve))
    }

    /// Like [`try_filter`](Self::try_filter), but marks the stream checked:
    /// errors must be handled before any terminal operation.
    pub fn filter_checked<F, E>(self, predicate: F) -> Stream<impl Part<Output = P::Output>>
    where
        F: FnMut(&P::Output) -> std::result::Result<bool, E>,
        E: Into<BoxError>,
    {
        self.with_stage(Filter::new(predicate, CheckedUpdate::Set))
    }

    pub fn map<R, F>(self, mut mapper: F) -> Stream<impl Part<Output = R>>
    where
        F: FnMut(P::Output) -> R,
    {
        let mapper = move |value: P::Output| Ok::<_, Infallible>(mapper(value));
        self.with_stage(Map::new(mapper, CheckedUpdate::Preserve))
    }

    /// Map with a fallible function; failures become element errors.
    pub fn try_map<R, F, E>(self, mapper: F) -> Stream<impl Part<Output = R>>
    where
        F: FnMut(P::Output) -> std::result::Result<R, E>,
        E: Into<BoxError>,
    {
        self.with_stage(Map::new(mapper, CheckedUpdate::Preserve))
    }

    /// Like [`try_map`](Self::try_map), but marks the stream checked.
    pub fn map_checked<R, F, E>(self, mapper: F) -> Stream<impl Part<Output = R>>
    where
        F: FnMut(P::Output) -> std::result::Result<R, E>,
        E: Into<BoxError>,
    {
        self.with_stage(Map::new(mapper, CheckedUpdate::Set))
    }

    /// Drop values equal to an earlier one, keeping first-seen order.
    pub fn distinct(self) -> Stream<impl Part<Output = P::Output>>
    where
        P::Output: Eq + Hash + Clone,
    {
        self.with_stage(Distinct::new())
    }

    /// Drop every element carrying errors. Also clears the checked flag, so a
    /// terminal may follow directly.
    pub fn on_error_filter(self) -> Stream<impl Part<Output = P::Output>> {
        self.with_stage(OnErrorFilter)
    }

    /// Replace every error-bearing element with a value computed from its errors.
    pub fn on_error_map<F>(self, mut recover: F) -> Stream<impl Part<Output = P::Output>>
    where
        F: FnMut(&[ElementError]) -> P::Output,
    {
        let recover = move |errors: &[ElementError]| Ok::<_, Infallible>(recover(errors));
        self.with_stage(OnErrorMap::new(recover, CheckedUpdate::Clear))
    }

    /// Fallible recovery; a failed recovery appends its error and keeps the
    /// stream checked.
    pub fn on_error_map_checked<F, E>(self, recover: F) -> Stream<impl Part<Output = P::Output>>
    where
        F: FnMut(&[ElementError]) -> std::result::Result<P::Output, E>,
        E: Into<BoxError>,
    {
        self.with_stage(OnErrorMap::new(recover, CheckedUpdate::Set))
    }

    /// Evaluate the pipeline into `terminal` and return its result.
    pub fn evaluate<Tm>(self, terminal: Tm) -> Result<Tm::Output>
    where
        Tm: TerminalOperation<P::Output>,
    {
        self.part.drive(terminal)?.into_output()
    }

    /// Number of elements. Answered without pulling when the size is known.
    pub fn count(self) -> Result<u64> {
        self.evaluate(CountSink::new())
    }

    /// The first element, pulling nothing beyond it.
    pub fn find_first(self) -> Result<Option<P::Output>> {
        self.evaluate(FindFirstSink::new())
    }

    /// Fold left to right in encounter order; `None` for an empty stream.
    pub fn reduce<F>(self, accumulator: F) -> Result<Option<P::Output>>
    where
        F: FnMut(P::Output, P::Output) -> P::Output,
    {
        self.evaluate(ReduceSink::new(accumulator))
    }

    /// Collect into the empty container returned by `factory`. The factory
    /// runs once evaluation has started and the stream was accepted.
    pub fn to_collection<C, F>(self, factory: F) -> Result<C>
    where
        C: Extend<P::Output>,
        F: FnMut() -> C,
    {
        self.evaluate(CollectSink::new(factory))
    }

    pub fn to_vec(self) -> Result<Vec<P::Output>> {
        self.to_collection(Vec::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Element;
    use crate::error::Error;

    #[test]
    fn test_chain_preserves_order() {
        let result = Stream::of(vec![5, 3, 8, 1])
            .map(|x| x + 1)
            .filter(|x| *x > 2)
            .to_vec()
            .unwrap();
        assert_eq!(result, vec![6, 4, 9]);
    }

    #[test]
    fn test_source_characteristics_reach_terminal() {
        let count = Stream::of(vec!['a', 'b', 'c']).map(|c| c.to_ascii_uppercase()).count();
        assert_eq!(count.unwrap(), 3);

        let filtered = Stream::of(vec![1, 2, 3]).filter(|x| *x != 2).count();
        assert_eq!(filtered.unwrap(), 2);
    }

    #[test]
    fn test_checked_stream_needs_handling() {
        let unhandled = Stream::of(vec!["1", "x"])
            .map_checked(|s| s.parse::<i32>())
            .to_vec();
        assert!(matches!(unhandled, Err(Error::CheckedStream)));

        let handled = Stream::of(vec!["1", "x"])
            .map_checked(|s| s.parse::<i32>())
            .on_error_map(|_| 0)
            .to_vec();
        assert_eq!(handled.unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_rejected_collection_never_builds_container() {
        let mut built = false;
        let result = Stream::of(vec!["1", "x"])
            .map_checked(|s| s.parse::<i32>())
            .to_collection(|| {
                built = true;
                Vec::new()
            });
        assert!(matches!(result, Err(Error::CheckedStream)));
        assert!(!built);
    }

    #[test]
    fn test_failed_checked_recovery_keeps_stream_checked() {
        let result = Stream::from_elements(vec![Element::<i32>::failed(ElementError::new("bad"))])
            .on_error_map_checked(|_| Err::<i32, _>("unrecoverable"))
            .find_first();
        assert!(matches!(result, Err(Error::CheckedStream)));
    }

    #[test]
    fn test_label_and_characteristics_configuration() {
        let stream = Stream::from_iterable(vec![1, 2, 3])
            .label("numbers")
            .characteristics(Characteristics::regular().with_size(Some(3)));
        assert_eq!(stream.count().unwrap(), 3);
    }
}
