//! Core traits for the pull-driven pipeline.
//!
//! A [`Producer`] hands out elements one at a time. Evaluation wires a chain
//! of [`Operation`]s, each owning the next one downstream, and pushes every
//! pulled element through the whole chain before pulling the next.
//! Intermediate stages are written against [`Stage`] and wrapped in a
//! [`ChainedOperation`](crate::processors::ChainedOperation), which supplies
//! the lifecycle forwarding.

use crate::core::{Characteristics, Element};
use crate::error::{Error, Result};

/// The element supplier a pipeline is built from.
///
/// # Examples
///
/// ```rust
/// use lazypipe::core::{Element, Producer};
/// use lazypipe::{Error, Result};
///
/// struct Countdown(u32);
///
/// impl Producer for Countdown {
///     type Item = u32;
///
///     fn has_next(&mut self) -> bool {
///         self.0 > 0
///     }
///
///     fn next_element(&mut self) -> Result<Element<u32>> {
///         if self.0 == 0 {
///             return Err(Error::Exhausted);
///         }
///         self.0 -= 1;
///         Ok(Element::of(self.0 + 1))
///     }
///
///     fn size(&self) -> Option<u64> {
///         Some(u64::from(self.0))
///     }
/// }
/// ```
pub trait Producer {
    /// The type of values this producer yields
    type Item;

    /// Whether another element is available.
    fn has_next(&mut self) -> bool;

    /// Produce the next element. Fails with [`Error::Exhausted`] when nothing is left.
    fn next_element(&mut self) -> Result<Element<Self::Item>>;

    /// Exact number of remaining elements, if known.
    fn size(&self) -> Option<u64> {
        None
    }
}

/// The push-side contract every link of an evaluation chain implements.
///
/// The driver calls `start` once, then `accept_element` for as long as
/// `needs_more_elements` holds and the producer has elements, then `finish`.
pub trait Operation<T> {
    /// Prepare for elements described by `upstream`.
    fn start(&mut self, upstream: Characteristics) -> Result<()>;

    /// Receive one element.
    fn accept_element(&mut self, element: Element<T>) -> Result<()>;

    /// Whether more elements are wanted. Returning `false` short-circuits
    /// everything upstream.
    fn needs_more_elements(&self) -> bool;

    /// No more elements will arrive; flush buffered state.
    fn finish(&mut self) -> Result<()>;
}

/// Stage-specific behavior of an intermediate operation.
///
/// Only `accept_element` is required. The remaining hooks default to
/// leaving characteristics alone and delegating to `downstream`.
pub trait Stage<In> {
    /// Element type handed downstream
    type Out;

    /// Derive the characteristics seen downstream.
    fn modify_characteristics(&self, upstream: Characteristics) -> Characteristics {
        upstream
    }

    /// Observe the upstream characteristics before any element arrives.
    fn on_start(&mut self, _upstream: &Characteristics) {}

    /// Forward, transform, drop or buffer one element.
    fn accept_element<O>(&mut self, element: Element<In>, downstream: &mut O) -> Result<()>
    where
        O: Operation<Self::Out>;

    fn needs_more_elements<O>(&self, downstream: &O) -> bool
    where
        O: Operation<Self::Out>,
    {
        downstream.needs_more_elements()
    }

    /// Push buffered elements before `downstream` is finished.
    fn flush<O>(&mut self, _downstream: &mut O) -> Result<()>
    where
        O: Operation<Self::Out>,
    {
        Ok(())
    }
}

/// An operation at the end of a chain that produces the evaluation's result.
pub trait TerminalOperation<T>: Operation<T> {
    /// The final result type
    type Output;

    /// Extract the result once evaluation has finished.
    fn into_output(self) -> Result<Self::Output>;
}

/// Start check shared by terminals that do not handle element errors.
pub fn reject_checked(upstream: &Characteristics) -> Result<()> {
    if upstream.is_checked() {
        tracing::debug!("terminal operation rejected a checked stream");
        return Err(Error::CheckedStream);
    }
    Ok(())
}
