//! Deduplication stage.

use std::collections::HashSet;
use std::hash::Hash;

use crate::core::{Characteristics, Element, Operation, Stage};
use crate::error::Result;

/// Drops value elements equal to one already seen, keeping first-seen order.
///
/// Error-bearing elements are never deduplicated. Elements are held back
/// until `finish` unless upstream already declares itself distinct, in which
/// case the stage forwards straight through.
pub struct Distinct<T> {
    buffer: Option<Buffer<T>>,
}

struct Buffer<T> {
    seen: HashSet<Element<T>>,
    elements: Vec<Element<T>>,
}

impl<T> Distinct<T> {
    pub fn new() -> Self {
        Self { buffer: None }
    }
}

impl<T> Default for Distinct<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Stage<T> for Distinct<T>
where
    T: Eq + Hash + Clone,
{
    type Out = T;

    fn modify_characteristics(&self, upstream: Characteristics) -> Characteristics {
        upstream.with_unknown_size().with_distinct(true)
    }

    fn on_start(&mut self, upstream: &Characteristics) {
        self.buffer = (!upstream.is_distinct()).then(|| Buffer {
            seen: HashSet::new(),
            elements: Vec::new(),
        });
    }

    fn accept_element<O>(&mut self, element: Element<T>, downstream: &mut O) -> Result<()>
    where
        O: Operation<T>,
    {
        let Some(buffer) = self.buffer.as_mut() else {
            return downstream.accept_element(element);
        };
        if element.has_errors() || buffer.seen.insert(element.clone()) {
            buffer.elements.push(element);
        }
        Ok(())
    }

    fn flush<O>(&mut self, downstream: &mut O) -> Result<()>
    where
        O: Operation<T>,
    {
        let Some(buffer) = self.buffer.take() else {
            return Ok(());
        };
        tracing::trace!(buffered = buffer.elements.len(), "flushing distinct elements");
        for element in buffer.elements {
            if !downstream.needs_more_elements() {
                break;
            }
            downstream.accept_element(element)?;
        }
        Ok(())
    }
}
