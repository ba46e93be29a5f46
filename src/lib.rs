//! # Lazy, pull-driven stream pipelines for Rust
//!
//! This crate provides composable pipelines (filter, map, distinct, error
//! handling) that are evaluated only when a terminal operation asks for a
//! result. Failures of user functions become data: the failing element turns
//! into an error-bearing [`Element`](core::Element) that flows on until a stage
//! handles it or a terminal reports it.
//!
//! ## Core Concepts
//!
//! - **Producer**: Hands out elements one at a time, optionally with a known size
//! - **Stage**: Filters, transforms, deduplicates or recovers elements
//! - **Terminal operation**: Triggers evaluation and produces the result
//! - **Characteristics**: Size, distinctness and the checked flag, rewritten by every stage
//!
//! Evaluation pushes each element through the whole chain before pulling the
//! next one, and stops pulling as soon as the chain needs nothing more.
//!
//! ## Example
//!
//! ```rust
//! use lazypipe::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let parsed = Stream::of(vec!["1", "two", "3"])
//!         .map_checked(|s| s.parse::<i32>())
//!         .on_error_map(|_errors| -1)
//!         .to_vec()?;
//!     assert_eq!(parsed, vec![1, -1, 3]);
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod error;
pub mod pipeline;
pub mod processors;
pub mod sinks;
pub mod sources;

// Re-export commonly used items
pub mod prelude {
    pub use crate::core::{Characteristics, Element, Operation, Producer, Stage, TerminalOperation};
    pub use crate::error::{ElementError, Error, Result};
    pub use crate::pipeline::{Part, Stream};
    pub use crate::sources::*;
}

// Re-export main error type
pub use error::{ElementError, Error, Result};
pub use pipeline::Stream;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
