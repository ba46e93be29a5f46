//! Core traits and types for the lazypipe library.
//!
//! This module contains the element and metadata types together with the
//! traits that define the evaluation protocol.

pub mod characteristics;
pub mod element;
pub mod traits;

// Re-export core items
pub use characteristics::{Characteristics, CheckedUpdate};
pub use element::Element;
pub use traits::{reject_checked, Operation, Producer, Stage, TerminalOperation};
