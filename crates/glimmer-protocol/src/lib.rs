//! Protocol definitions for glimmer client-side tracing.
//!
//! This crate defines span identity, W3C Trace Context propagation, the span
//! record itself, and the JSON envelope a finished span is exported as.

pub mod envelope;
pub mod span;
pub mod trace_context;

pub use envelope::*;
pub use span::*;
pub use trace_context::*;
