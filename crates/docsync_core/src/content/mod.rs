//! Content model adapter between editing-surface deltas and stored JSON.
//!
//! # Responsibility
//! - Translate `Delta` values to and from the stored operation array.
//!
//! # Invariants
//! - Pure and synchronous; no I/O.
//! - `serialize(deserialize(x)) == x` for every well-formed stored array.

pub mod codec;
