//! # Editor Model
//!
//! In-memory stand-ins for the host editor's primitives: document text,
//! change sets with position mapping, transactions and the filter chain
//! that intercepts them before they are committed.
//!
//! ## Key Types
//!
//! - [`Text`] - Document buffer with line lookup
//! - [`ChangeSet`] - Validated edits against one document
//! - [`PositionMap`] - Offset translation between old and new documents
//! - [`Transaction`] - A proposed edit with selection and annotations
//! - [`FilterChain`] - Ordered interceptors over transactions

mod change;
mod filter;
mod text;
mod transaction;

pub use change::{Bias, Change, ChangeSet, ChangeSpec, EditError, PositionMap};
pub use filter::{FilterChain, FilterOutcome, TransactionFilter};
pub use text::{Line, Text};
pub use transaction::{Annotation, Selection, Transaction, TransactionSpec};
