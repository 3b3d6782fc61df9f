//! Transaction filters and the chain that runs them
//!
//! Filters run in registration order. Each one sees the transaction as left
//! by the previous filter and may either pass it through or replace it with
//! a [`TransactionSpec`] against the same starting document.

use tracing::{debug, warn};

use super::transaction::{Transaction, TransactionSpec};

/// What a filter decided for a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Leave the transaction as it is
    PassThrough,
    /// Replace the transaction with this spec
    Rewrite(TransactionSpec),
}

/// An interceptor in the transaction chain
pub trait TransactionFilter {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Inspects the transaction and decides its fate
    fn filter(&self, tr: &Transaction) -> FilterOutcome;
}

/// Ordered list of transaction filters
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn TransactionFilter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter; it runs after every filter already registered
    pub fn push(&mut self, filter: impl TransactionFilter + 'static) {
        self.filters.push(Box::new(filter));
    }

    /// Builder-style [`push`](Self::push)
    pub fn with(mut self, filter: impl TransactionFilter + 'static) -> Self {
        self.push(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Runs every filter over the transaction.
    ///
    /// A rewrite that does not validate against the starting document is
    /// discarded and the previous transaction is kept.
    pub fn resolve(&self, tr: Transaction) -> Transaction {
        let mut current = tr;

        for filter in &self.filters {
            match filter.filter(&current) {
                FilterOutcome::PassThrough => {
                    debug!(filter = filter.name(), "Transaction passed through");
                }
                FilterOutcome::Rewrite(spec) => {
                    match Transaction::from_spec(current.start_doc(), spec) {
                        Ok(rewritten) => {
                            debug!(
                                filter = filter.name(),
                                changes = rewritten.changes().len(),
                                "Transaction rewritten"
                            );
                            current = rewritten;
                        }
                        Err(e) => {
                            warn!(filter = filter.name(), error = %e, "Dropping invalid rewrite");
                        }
                    }
                }
            }
        }

        current
    }
}
