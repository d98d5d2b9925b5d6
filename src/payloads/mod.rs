//! Fixed catalog of file-upload attack payloads.
//!
//! The catalog is a pure function of nothing: [`generate`] always yields the
//! same entries in the same order. [`corpus`] hands out one lazily built
//! process-wide copy so mutators don't rebuild the 10 MB entry per run.

pub mod corpus;
pub mod shells;

use std::sync::LazyLock;

pub use corpus::{generate, PayloadCategory, PayloadEntry, LARGE_FILE_SIZE};

static CORPUS: LazyLock<Vec<PayloadEntry>> = LazyLock::new(generate);

/// Shared read-only catalog.
pub fn corpus() -> &'static [PayloadEntry] {
    CORPUS.as_slice()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_corpus_matches_generate() {
        assert_eq!(corpus().len(), generate().len());
        assert_eq!(corpus()[5], generate()[5]);
        assert!(std::ptr::eq(corpus(), corpus()));
    }
}
