//! Unified error hierarchy for the Vamana index engine.
//!
//! The library uses a typed [`VamanaError`] throughout; the CLI binary wraps
//! it (and its own argument-parsing failures) in `anyhow::Result` at the
//! `main()` boundary. No error originating inside the builder or the
//! persistence codec is ever swallowed — the sole exception is the
//! groundtruth engine, which logs and skips queries of an unsupported kind
//! (see [`crate::groundtruth`]).

use thiserror::Error;

/// The library-wide error type.
#[derive(Debug, Error)]
pub enum VamanaError {
    /// Filesystem or stream I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Two vectors (or a vector and a query) had incompatible dimensions.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the operation required.
        expected: usize,
        /// Dimension that was actually supplied.
        actual: usize,
    },

    /// A saved index file was malformed, truncated, or had mismatched counts.
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// A node index was outside `0..N`.
    #[error("index {index} out of range for graph of size {len}")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// The graph or store size it was checked against.
        len: usize,
    },

    /// The base set or query set was empty when it was required to be non-empty.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// GreedySearch was asked to run over a graph with zero nodes.
    #[error("graph has no nodes")]
    EmptyGraph,

    /// A query's kind was neither "no filter" nor "single categorical label".
    #[error("unsupported query kind: {0}")]
    UnsupportedQueryKind(String),

    /// A CLI argument was missing, unknown, or could not be parsed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, VamanaError>;
