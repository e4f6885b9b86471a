//! Error kinds shared across the crate.
//!
//! Shape, range, and topology errors are contract violations: they are
//! surfaced to the caller immediately and never retried. Serialization
//! errors carry the file origin plus line/token positions so a corrupt
//! brain file can be diagnosed by eye.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Matrix arithmetic with incompatible dimensions.
    #[error("shape mismatch in {op}: left is {left_rows}x{left_cols}, right is {right_rows}x{right_cols}")]
    ShapeMismatch {
        op: &'static str,
        left_rows: usize,
        left_cols: usize,
        right_rows: usize,
        right_cols: usize,
    },

    /// Matrix element access outside the declared bounds.
    #[error("out of range: ({row}, {col}) in a {rows}x{cols} matrix")]
    OutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Network construction or crossover over mismatched layer chains.
    #[error("incompatible topology: {0}")]
    IncompatibleTopology(String),

    /// Corrupt or truncated persisted network file.
    #[error("malformed brain file {origin} (line {line}, token {token}): {reason}")]
    MalformedSerialization {
        origin: String,
        line: usize,
        token: usize,
        reason: String,
    },

    /// Every individual in a generation scored zero, so fitness-proportionate
    /// selection has no distribution to draw from.
    #[error("degenerate fitness: every individual scored zero")]
    DegenerateFitness,

    /// I/O failure at the persistence boundary.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn shape(
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    ) -> Self {
        Error::ShapeMismatch {
            op,
            left_rows: left.0,
            left_cols: left.1,
            right_rows: right.0,
            right_cols: right.1,
        }
    }
}
