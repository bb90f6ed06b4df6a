//! Error type for the ROOT reader.

use thiserror::Error;

/// Errors raised while decoding a ROOT file.
#[derive(Error, Debug)]
pub enum RootError {
    #[error("not a ROOT file (bad magic)")]
    BadMagic,

    #[error("buffer underflow at offset {offset}: need {need} bytes, have {have}")]
    BufferUnderflow {
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("decompression failed: {0}")]
    Decompression(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("tree not found: {0}")]
    TreeNotFound(String),

    #[error("branch not found: {0}")]
    BranchNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RootError>;
