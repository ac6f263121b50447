#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Compiled evaluator for daneel constraint expressions.
//!
//! A [`Tape`] is the flat, slot-indexed program a symbolic expression
//! compiles down to: inputs first (one slot per bound symbol, in order),
//! pooled constants next, then one destination slot per operation. The
//! interpreter is a single fetch-dispatch pass, deterministic and
//! allocation-free after warm-up.
//!
//! Tapes serialize to a checksummed binary artifact so recompilation can
//! be skipped across runs; any load anomaly discards the artifact.

mod artifact;
mod cache;
mod program;

#[cfg(test)]
mod cache_tests;

pub use artifact::{decode, encode, Header, MAGIC, VERSION};
pub use cache::{CacheKey, TapeCache};
pub use program::{EvalReport, OpCode, Tape, TapeBuilder, TapeOp, TapeScratch};

/// Errors produced when decoding a tape artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact shorter than its header")]
    TooShort,

    #[error("bad magic bytes")]
    BadMagic,

    #[error("unsupported artifact version {0}")]
    Version(u32),

    #[error("payload length mismatch")]
    Length,

    #[error("payload checksum mismatch")]
    Checksum,

    #[error("payload decode failed: {0}")]
    Decode(#[from] postcard::Error),
}
