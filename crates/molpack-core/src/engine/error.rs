use crate::core::io::job::JobError;
use crate::core::io::pdb::PdbError;
use thiserror::Error;

/// Errors surfaced by the packing engine.
///
/// The variants separate who is at fault: `Config` and `EmptyInput`
/// point back at the caller's request, `Execution` at the external
/// packing tool or its environment, `Format` at a structure file, and
/// `Internal` at a broken invariant between plan and output.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request contradicts itself or holds an unusable value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The request describes a system with nothing in it to pack.
    #[error("Nothing to pack: {0}")]
    EmptyInput(String),

    /// The external packing tool failed to run or reported failure.
    #[error("External execution of '{program}' failed: {detail}")]
    Execution { program: String, detail: String },

    /// A structure file could not be read or written.
    #[error("Structure format error: {source}")]
    Format {
        #[from]
        source: PdbError,
    },

    /// The engine caught itself out: plan and output disagree.
    #[error("Internal consistency failure: {0}")]
    Internal(String),
}

impl From<JobError> for EngineError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Pdb(source) => Self::Format { source },
            JobError::Inconsistent(message) => Self::Internal(message),
        }
    }
}
