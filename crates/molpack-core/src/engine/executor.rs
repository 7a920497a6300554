//! The seam between the engine and the external packing tool.
//!
//! The engine never spawns processes itself. It hands an
//! [`ExecutionRequest`] describing the tool's scratch files to an
//! [`Executor`] and gets back an [`ExecutionReport`] with the captured
//! streams and any harvested output files. The CLI supplies an executor
//! running the tool locally; tests supply canned reports.

use super::error::EngineError;
use crate::core::io::job::JobInput;
use std::collections::BTreeMap;

/// Everything an executor needs to run one packing job.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    /// Name or path of the program to invoke.
    pub program: String,
    /// Scratch files to materialize before the run, name to content.
    pub files: BTreeMap<String, String>,
    /// Name of the file (within `files`) fed to the program on stdin.
    pub stdin_file: String,
    /// Files the engine expects the program to leave behind.
    pub expected_outputs: Vec<String>,
}

impl ExecutionRequest {
    /// Wraps an assembled job for a given program.
    pub fn from_job(program: impl Into<String>, job: JobInput) -> Self {
        Self {
            program: program.into(),
            files: job.files,
            stdin_file: job.control_file,
            expected_outputs: vec![job.output_file],
        }
    }
}

/// What came back from one invocation of the packing tool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    /// Whether the program exited with a zero status.
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// Contents of the expected outputs that were actually produced.
    pub files: BTreeMap<String, String>,
}

/// Runs external packing programs.
pub trait Executor {
    /// Runs the program described by `request` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Execution`] only when the program could
    /// not be run at all (not installed, scratch directory failure). A
    /// program that runs and fails is reported through
    /// [`ExecutionReport::success`] so the caller can attach context
    /// from the captured streams.
    fn run(&self, request: &ExecutionRequest) -> Result<ExecutionReport, EngineError>;
}
