use molpack::engine::error::EngineError;
use molpack::engine::executor::{ExecutionReport, ExecutionRequest, Executor};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Runs the packing tool as a local subprocess.
///
/// Each run gets a fresh scratch directory: the request's files are
/// written there, the program is started with its working directory
/// inside and the control file on stdin, and the expected outputs are
/// read back before the directory is dropped.
pub struct LocalExecutor;

impl Executor for LocalExecutor {
    fn run(&self, request: &ExecutionRequest) -> Result<ExecutionReport, EngineError> {
        let scratch = tempfile::Builder::new()
            .prefix("molpack-")
            .tempdir()
            .map_err(|e| execution_error(&request.program, format!("scratch directory: {}", e)))?;
        debug!(path = %scratch.path().display(), "Created scratch directory.");

        for (name, content) in &request.files {
            fs::write(scratch.path().join(name), content).map_err(|e| {
                execution_error(&request.program, format!("writing '{}': {}", name, e))
            })?;
        }

        let stdin = File::open(scratch.path().join(&request.stdin_file)).map_err(|e| {
            execution_error(
                &request.program,
                format!("opening '{}': {}", request.stdin_file, e),
            )
        })?;

        debug!(program = %request.program, "Invoking packing tool.");
        let output = Command::new(&request.program)
            .current_dir(scratch.path())
            .stdin(Stdio::from(stdin))
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => execution_error(
                    &request.program,
                    format!("'{}' was not found on PATH", request.program),
                ),
                _ => execution_error(&request.program, e.to_string()),
            })?;

        let mut files = BTreeMap::new();
        for name in &request.expected_outputs {
            match fs::read_to_string(scratch.path().join(name)) {
                Ok(content) => {
                    files.insert(name.clone(), content);
                }
                Err(e) => warn!(file = %name, "Expected output was not readable: {}", e),
            }
        }

        Ok(ExecutionReport {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            files,
        })
    }
}

fn execution_error(program: &str, detail: String) -> EngineError {
    EngineError::Execution {
        program: program.to_string(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell_request(script: &str) -> ExecutionRequest {
        let mut files = BTreeMap::new();
        files.insert("job.sh".to_string(), script.to_string());
        files.insert(
            "input_1.pdb".to_string(),
            "ATOM      1 Ar   UNK     1       0.000   0.000   0.000  1.00  0.00          Ar\nEND\n"
                .to_string(),
        );
        ExecutionRequest {
            program: "sh".to_string(),
            files,
            stdin_file: "job.sh".to_string(),
            expected_outputs: vec!["packed.pdb".to_string()],
        }
    }

    #[cfg(unix)]
    #[test]
    fn runs_a_program_and_harvests_its_output() {
        let request = shell_request("cat input_1.pdb > packed.pdb\n");
        let report = LocalExecutor.run(&request).unwrap();

        assert!(report.success);
        assert!(report.files["packed.pdb"].contains("ATOM"));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_a_report_not_an_error() {
        let request = shell_request("echo 'ERROR bad geometry'\nexit 1\n");
        let report = LocalExecutor.run(&request).unwrap();

        assert!(!report.success);
        assert!(report.stdout.contains("ERROR bad geometry"));
        assert!(report.files.is_empty());
    }

    #[test]
    fn missing_program_names_it_in_the_error() {
        let mut request = shell_request("exit 0\n");
        request.program = "definitely-not-a-real-packer".to_string();

        let err = LocalExecutor.run(&request).unwrap_err();
        assert!(err.to_string().contains("not found on PATH"));
    }
}
