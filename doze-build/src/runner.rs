//! Process execution behind a trait, so the engine is testable without a
//! toolchain on the machine.

use crate::error::{BuildError, BuildResult};
use std::process::Command;
use tracing::debug;

/// Runs one synthesized command to completion.
///
/// Implementations are shared across compile waves, so they must be
/// usable from several blocking tasks at once.
pub trait CommandRunner: Send + Sync {
    /// Run `argv` (program first) and report its exit status.
    ///
    /// A process killed by a signal has no exit code and is reported as
    /// status -1, which callers treat like any other nonzero status.
    fn run(&self, argv: &[String]) -> BuildResult<i32>;
}

/// Runner backed by real child processes.
///
/// Stdio is inherited: compiler diagnostics go straight to the user's
/// terminal. There is no timeout and no cancellation; a hung compiler
/// hangs the build.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> BuildResult<i32> {
        let program = argv.first().ok_or(BuildError::CompilerNotSet)?;
        debug!("running: {}", argv.join(" "));
        let status = Command::new(program).args(&argv[1..]).status()?;
        Ok(status.code().unwrap_or(-1))
    }
}

#[cfg(test)]
pub(crate) struct ScriptedRunner {
    calls: std::sync::Mutex<Vec<Vec<String>>>,
    decide: Box<dyn Fn(&[String]) -> i32 + Send + Sync>,
}

#[cfg(test)]
impl ScriptedRunner {
    /// Runner that accepts every command.
    pub(crate) fn ok() -> Self {
        Self::with(|_| 0)
    }

    /// Runner that decides each exit status from the argv.
    pub(crate) fn with(decide: impl Fn(&[String]) -> i32 + Send + Sync + 'static) -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
            decide: Box::new(decide),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl CommandRunner for ScriptedRunner {
    fn run(&self, argv: &[String]) -> BuildResult<i32> {
        self.calls.lock().unwrap().push(argv.to_vec());
        Ok((self.decide)(argv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_runner_reports_exit_codes() {
        let runner = SystemRunner;
        let ok = runner
            .run(&["sh".to_string(), "-c".to_string(), "exit 0".to_string()])
            .unwrap();
        assert_eq!(ok, 0);

        let failed = runner
            .run(&["sh".to_string(), "-c".to_string(), "exit 3".to_string()])
            .unwrap();
        assert_eq!(failed, 3);
    }

    #[test]
    fn system_runner_rejects_empty_argv() {
        let runner = SystemRunner;
        assert!(runner.run(&[]).is_err());
    }

    #[test]
    fn missing_program_is_an_io_error() {
        let runner = SystemRunner;
        let result = runner.run(&["doze-no-such-binary-on-path".to_string()]);
        assert!(matches!(result, Err(BuildError::Io(_))));
    }

    #[test]
    fn scripted_runner_records_calls() {
        let runner = ScriptedRunner::with(|argv| i32::from(argv.contains(&"boom".to_string())));
        assert_eq!(runner.run(&["ok".to_string()]).unwrap(), 0);
        assert_eq!(runner.run(&["boom".to_string()]).unwrap(), 1);
        assert_eq!(runner.calls().len(), 2);
    }
}
