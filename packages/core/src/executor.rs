//! Command execution abstraction.
//!
//! Every external tool (rclone, the unmount utility, the desktop opener) is
//! launched through a [`CommandRunner`], so actions can be exercised without
//! touching the system.

use std::process::Command;

use crate::error::{Error, IoResultExt, Result};

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or None if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external programs to completion.
pub trait CommandRunner {
    /// Runs `program` with `args`, capturing its output.
    ///
    /// Only a failure to start the program is an error; a non-zero exit is
    /// reported through [`CommandOutput::code`].
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// Runner backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .output()
            .command_context(program)?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Runs a short-lived helper and logs everything it printed.
///
/// `label` names the helper in the log. A non-zero exit becomes
/// [`Error::CommandExit`] carrying the captured stderr.
pub fn run_helper(
    runner: &dyn CommandRunner,
    label: &str,
    program: &str,
    args: &[String],
) -> Result<CommandOutput> {
    tracing::info!("Launching {}: {} {}", label, program, args.join(" "));

    let output = runner.run(program, args)?;

    if !output.success() {
        let code = output.code.unwrap_or(-1);
        tracing::error!("Process {} exited with error {}", label, code);
        if !output.stdout.is_empty() {
            tracing::info!("{}", output.stdout.trim_end());
        }
        return Err(Error::CommandExit {
            command: label.to_string(),
            code,
            stderr: output.stderr.trim_end().to_string(),
        });
    }

    if !output.stdout.is_empty() {
        tracing::info!("{}: {}", label, output.stdout.trim_end());
    }
    if !output.stderr.is_empty() {
        tracing::error!("{}: {}", label, output.stderr.trim_end());
    }

    Ok(output)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records every invocation and answers with a canned output.
    #[derive(Debug, Default)]
    pub struct RecordingRunner {
        pub calls: RefCell<Vec<(String, Vec<String>)>>,
        pub failing: Vec<String>,
    }

    impl RecordingRunner {
        pub fn failing(programs: &[&str]) -> Self {
            Self {
                failing: programs.iter().map(|p| p.to_string()).collect(),
                ..Default::default()
            }
        }

        pub fn programs(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(p, _)| p.clone()).collect()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
            self.calls
                .borrow_mut()
                .push((program.to_string(), args.to_vec()));
            if self.failing.iter().any(|p| p == program) {
                return Ok(CommandOutput {
                    code: Some(1),
                    stdout: String::new(),
                    stderr: format!("{}: failed", program),
                });
            }
            Ok(CommandOutput {
                code: Some(0),
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_run_helper_success() {
        let runner = RecordingRunner::default();
        let output = run_helper(&runner, "open", "xdg-open", &["/tmp".to_string()]).unwrap();
        assert!(output.success());
        assert_eq!(runner.programs(), vec!["xdg-open"]);
    }

    #[test]
    fn test_run_helper_nonzero_exit() {
        let runner = RecordingRunner::failing(&["fusermount"]);
        let err = run_helper(&runner, "unmount", "fusermount", &[]).unwrap_err();
        match err {
            Error::CommandExit {
                command,
                code,
                stderr,
            } => {
                assert_eq!(command, "unmount");
                assert_eq!(code, 1);
                assert_eq!(stderr, "fusermount: failed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_system_runner_missing_program() {
        let err = SystemRunner
            .run("/nonexistent/definitely-not-a-program", &[])
            .unwrap_err();
        assert!(matches!(err, Error::CommandExecution { .. }));
    }

    #[test]
    fn test_system_runner_captures_output() {
        let output = SystemRunner
            .run("sh", &["-c".to_string(), "echo hi; exit 3".to_string()])
            .unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout, "hi\n");
        assert!(!output.success());
    }
}
