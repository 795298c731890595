use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::error::ProcessError;
use super::runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner, ProcessStream};

type ArgsMatcher = Box<dyn Fn(&[String]) -> bool + Send + Sync>;

/// Expectation-based runner used to test pipeline sequencing without FSL installed.
///
/// Expectations are matched in registration order; the first one whose program
/// (and argument matcher, if any) fits the command supplies the response.
#[derive(Clone, Default)]
pub struct MockProcessRunner {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    expectations: Vec<Expectation>,
    calls: Vec<ProcessCommand>,
}

struct Expectation {
    program: String,
    matcher: Option<ArgsMatcher>,
    response: ProcessOutput,
}

impl Expectation {
    fn matches(&self, command: &ProcessCommand) -> bool {
        self.program == command.program
            && self.matcher.as_ref().map_or(true, |m| m(&command.args))
    }
}

/// Pending expectation; registered by [`MockCommandConfig::finish`]
pub struct MockCommandConfig {
    runner: MockProcessRunner,
    expectation: Expectation,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn expect_command(&mut self, program: &str) -> MockCommandConfig {
        MockCommandConfig {
            runner: self.clone(),
            expectation: Expectation {
                program: program.to_string(),
                matcher: None,
                response: ProcessOutput {
                    status: ExitStatus::Success,
                    stdout: String::new(),
                    stderr: String::new(),
                    duration: Duration::ZERO,
                },
            },
        }
    }

    /// True when `program` was invoked exactly `times` times
    pub fn verify_called(&self, program: &str, times: usize) -> bool {
        self.state().calls.iter().filter(|c| c.program == program).count() == times
    }

    /// Every command received so far, in call order
    pub fn calls(&self) -> Vec<ProcessCommand> {
        self.state().calls.clone()
    }

    pub fn called_programs(&self) -> Vec<String> {
        self.state().calls.iter().map(|c| c.program.clone()).collect()
    }

    /// Drop all expectations and recorded calls
    pub fn reset(&mut self) {
        let mut state = self.state();
        state.expectations.clear();
        state.calls.clear();
    }

    fn respond(&self, command: &ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        let mut state = self.state();
        state.calls.push(command.clone());

        state
            .expectations
            .iter()
            .find(|e| e.matches(command))
            .map(|e| e.response.clone())
            .ok_or_else(|| {
                ProcessError::MockExpectationNotMet(format!(
                    "no expectation for {}",
                    command.command_line()
                ))
            })
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        self.respond(&command)
    }

    async fn run_streaming(&self, command: ProcessCommand) -> Result<ProcessStream, ProcessError> {
        let output = self.respond(&command)?;
        let lines = |text: &str| -> Vec<Result<String, ProcessError>> {
            text.lines().map(|l| Ok(l.to_string())).collect()
        };

        Ok(ProcessStream {
            stdout: Box::pin(futures::stream::iter(lines(&output.stdout))),
            stderr: Box::pin(futures::stream::iter(lines(&output.stderr))),
            status: Box::pin(futures::future::ready(Ok(output.status))),
        })
    }
}

impl MockCommandConfig {
    pub fn with_args<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.expectation.matcher = Some(Box::new(matcher));
        self
    }

    pub fn returns_stdout(mut self, stdout: &str) -> Self {
        self.expectation.response.stdout = stdout.to_string();
        self
    }

    pub fn returns_stderr(mut self, stderr: &str) -> Self {
        self.expectation.response.stderr = stderr.to_string();
        self
    }

    pub fn returns_exit_code(mut self, code: i32) -> Self {
        self.expectation.response.status = match code {
            0 => ExitStatus::Success,
            code => ExitStatus::Error(code),
        };
        self
    }

    pub fn returns_signal(mut self, signal: i32) -> Self {
        self.expectation.response.status = ExitStatus::Signal(signal);
        self
    }

    pub fn returns_success(self) -> Self {
        self.returns_exit_code(0)
    }

    pub fn finish(self) {
        self.runner.state().expectations.push(self.expectation);
    }
}
