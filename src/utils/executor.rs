//! Command execution abstraction for testability
//!
//! Drivers never spawn processes directly; they hand an [`Invocation`] to a
//! [`CommandExecutor`], so tests can record and script tool behaviour.

use super::command::{Invocation, TransferError};

/// Abstraction for command execution, enabling mocking in tests
pub trait CommandExecutor: Send + Sync {
    /// Run one external command to completion
    fn execute(&self, invocation: &Invocation) -> Result<(), TransferError>;
}

/// Default implementation using real subprocess calls
#[derive(Debug, Clone, Default)]
pub struct RealExecutor;

impl RealExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for RealExecutor {
    fn execute(&self, invocation: &Invocation) -> Result<(), TransferError> {
        super::command::run_command(invocation)
    }
}

/// A mock executor for testing that records calls and returns configured responses
/// Available for use in external test crates
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Response configuration for mock
    #[derive(Clone, Debug, Default)]
    pub enum MockResponse {
        #[default]
        Success,
        Failure { exit_code: i32 },
        SpawnFailure,
        Timeout,
    }

    /// Mock executor for testing
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Recorded command invocations
        calls: Arc<Mutex<Vec<Invocation>>>,
        /// Pre-configured responses: program name -> response
        responses: Arc<Mutex<HashMap<String, MockResponse>>>,
        /// Default response when no specific response is configured
        default_response: Arc<Mutex<MockResponse>>,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Configure a response for a specific program
        pub fn expect(self, program: &str, response: MockResponse) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(program.to_string(), response);
            self
        }

        /// Set the default response for unconfigured programs
        pub fn with_default_response(self, response: MockResponse) -> Self {
            *self.default_response.lock().unwrap() = response;
            self
        }

        /// Get all recorded calls
        pub fn get_calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }

        /// Check if a program was called
        pub fn was_called(&self, program: &str) -> bool {
            self.call_count(program) > 0
        }

        /// Get number of calls to a specific program
        pub fn call_count(&self, program: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.program == program)
                .count()
        }

        fn get_response(&self, program: &str) -> MockResponse {
            self.responses
                .lock()
                .unwrap()
                .get(program)
                .cloned()
                .unwrap_or_else(|| self.default_response.lock().unwrap().clone())
        }
    }

    impl CommandExecutor for MockExecutor {
        fn execute(&self, invocation: &Invocation) -> Result<(), TransferError> {
            self.calls.lock().unwrap().push(invocation.clone());

            let program = invocation.program.clone();
            match self.get_response(&invocation.program) {
                MockResponse::Success => Ok(()),
                MockResponse::Failure { exit_code } => Err(TransferError::ExitStatus {
                    program,
                    code: Some(exit_code),
                }),
                MockResponse::SpawnFailure => Err(TransferError::Spawn {
                    program,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock spawn failure"),
                }),
                MockResponse::Timeout => Err(TransferError::Timeout {
                    program,
                    timeout: invocation.timeout.unwrap_or(Duration::ZERO),
                }),
            }
        }
    }
}
