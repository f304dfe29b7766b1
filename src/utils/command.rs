//! Utilities for running transfer tools with streamed output and timeouts

use std::collections::BTreeMap;
use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, error, info};

/// Failure of a single external command
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("Command '{program}' not found: {reason}")]
    NotFound { program: String, reason: String },

    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{program}' failed with exit code {code:?}")]
    ExitStatus { program: String, code: Option<i32> },

    #[error("Command '{program}' timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("Failed to read output of {program}: {source}")]
    Output {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// One external command: program, argument vector, extra environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env.extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Run a command to completion, logging stdout at DEBUG and stderr at INFO
/// line by line while it runs.
pub fn run_command(invocation: &Invocation) -> Result<(), TransferError> {
    let program = which::which(&invocation.program).map_err(|e| TransferError::NotFound {
        program: invocation.program.clone(),
        reason: e.to_string(),
    })?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| TransferError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

    debug!("Running command: {}", invocation);

    let status = runtime.block_on(async {
        let mut child = tokio::process::Command::new(&program)
            .args(&invocation.args)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TransferError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let completion = async {
            let (out, err, status) = tokio::join!(
                stream_lines(stdout, OutputStream::Stdout),
                stream_lines(stderr, OutputStream::Stderr),
                child.wait()
            );
            out.and(err).and(status)
        };

        let result = match invocation.timeout {
            Some(timeout) => tokio::time::timeout(timeout, completion)
                .await
                .map_err(|_| TransferError::Timeout {
                    program: invocation.program.clone(),
                    timeout,
                })?,
            None => completion.await,
        };

        result.map_err(|source| TransferError::Output {
            program: invocation.program.clone(),
            source,
        })
    })?;

    check_status(&invocation.program, status)
}

fn check_status(program: &str, status: ExitStatus) -> Result<(), TransferError> {
    if status.success() {
        debug!("Command '{}' completed successfully", program);
        return Ok(());
    }

    error!("Command failed: {} ({})", program, status);
    Err(TransferError::ExitStatus {
        program: program.to_string(),
        code: status.code(),
    })
}

#[derive(Clone, Copy)]
enum OutputStream {
    Stdout,
    Stderr,
}

async fn stream_lines<R>(reader: Option<R>, stream: OutputStream) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(());
    };

    // Tool output echoes file names, which need not be UTF-8
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(());
        }
        let text = String::from_utf8_lossy(&line);
        match stream {
            OutputStream::Stdout => debug!("{}", text.trim_end()),
            OutputStream::Stderr => info!("{}", text.trim_end()),
        }
    }
}
