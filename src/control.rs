//! Invocation of the `unbound-control` statistics command.
//!
//! The command is run once per collection. Any failure here is fatal for the
//! invocation: no partial metric set is produced.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errors raised while fetching statistics from the control command.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    Exited {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{command} did not finish within {timeout:?}")]
    TimedOut { command: String, timeout: Duration },

    #[error("{command} returned no statistics")]
    EmptyOutput { command: String },

    #[error("I/O error while reading {command} output: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// How to reach the resolver's control interface.
#[derive(Debug, Clone)]
pub struct ControlCommand {
    pub program: String,
    pub conf: String,
    pub host: String,
    pub port: u16,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl ControlCommand {
    /// Server argument in the `host@port` form the control command expects.
    pub fn server(&self) -> String {
        format!("{}@{}", self.host, self.port)
    }

    /// Full argument list passed to the program.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![
            "-c".to_string(),
            self.conf.clone(),
            "-s".to_string(),
            self.server(),
        ];
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Runs the command and returns its stdout.
    pub fn fetch(&self) -> Result<String, CollectError> {
        debug!("Running {} {}", self.program, self.argv().join(" "));

        let mut child = Command::new(&self.program)
            .args(self.argv())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CollectError::Spawn {
                command: self.program.clone(),
                source,
            })?;

        // Drain both pipes off-thread so a chatty child never blocks on a full pipe.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let start = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() >= self.timeout {
                        warn!(
                            "{} still running after {:?}, killing it",
                            self.program, self.timeout
                        );
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(CollectError::TimedOut {
                            command: self.program.clone(),
                            timeout: self.timeout,
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(source) => {
                    return Err(CollectError::Io {
                        command: self.program.clone(),
                        source,
                    })
                }
            }
        };

        let stdout = self.join(stdout)?;
        let stderr = self.join(stderr)?;

        if !status.success() {
            return Err(CollectError::Exited {
                command: self.program.clone(),
                status,
                stderr: stderr.trim().to_string(),
            });
        }

        if stdout.trim().is_empty() {
            return Err(CollectError::EmptyOutput {
                command: self.program.clone(),
            });
        }

        debug!(
            "{} returned {} bytes in {:.2}ms",
            self.program,
            stdout.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(stdout)
    }

    fn join(
        &self,
        handle: Option<thread::JoinHandle<std::io::Result<String>>>,
    ) -> Result<String, CollectError> {
        let Some(handle) = handle else {
            return Ok(String::new());
        };
        let result = handle.join().unwrap_or_else(|_| {
            Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "output reader panicked",
            ))
        });
        result.map_err(|source| CollectError::Io {
            command: self.program.clone(),
            source,
        })
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<std::io::Result<String>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
}
