//! Long-lived R interpreter child used for tokenizing sources.
//!
//! One `Agent` owns one `Rscript` process fed through a framing protocol
//! (see [`protocol`]). Every command runs under a watchdog: if the child
//! does not answer within the configured timeout it is killed and reaped,
//! and the next command transparently starts a fresh child. `issue` takes
//! `&mut self`, so one call is in flight per agent at a time.

pub mod protocol;

use std::io::{BufReader, BufWriter, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rscan_matcher::{Token, TokenList};
use serde::Serialize;
use wait_timeout::ChildExt;

use self::protocol::{Markers, Record, RecordReader};

/// How long `stop` waits for a clean exit after `quit` before killing.
const STOP_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("failed to start interpreter '{interpreter}': {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    #[error("interpreter i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("interpreter killed during '{op}' by watchdog timeout")]
    Killed { op: String },

    #[error("interpreter reported: {message}")]
    Interpreter { message: String },

    #[error("protocol violation: {reason}")]
    Protocol { reason: String },
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AgentStats {
    pub starts: u64,
    pub kills: u64,
    pub errors: u64,
    pub ok: u64,
}

impl AgentStats {
    pub fn add(&mut self, other: &AgentStats) {
        self.starts += other.starts;
        self.kills += other.kills;
        self.errors += other.errors;
        self.ok += other.ok;
    }
}

impl std::fmt::Display for AgentStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "start: {}, kill: {}, err: {}, ok: {}",
            self.starts, self.kills, self.errors, self.ok
        )
    }
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub interpreter: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> AgentConfig {
        AgentConfig {
            interpreter: "Rscript".to_string(),
            args: vec!["--vanilla".into(), "--slave".into(), "-".into()],
            timeout: Duration::from_secs(40),
        }
    }
}

impl AgentConfig {
    pub fn with_interpreter(interpreter: &str) -> AgentConfig {
        AgentConfig {
            interpreter: interpreter.to_string(),
            ..AgentConfig::default()
        }
    }
}

/// Running child plus its pipes. The `Child` sits behind a shared mutex so
/// the watchdog thread can kill it while the caller is blocked reading.
struct AgentChild {
    handle: Arc<Mutex<Child>>,
    stdin: BufWriter<ChildStdin>,
    reader: RecordReader<BufReader<ChildStdout>>,
}

pub struct Agent {
    config: AgentConfig,
    pub stats: AgentStats,
    child: Option<AgentChild>,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Agent {
        Agent {
            config,
            stats: AgentStats::default(),
            child: None,
        }
    }

    fn ensure_started(&mut self) -> Result<(), AgentError> {
        if self.child.is_some() {
            return Ok(());
        }

        let mut child = Command::new(&self.config.interpreter)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| AgentError::Spawn {
                interpreter: self.config.interpreter.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| AgentError::Protocol {
            reason: "child stdin unavailable".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| AgentError::Protocol {
            reason: "child stdout unavailable".to_string(),
        })?;

        let markers = Markers::generate();
        let mut stdin = BufWriter::new(stdin);
        stdin.write_all(protocol::prelude(&markers).as_bytes())?;
        stdin.flush()?;

        log::debug!("started interpreter '{}'", self.config.interpreter);
        self.stats.starts += 1;
        self.child = Some(AgentChild {
            handle: Arc::new(Mutex::new(child)),
            stdin,
            reader: RecordReader::new(BufReader::new(stdout), markers),
        });
        Ok(())
    }

    /// Issue one command and collect its data rows. On watchdog timeout or
    /// broken i/o the child is killed and reaped; the next call respawns.
    pub fn issue(&mut self, op: &str, args: &[&str]) -> Result<Vec<Vec<String>>, AgentError> {
        self.ensure_started()?;
        let command = protocol::encode_command(op, args);

        let (done_tx, done_rx) = mpsc::channel::<()>();
        let watchdog = {
            let child = self.child.as_ref().ok_or_else(|| AgentError::Protocol {
                reason: "agent not running".to_string(),
            })?;
            let handle = Arc::clone(&child.handle);
            let timeout = self.config.timeout;
            thread::spawn(move || match done_rx.recv_timeout(timeout) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!("killing interpreter after {timeout:?} watchdog timeout");
                    if let Ok(mut guard) = handle.lock() {
                        let _ = guard.kill();
                    }
                    true
                }
            })
        };

        let outcome = self.exchange(&command);
        let _ = done_tx.send(());
        let timed_out = watchdog.join().unwrap_or(false);

        if timed_out {
            self.discard();
            return Err(AgentError::Killed { op: op.to_string() });
        }
        match outcome {
            Ok(rows) => {
                self.stats.ok += 1;
                Ok(rows)
            }
            Err(err @ AgentError::Interpreter { .. }) => {
                // The child survived its own error and stays usable.
                Err(err)
            }
            Err(err) => {
                self.discard();
                Err(err)
            }
        }
    }

    fn exchange(&mut self, command: &str) -> Result<Vec<Vec<String>>, AgentError> {
        let Some(child) = self.child.as_mut() else {
            return Err(AgentError::Protocol {
                reason: "agent not running".to_string(),
            });
        };
        child.stdin.write_all(command.as_bytes())?;
        child.stdin.flush()?;

        let mut rows = Vec::new();
        let mut last_error: Option<String> = None;
        loop {
            match child.reader.read_record()? {
                Record::Data(fields) => rows.push(fields),
                Record::Error(message) => {
                    self.stats.errors += 1;
                    last_error = Some(message);
                }
                Record::Done => {
                    return match last_error {
                        Some(message) => Err(AgentError::Interpreter { message }),
                        None => Ok(rows),
                    };
                }
            }
        }
    }

    /// Kill and reap the current child, if any.
    fn discard(&mut self) {
        if let Some(child) = self.child.take() {
            let mut guard = match child.handle.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let _ = guard.kill();
            let _ = guard.wait();
            self.stats.kills += 1;
            log::info!("killed interpreter ({})", self.stats);
        }
    }

    /// Ask the child to quit and reap it, killing on overrun.
    pub fn stop(&mut self) -> Result<(), AgentError> {
        let Some(child) = self.child.take() else {
            return Ok(());
        };
        let AgentChild {
            handle, mut stdin, ..
        } = child;
        let _ = stdin.write_all(protocol::encode_command("quit", &[]).as_bytes());
        let _ = stdin.flush();
        drop(stdin);

        let mut guard = match handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.wait_timeout(STOP_GRACE)?.is_none() {
            guard.kill()?;
            guard.wait()?;
            self.stats.kills += 1;
        }
        Ok(())
    }

    pub fn ping(&mut self) -> Result<(), AgentError> {
        let rows = self.issue("ping", &[])?;
        match rows.first().and_then(|row| row.first()) {
            Some(text) if text == "pong" => Ok(()),
            other => Err(AgentError::Protocol {
                reason: format!("unexpected ping reply: {other:?}"),
            }),
        }
    }

    /// Tokenize R source text; `name` tags every returned token.
    pub fn parse_text(&mut self, name: &str, text: &str) -> Result<TokenList, AgentError> {
        let rows = self.issue("parse_text", &[name, text])?;
        rows_to_tokens(rows)
    }

    /// Tokenize the R file at `path`; `name` tags every returned token.
    pub fn parse_file(&mut self, name: &str, path: &str) -> Result<TokenList, AgentError> {
        let rows = self.issue("parse_file", &[name, path])?;
        rows_to_tokens(rows)
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::warn!("error stopping interpreter: {err}");
        }
    }
}

fn rows_to_tokens(rows: Vec<Vec<String>>) -> Result<TokenList, AgentError> {
    rows.into_iter()
        .map(|row| {
            let mut fields = row.into_iter();
            match (fields.next(), fields.next(), fields.next()) {
                (Some(name), Some(kind), Some(text)) => Ok(Token::new(name, kind, text)),
                _ => Err(AgentError::Protocol {
                    reason: "parse row with fewer than 3 fields".to_string(),
                }),
            }
        })
        .collect()
}
