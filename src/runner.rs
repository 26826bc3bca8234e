//! Subprocess runner for `arduino-cli`.
//!
//! Every action inox performs ends up here: compile and upload stream their
//! output line by line, listings capture stdout as JSON, and port detection
//! runs with a deadline.

use colored::*;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Longest stderr excerpt carried in a [`CliError::Failed`].
const DETAIL_LIMIT: usize = 400;

#[derive(Debug, Error)]
pub enum CliError {
    /// The executable could not be spawned at all
    #[error("{0} not found. Install arduino-cli or set `cli_path` in settings.toml")]
    NotFound(String),

    #[error("`{command}` failed with {}{}", describe_exit(.code), detail_suffix(.detail))]
    Failed {
        command: String,
        code: Option<i32>,
        detail: String,
    },

    #[error("`{command}` timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("`{command}` produced invalid JSON: {source}")]
    InvalidJson {
        command: String,
        source: serde_json::Error,
    },

    #[error("I/O error while running `{command}`: {source}")]
    Io { command: String, source: io::Error },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by a signal)".to_string(),
    }
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {detail}")
    }
}

/// Which pipe a streamed line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Receives the output of a streamed command, one line at a time.
pub trait OutputSink {
    fn line(&mut self, stream: Stream, line: &str);
}

/// Writes streamed output to the terminal. Stderr lines are highlighted.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl OutputSink for TerminalSink {
    fn line(&mut self, stream: Stream, line: &str) {
        match stream {
            Stream::Stdout => println!("{}", line),
            Stream::Stderr => eprintln!("{}", line.yellow()),
        }
    }
}

/// Collects streamed output in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub lines: Vec<(Stream, String)>,
}

impl MemorySink {
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|(_, line)| line.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputSink for MemorySink {
    fn line(&mut self, stream: Stream, line: &str) {
        self.lines.push((stream, line.to_string()));
    }
}

/// Handle on the external `arduino-cli` executable.
#[derive(Debug, Clone)]
pub struct ArduinoCli {
    path: PathBuf,
}

impl ArduinoCli {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Human-readable command line, used in logs and error messages.
    pub fn describe(&self, args: &[&str]) -> String {
        let mut line = self.path.display().to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.path);
        cmd.args(args);
        cmd
    }

    fn spawn(&self, cmd: &mut Command, command: &str) -> Result<Child, CliError> {
        tracing::debug!(%command, "spawning");
        cmd.spawn().map_err(|source| self.spawn_error(command, source))
    }

    fn spawn_error(&self, command: &str, source: io::Error) -> CliError {
        if source.kind() == io::ErrorKind::NotFound {
            CliError::NotFound(self.path.display().to_string())
        } else {
            CliError::Io {
                command: command.to_string(),
                source,
            }
        }
    }

    /// Run a command and forward each output line to `sink` as it arrives.
    ///
    /// Exit code 0 is success; anything else is [`CliError::Failed`] carrying
    /// the code.
    pub fn run_streaming(&self, args: &[&str], sink: &mut dyn OutputSink) -> Result<(), CliError> {
        let command = self.describe(args);
        let mut child = self.spawn(
            self.command(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped()),
            &command,
        )?;

        let (tx, rx) = mpsc::channel();
        let readers = [
            forward_lines(child.stdout.take(), Stream::Stdout, tx.clone()),
            forward_lines(child.stderr.take(), Stream::Stderr, tx),
        ];

        // Ends once both reader threads hang up.
        for (stream, line) in rx {
            sink.line(stream, &line);
        }
        for reader in readers.into_iter().flatten() {
            let _ = reader.join();
        }

        let status = child.wait().map_err(|source| CliError::Io {
            command: command.clone(),
            source,
        })?;
        check_status(command, status, String::new())
    }

    /// Run a command with the terminal attached (used by the serial monitor).
    pub fn run_attached(&self, args: &[&str]) -> Result<(), CliError> {
        let command = self.describe(args);
        let mut child = self.spawn(
            self.command(args)
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit()),
            &command,
        )?;
        let status = child.wait().map_err(|source| CliError::Io {
            command: command.clone(),
            source,
        })?;
        check_status(command, status, String::new())
    }

    /// Run a command and parse its stdout as JSON.
    pub fn run_json(&self, args: &[&str]) -> Result<serde_json::Value, CliError> {
        let command = self.describe(args);
        tracing::debug!(%command, "capturing json");
        let output = self
            .command(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| self.spawn_error(&command, source))?;

        check_status(
            command.clone(),
            output.status,
            excerpt(&String::from_utf8_lossy(&output.stderr)),
        )?;

        serde_json::from_slice(&output.stdout)
            .map_err(|source| CliError::InvalidJson { command, source })
    }

    /// Run a command and capture stdout, killing it once `timeout` elapses.
    pub fn run_captured_with_timeout(
        &self,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, CliError> {
        let command = self.describe(args);
        let mut child = self.spawn(
            self.command(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::null()),
            &command,
        )?;

        let stdout = child.stdout.take();
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(mut pipe) = stdout {
                let _ = pipe.read_to_end(&mut buf);
            }
            String::from_utf8_lossy(&buf).into_owned()
        });

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    tracing::warn!(%command, ?timeout, "killed after deadline");
                    return Err(CliError::Timeout { command, timeout });
                }
                Ok(None) => thread::sleep(Duration::from_millis(20)),
                Err(source) => return Err(CliError::Io { command, source }),
            }
        };

        let stdout = reader.join().unwrap_or_default();
        check_status(command, status, String::new())?;
        Ok(stdout)
    }

    /// First line of `arduino-cli version`.
    pub fn version(&self) -> Result<String, CliError> {
        let command = self.describe(&["version"]);
        let output = self
            .command(&["version"])
            .stdin(Stdio::null())
            .output()
            .map_err(|source| self.spawn_error(&command, source))?;
        check_status(
            command,
            output.status,
            excerpt(&String::from_utf8_lossy(&output.stderr)),
        )?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("unknown")
            .trim()
            .to_string())
    }

    pub fn is_available(&self) -> bool {
        self.version().is_ok()
    }
}

fn forward_lines<R: Read + Send + 'static>(
    pipe: Option<R>,
    stream: Stream,
    tx: mpsc::Sender<(Stream, String)>,
) -> Option<thread::JoinHandle<()>> {
    let pipe = pipe?;
    Some(thread::spawn(move || {
        // Byte-wise so a non-UTF-8 line never stops the drain; a closed pipe
        // would kill the child with SIGPIPE.
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']).to_string();
            // The receiver outlives both readers, so this only fails on shutdown.
            let _ = tx.send((stream, line));
        }
    }))
}

fn check_status(command: String, status: ExitStatus, detail: String) -> Result<(), CliError> {
    if status.success() {
        Ok(())
    } else {
        Err(CliError::Failed {
            command,
            code: status.code(),
            detail,
        })
    }
}

fn excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.chars().count() > DETAIL_LIMIT {
        let mut cut: String = trimmed.chars().take(DETAIL_LIMIT).collect();
        cut.push_str("...");
        cut
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_message_includes_exit_code() {
        let err = CliError::Failed {
            command: "arduino-cli compile".to_string(),
            code: Some(2),
            detail: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "`arduino-cli compile` failed with exit code 2"
        );
    }

    #[test]
    fn test_failed_message_appends_detail() {
        let err = CliError::Failed {
            command: "arduino-cli lib list".to_string(),
            code: None,
            detail: "index missing".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("terminated by a signal"));
        assert!(msg.ends_with(": index missing"));
    }

    #[test]
    fn test_missing_executable_is_not_found() {
        let cli = ArduinoCli::new("/nonexistent/inox-test/arduino-cli");
        let mut sink = MemorySink::default();
        let err = cli.run_streaming(&["compile"], &mut sink).unwrap_err();
        assert!(matches!(err, CliError::NotFound(_)));
        assert!(!cli.is_available());
    }

    #[test]
    fn test_describe_joins_arguments() {
        let cli = ArduinoCli::new("arduino-cli");
        assert_eq!(
            cli.describe(&["compile", "--fqbn", "arduino:avr:uno"]),
            "arduino-cli compile --fqbn arduino:avr:uno"
        );
    }

    #[test]
    fn test_excerpt_truncates_long_stderr() {
        let long = "e".repeat(DETAIL_LIMIT + 50);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), DETAIL_LIMIT + 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_streaming_collects_both_pipes() {
        let cli = ArduinoCli::new("sh");
        let mut sink = MemorySink::default();
        cli.run_streaming(&["-c", "echo out; echo err 1>&2"], &mut sink)
            .unwrap();
        assert!(sink.lines.contains(&(Stream::Stdout, "out".to_string())));
        assert!(sink.lines.contains(&(Stream::Stderr, "err".to_string())));
    }

    #[cfg(unix)]
    #[test]
    fn test_streaming_survives_invalid_utf8() {
        let cli = ArduinoCli::new("sh");
        let mut sink = MemorySink::default();
        let script = "printf 'before\\n\\377bad\\n'; sleep 0.3; \
                      i=0; while [ $i -lt 2000 ]; do echo after$i; i=$((i+1)); done; exit 0";
        cli.run_streaming(&["-c", script], &mut sink).unwrap();

        assert_eq!(sink.lines.len(), 2002);
        assert_eq!(sink.lines[0], (Stream::Stdout, "before".to_string()));
        assert_eq!(sink.lines[1], (Stream::Stdout, "\u{FFFD}bad".to_string()));
        assert_eq!(sink.lines[2001], (Stream::Stdout, "after1999".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_streaming_surfaces_exit_code() {
        let cli = ArduinoCli::new("sh");
        let mut sink = MemorySink::default();
        let err = cli.run_streaming(&["-c", "exit 3"], &mut sink).unwrap_err();
        assert!(err.to_string().contains("exit code 3"));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_slow_command() {
        let cli = ArduinoCli::new("sleep");
        let started = Instant::now();
        let err = cli
            .run_captured_with_timeout(&["5"], Duration::from_millis(200))
            .unwrap_err();
        assert!(matches!(err, CliError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_json_rejects_garbage() {
        let cli = ArduinoCli::new("echo");
        let err = cli.run_json(&["not json"]).unwrap_err();
        assert!(matches!(err, CliError::InvalidJson { .. }));
    }
}
