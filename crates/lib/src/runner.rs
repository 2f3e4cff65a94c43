//! Command runner.
//!
//! Executes one command line inside a working directory, streaming the child's
//! stdout and stderr to the log line by line while it runs.
//!
//! # Tokenization
//!
//! Command lines are split on whitespace only. There is no quoting or escaping:
//! an argument containing a space cannot be expressed. Buildpacks that need a
//! shell should ship a script and call it (`sh build.sh`).

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{Instrument, Span, debug, info, warn};

/// Lines kept per stream. Older lines are still logged but dropped from the
/// returned [`CommandOutput`].
pub const MAX_CAPTURED_LINES: usize = 1000;

/// How long the readers may keep draining after the process exits.
///
/// A background process started by the command can inherit its pipes and hold
/// them open indefinitely.
pub const READER_GRACE: Duration = Duration::from_secs(1);

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum RunError {
  /// The program could not be started (not found, not executable, bad cwd).
  #[error("failed to start '{program}' in {}: {source}", dir.display())]
  Spawn {
    program: String,
    dir: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The program ran and exited unsuccessfully.
  #[error("command '{command}' failed: {}", describe_status(*code, *signal))]
  Exited {
    command: String,
    code: Option<i32>,
    signal: Option<i32>,
    /// Everything the process printed before exiting.
    output: CommandOutput,
  },

  /// Waiting on the child or reading its output failed.
  #[error("io error while running '{command}': {source}")]
  Io {
    command: String,
    #[source]
    source: std::io::Error,
  },

  /// An output reader task panicked or was cancelled.
  #[error("output reader for '{command}' did not complete: {source}")]
  Reader {
    command: String,
    #[source]
    source: tokio::task::JoinError,
  },
}

impl RunError {
  /// Whether the error means the process never started.
  ///
  /// Start failures halt a pipeline; exit failures are reported to the caller.
  pub fn is_spawn(&self) -> bool {
    matches!(self, RunError::Spawn { .. })
  }
}

fn describe_status(code: Option<i32>, signal: Option<i32>) -> String {
  match (code, signal) {
    (Some(code), _) => format!("exit code {}", code),
    (None, Some(signal)) => format!("terminated by signal {}", signal),
    (None, None) => "abnormal termination".to_string(),
  }
}

/// Output stream of a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
  Stdout,
  Stderr,
}

impl Stream {
  pub fn as_str(self) -> &'static str {
    match self {
      Stream::Stdout => "stdout",
      Stream::Stderr => "stderr",
    }
  }
}

/// Lines captured from a completed command.
///
/// Each vector is in the order the process wrote it and holds at most the last
/// [`MAX_CAPTURED_LINES`] lines. No ordering between the two streams is
/// recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
  pub stdout: Vec<String>,
  pub stderr: Vec<String>,
  /// Lines logged but not kept because of the cap.
  pub stdout_dropped: usize,
  pub stderr_dropped: usize,
}

#[derive(Debug, Default)]
struct Capture {
  lines: VecDeque<String>,
  dropped: usize,
}

impl Capture {
  fn push(&mut self, line: String) {
    if self.lines.len() == MAX_CAPTURED_LINES {
      self.lines.pop_front();
      self.dropped += 1;
    }
    self.lines.push_back(line);
  }
}

type SharedCapture = Arc<Mutex<Capture>>;

/// Split a command line into program and arguments.
///
/// Returns `None` for an empty or whitespace-only line.
pub fn tokenize(command_line: &str) -> Option<(&str, Vec<&str>)> {
  let mut parts = command_line.split_whitespace();
  let program = parts.next()?;
  Some((program, parts.collect()))
}

/// Run a whitespace-tokenized command line in `dir`.
///
/// An empty command line is a no-op and succeeds with no output.
pub async fn run_command(command_line: &str, dir: &Path) -> Result<CommandOutput, RunError> {
  match tokenize(command_line) {
    Some((program, args)) => run_program(program, args.as_slice(), dir).await,
    None => {
      debug!(dir = %dir.display(), "empty command, nothing to run");
      Ok(CommandOutput::default())
    }
  }
}

/// Run `program` with `args` in `dir`, logging every output line as it arrives.
///
/// Returns once the process has exited and both output streams are drained,
/// or [`READER_GRACE`] after exit if something else still holds them open.
pub async fn run_program<S: AsRef<str>>(program: &str, args: &[S], dir: &Path) -> Result<CommandOutput, RunError> {
  let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
  let command_line = std::iter::once(program)
    .chain(args.iter().copied())
    .collect::<Vec<_>>()
    .join(" ");

  info!(cmd = %command_line, dir = %dir.display(), "running command");

  let mut child = Command::new(program)
    .args(&args)
    .current_dir(dir)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true)
    .spawn()
    .map_err(|e| RunError::Spawn {
      program: program.to_string(),
      dir: dir.to_path_buf(),
      source: e,
    })?;

  debug!(pid = ?child.id(), "process started");

  // Both pipes were requested above, so these are always present.
  let stdout = child.stdout.take().map(|s| spawn_reader(s, Stream::Stdout));
  let stderr = child.stderr.take().map(|s| spawn_reader(s, Stream::Stderr));

  let status = child.wait().await.map_err(|e| RunError::Io {
    command: command_line.clone(),
    source: e,
  })?;

  let mut output = CommandOutput::default();
  if let Some((handle, capture)) = stdout {
    (output.stdout, output.stdout_dropped) = finish_reader(handle, capture, Stream::Stdout, &command_line).await?;
  }
  if let Some((handle, capture)) = stderr {
    (output.stderr, output.stderr_dropped) = finish_reader(handle, capture, Stream::Stderr, &command_line).await?;
  }

  debug!(status = %status, "process exited");

  if status.success() {
    Ok(output)
  } else {
    let (code, signal) = exit_parts(&status);
    Err(RunError::Exited {
      command: command_line,
      code,
      signal,
      output,
    })
  }
}

fn spawn_reader<R>(reader: R, stream: Stream) -> (JoinHandle<std::io::Result<()>>, SharedCapture)
where
  R: AsyncRead + Unpin + Send + 'static,
{
  let capture = SharedCapture::default();
  let handle = tokio::spawn(stream_lines(reader, stream, Arc::clone(&capture)).instrument(Span::current()));
  (handle, capture)
}

/// Wait up to [`READER_GRACE`] for a reader to hit EOF, then stop it.
///
/// Lines read before the reader stopped are returned either way.
async fn finish_reader(
  mut handle: JoinHandle<std::io::Result<()>>,
  capture: SharedCapture,
  stream: Stream,
  command_line: &str,
) -> Result<(Vec<String>, usize), RunError> {
  let joined = tokio::time::timeout(READER_GRACE, &mut handle).await;
  match joined {
    Ok(joined) => joined
      .map_err(|e| RunError::Reader {
        command: command_line.to_string(),
        source: e,
      })?
      .map_err(|e| RunError::Io {
        command: command_line.to_string(),
        source: e,
      })?,
    Err(_) => {
      warn!(
        stream = stream.as_str(),
        grace = ?READER_GRACE,
        "output still open after process exit, a background process may hold it; no longer reading"
      );
      handle.abort();
    }
  }

  let mut capture = capture.lock().unwrap_or_else(PoisonError::into_inner);
  let lines = capture.lines.drain(..).collect();
  Ok((lines, capture.dropped))
}

/// Read `reader` until EOF, logging each line and keeping the most recent ones.
async fn stream_lines<R>(reader: R, stream: Stream, capture: SharedCapture) -> std::io::Result<()>
where
  R: AsyncRead + Unpin,
{
  let mut segments = BufReader::new(reader).split(b'\n');

  while let Some(segment) = segments.next_segment().await? {
    let mut line = String::from_utf8_lossy(&segment).into_owned();
    if line.ends_with('\r') {
      line.pop();
    }
    info!(stream = stream.as_str(), "{}", line);
    capture.lock().unwrap_or_else(PoisonError::into_inner).push(line);
  }

  Ok(())
}

#[cfg(unix)]
fn exit_parts(status: &ExitStatus) -> (Option<i32>, Option<i32>) {
  use std::os::unix::process::ExitStatusExt;
  (status.code(), status.signal())
}

#[cfg(not(unix))]
fn exit_parts(status: &ExitStatus) -> (Option<i32>, Option<i32>) {
  (status.code(), None)
}
