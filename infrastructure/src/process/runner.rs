//! Run benchmark commands as child processes.
//!
//! Programs run through `sh -c`; scripts are fed to `sh -s` on stdin.
//! Output is captured on reader threads so large reports (iperf3 JSON)
//! cannot fill the pipe and stall the child.

use benchfleet_application::ports::command_runner::CommandRunner;
use benchfleet_domain::{Command, CommandKind, CommandOutput};
use std::io::{Read, Write};
use std::process::{Child, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Maximum captured size per stream (4 MB)
const MAX_OUTPUT_SIZE: usize = 4 * 1024 * 1024;

/// How often a running child is checked for exit
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Exit code reported when the command could not run to completion
const FAILED_EXIT_CODE: i64 = -1;

/// [`CommandRunner`] spawning local processes
#[derive(Debug, Clone)]
pub struct LocalCommandRunner {
    shell: String,
}

impl Default for LocalCommandRunner {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl LocalCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use another POSIX shell (e.g. `bash`).
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    fn spawn(&self, command: &Command) -> std::io::Result<Child> {
        let mut cmd = std::process::Command::new(&self.shell);
        match command.kind {
            CommandKind::Program => {
                cmd.args(["-c", &command.data]).stdin(Stdio::null());
            }
            CommandKind::Script => {
                cmd.arg("-s").stdin(Stdio::piped());
            }
        }
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        // Linux: make sure benchmark children die with the agent.
        #[cfg(target_os = "linux")]
        unsafe {
            use std::os::unix::process::CommandExt;
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn()?;
        if command.kind == CommandKind::Script
            && let Some(mut stdin) = child.stdin.take()
        {
            stdin.write_all(command.data.as_bytes())?;
            // stdin closes on drop so the shell sees EOF
        }
        Ok(child)
    }
}

impl CommandRunner for LocalCommandRunner {
    fn run(&self, command: &Command, timeout: Duration) -> CommandOutput {
        debug!("Spawning {} (timeout {:?})", command, timeout);

        let mut child = match self.spawn(command) {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn {}: {}", command, e);
                return failure(format!("Failed to spawn command: {}", e));
            }
        };

        let stdout = capture(child.stdout.take());
        let stderr = capture(child.stderr.take());

        match wait_with_timeout(&mut child, timeout) {
            Ok(status) => CommandOutput {
                stdout: join_capture(stdout),
                stderr: join_capture(stderr),
                exit_code: Some(status.code().map(i64::from).unwrap_or(FAILED_EXIT_CODE)),
            },
            Err(message) => {
                let mut stderr = join_capture(stderr);
                if !stderr.is_empty() && !stderr.ends_with('\n') {
                    stderr.push('\n');
                }
                stderr.push_str(&message);
                CommandOutput {
                    stdout: join_capture(stdout),
                    stderr,
                    exit_code: Some(FAILED_EXIT_CODE),
                }
            }
        }
    }
}

fn failure(message: String) -> CommandOutput {
    CommandOutput {
        stdout: String::new(),
        stderr: message,
        exit_code: Some(FAILED_EXIT_CODE),
    }
}

/// Drain a pipe on its own thread.
fn capture<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_capture(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    let bytes = handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();
    let mut text = String::from_utf8_lossy(&bytes).into_owned();
    if text.len() > MAX_OUTPUT_SIZE {
        let mut cut = MAX_OUTPUT_SIZE;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("\n... (output truncated)");
    }
    text
}

/// Wait for a child process, killing it once `timeout` has elapsed.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> Result<std::process::ExitStatus, String> {
    let start = Instant::now();

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(format!(
                        "Command timed out after {} seconds",
                        timeout.as_secs()
                    ));
                }
                thread::sleep(WAIT_POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(format!("Failed to wait for process: {}", e));
            }
        }
    }
}
