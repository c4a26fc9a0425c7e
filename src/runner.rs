//! Runs an external command with a hard timeout and captures its stdout.
//!
//! The child is owned by a guard that kills its whole process tree and reaps
//! it on every exit path, so neither the processes nor their pipe outlive
//! [`run_with_timeout`].

use std::collections::HashMap;
use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How a captured command finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Exited in time with non-empty UTF-8 output.
    Output(String),
    /// Exited in time but printed nothing usable (empty or not UTF-8).
    NoOutput,
    /// Still running at the deadline; it was killed.
    TimedOut,
}

struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    fn child_mut(&mut self) -> io::Result<&mut Child> {
        self.child
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "child already reaped"))
    }

    /// Waits for exit until `deadline`. `Ok(false)` means the deadline passed.
    fn wait_until(&mut self, deadline: Instant) -> io::Result<bool> {
        loop {
            if self.child_mut()?.try_wait()?.is_some() {
                self.child = None;
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if matches!(child.try_wait(), Ok(None)) {
                tracing::debug!(pid = child.id(), "terminating external command");
                kill_process_tree(child.id());
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

/// Kills `pid` and every process descended from it, leaves first.
///
/// Shell pipelines hand the captured pipe to grandchildren; killing only the
/// shell would leave them running and holding it open.
fn kill_process_tree(pid: u32) {
    let root = sysinfo::Pid::from_u32(pid);
    let mut sys = sysinfo::System::new();
    sys.refresh_processes(sysinfo::ProcessesToUpdate::All, true);

    let mut children: HashMap<sysinfo::Pid, Vec<sysinfo::Pid>> = HashMap::new();
    for (pid, process) in sys.processes() {
        if let Some(parent) = process.parent() {
            children.entry(parent).or_default().push(*pid);
        }
    }

    let mut tree = Vec::new();
    collect_descendants(root, &children, &mut tree);

    for pid in tree.into_iter().rev() {
        if let Some(process) = sys.process(pid) {
            if process.kill_with(sysinfo::Signal::Kill) != Some(true) {
                let _ = process.kill();
            }
        }
    }
}

fn collect_descendants(
    pid: sysinfo::Pid,
    children: &HashMap<sysinfo::Pid, Vec<sysinfo::Pid>>,
    out: &mut Vec<sysinfo::Pid>,
) {
    out.push(pid);
    if let Some(direct) = children.get(&pid) {
        for child in direct {
            collect_descendants(*child, children, out);
        }
    }
}

/// Spawns `command`, reads at most `max_bytes` of its stdout and waits for
/// it to exit, all within `timeout`.
///
/// Stdin is closed and stderr discarded. An error is returned only when the
/// process could not be started.
pub fn run_with_timeout(
    mut command: Command,
    timeout: Duration,
    max_bytes: usize,
) -> io::Result<QueryOutcome> {
    let deadline = Instant::now() + timeout;

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;
    let stdout = child.stdout.take();
    let mut guard = ChildGuard::new(child);

    let Some(stdout) = stdout else {
        return Ok(QueryOutcome::NoOutput);
    };

    // The reader owns the pipe; it finishes once every writer in the child's
    // process tree has exited or been killed by the guard.
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let read = stdout
            .take(u64::try_from(max_bytes).unwrap_or(u64::MAX))
            .read_to_end(&mut buf);
        let _ = tx.send(read.map(|_| buf));
    });

    let remaining = deadline.saturating_duration_since(Instant::now());
    let captured = match rx.recv_timeout(remaining) {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(err)) => {
            tracing::debug!(error = %err, "reading external command output failed");
            Vec::new()
        }
        Err(mpsc::RecvTimeoutError::Timeout) => return Ok(QueryOutcome::TimedOut),
        Err(mpsc::RecvTimeoutError::Disconnected) => Vec::new(),
    };

    if !guard.wait_until(deadline)? {
        return Ok(QueryOutcome::TimedOut);
    }

    Ok(decode_output(captured))
}

fn decode_output(bytes: Vec<u8>) -> QueryOutcome {
    match String::from_utf8(bytes) {
        Ok(text) if !text.is_empty() => QueryOutcome::Output(text),
        Ok(_) => QueryOutcome::NoOutput,
        Err(err) => {
            tracing::debug!(error = %err, "external command output is not UTF-8");
            QueryOutcome::NoOutput
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_utf8_is_no_output() {
        assert_eq!(decode_output(vec![0xff, 0xfe, 0x41]), QueryOutcome::NoOutput);
        assert_eq!(decode_output(Vec::new()), QueryOutcome::NoOutput);
        assert_eq!(
            decode_output(b"C:\\a\r\n".to_vec()),
            QueryOutcome::Output("C:\\a\r\n".into())
        );
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let command = Command::new("appstoreopener-definitely-not-a-real-program");
        assert!(run_with_timeout(command, Duration::from_secs(5), 1024).is_err());
    }

    #[cfg(unix)]
    fn sh(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.args(["-c", script]);
        command
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout() {
        let outcome =
            run_with_timeout(sh("printf '/opt/a\\n/opt/b\\n'"), Duration::from_secs(10), 1024)
                .unwrap();
        assert_eq!(outcome, QueryOutcome::Output("/opt/a\n/opt/b\n".into()));
    }

    #[cfg(unix)]
    #[test]
    fn silent_command_is_no_output() {
        let outcome = run_with_timeout(sh("exit 3"), Duration::from_secs(10), 1024).unwrap();
        assert_eq!(outcome, QueryOutcome::NoOutput);
    }

    #[cfg(unix)]
    #[test]
    fn slow_command_times_out_and_is_killed() {
        let start = Instant::now();
        let outcome = run_with_timeout(sh("exec sleep 30"), Duration::from_millis(200), 1024)
            .unwrap();
        assert_eq!(outcome, QueryOutcome::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[cfg(target_os = "linux")]
    fn is_gone(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            // Killed but not yet reaped by its new parent.
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .is_some_and(|rest| rest.trim_start().starts_with('Z')),
            Err(_) => true,
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn timeout_kills_pipeline_grandchildren() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("cat.pid");
        let script = format!(
            "sleep 30 | cat & echo $! > '{}'; wait",
            pid_file.display()
        );

        let start = Instant::now();
        let outcome = run_with_timeout(sh(&script), Duration::from_millis(500), 1024).unwrap();
        assert_eq!(outcome, QueryOutcome::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(10));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let pid = pid.trim();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !is_gone(pid) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        assert!(is_gone(pid), "pipeline process {pid} outlived the timeout");
    }

    #[cfg(unix)]
    #[test]
    fn output_is_truncated_to_limit() {
        let outcome =
            run_with_timeout(sh("printf 'abcdefghij'"), Duration::from_secs(10), 4).unwrap();
        assert_eq!(outcome, QueryOutcome::Output("abcd".into()));
    }
}
