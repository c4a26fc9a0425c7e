use std::io;
use std::path::Path;
#[cfg(not(target_os = "windows"))]
use std::process::{Command, Stdio};

/// Starts a resolved executable as an independent process.
pub trait ProcessLauncher {
    /// Requests the start and returns without waiting for the program.
    fn launch(&self, path: &Path) -> io::Result<()>;
}

/// Launches through the host's default open/execute handling.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellLauncher;

impl ProcessLauncher for ShellLauncher {
    fn launch(&self, path: &Path) -> io::Result<()> {
        tracing::debug!(path = %path.display(), "launching");
        launch_detached(path)
    }
}

#[cfg(target_os = "windows")]
fn launch_detached(path: &Path) -> io::Result<()> {
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::UI::Shell::{
        ShellExecuteExW, SEE_MASK_FLAG_NO_UI, SHELLEXECUTEINFOW,
    };
    use windows_sys::Win32::UI::WindowsAndMessaging::SW_SHOW;

    fn wide(s: &std::ffi::OsStr) -> Vec<u16> {
        s.encode_wide().chain(std::iter::once(0)).collect()
    }

    let verb = wide("open".as_ref());
    let file = wide(path.as_os_str());

    // SAFETY: SHELLEXECUTEINFOW is plain data for which all-zero is valid.
    let mut info: SHELLEXECUTEINFOW = unsafe { std::mem::zeroed() };
    info.cbSize = std::mem::size_of::<SHELLEXECUTEINFOW>() as u32;
    info.fMask = SEE_MASK_FLAG_NO_UI;
    info.lpVerb = verb.as_ptr();
    info.lpFile = file.as_ptr();
    info.nShow = SW_SHOW;

    // The path goes to the shell as one string; no command interpreter parses
    // it. No process handle is requested, so there is nothing to close.
    // SAFETY: `info` and the buffers it points into outlive the call.
    if unsafe { ShellExecuteExW(&mut info) } == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn launch_detached(path: &Path) -> io::Result<()> {
    // The child handle is dropped without waiting; the program outlives us.
    Command::new(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(drop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn missing_program_reports_host_error() {
        let err = ShellLauncher
            .launch(Path::new("/nonexistent/appstoreopener/app.exe"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(windows)]
    #[test]
    fn shell_metacharacters_stay_part_of_the_path() {
        // Through a command interpreter `&` would split this into two commands.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("A&B %PATH%").join("app.exe");

        let err = ShellLauncher.launch(&path).unwrap_err();
        assert!(err.raw_os_error().is_some(), "expected a host error, got {err}");
    }
}
