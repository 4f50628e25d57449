use std::path::Path;
use std::process::{Child, Command, ExitStatus};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

/// Observable outcome of one compiled test program.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionOutcome {
    pub exit_code: i32,
    pub timed_out: bool,
}

/// Run `exe` with no arguments and wait for it to terminate.
///
/// `timeout_seconds == 0` waits forever. Otherwise the program is killed
/// once the wall clock expires, and on Unix its CPU time is capped to the
/// same budget via `RLIMIT_CPU` so a spinning program cannot outlive the
/// poll loop by much.
pub fn run_executable(exe: &Path, timeout_seconds: u64) -> Result<ExecutionOutcome> {
    let exe_abs = std::fs::canonicalize(exe)
        .with_context(|| format!("canonicalize executable path: {}", exe.display()))?;

    let mut cmd = Command::new(&exe_abs);

    #[cfg(unix)]
    {
        if timeout_seconds > 0 {
            use std::os::unix::process::CommandExt as _;
            unsafe {
                cmd.pre_exec(move || apply_cpu_limit(timeout_seconds));
            }
        }
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawn test program: {}", exe.display()))?;
    let (status, timed_out) = wait_with_wall_timeout(&mut child, timeout_seconds)?;
    Ok(ExecutionOutcome {
        exit_code: exit_code(status),
        timed_out,
    })
}

#[cfg(unix)]
fn apply_cpu_limit(seconds: u64) -> std::io::Result<()> {
    unsafe {
        let cpu = libc::rlimit {
            rlim_cur: seconds as libc::rlim_t,
            rlim_max: seconds as libc::rlim_t,
        };
        if libc::setrlimit(libc::RLIMIT_CPU, &cpu) != 0 {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}

fn wait_with_wall_timeout(child: &mut Child, timeout_seconds: u64) -> Result<(ExitStatus, bool)> {
    if timeout_seconds == 0 {
        let status = child.wait().context("wait test program")?;
        return Ok((status, false));
    }

    let deadline = Instant::now() + Duration::from_secs(timeout_seconds);
    loop {
        if let Some(status) = child.try_wait().context("poll test program")? {
            return Ok((status, false));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let status = child.wait().context("wait test program after kill")?;
            return Ok((status, true));
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// Normalize an `ExitStatus` to the `i32` the comparison runs on.
/// Signal deaths map to `128 + signal` so they stay distinguishable from
/// ordinary exits.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    let exit_signal = {
        use std::os::unix::process::ExitStatusExt as _;
        status.signal()
    };
    #[cfg(not(unix))]
    let exit_signal: Option<i32> = None;

    match status.code() {
        Some(code) => code,
        None => exit_signal.map(|s| 128 + s).unwrap_or(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn exit_code_passes_plain_codes_through() {
        use std::os::unix::process::ExitStatusExt as _;
        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code(ExitStatus::from_raw(5 << 8)), 5);
    }

    #[cfg(unix)]
    #[test]
    fn exit_code_maps_signals_past_128() {
        use std::os::unix::process::ExitStatusExt as _;
        // raw wait status 9 = killed by SIGKILL
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 137);
        // raw wait status 15 = killed by SIGTERM
        assert_eq!(exit_code(ExitStatus::from_raw(15)), 143);
    }
}
