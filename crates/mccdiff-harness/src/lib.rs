//! Differential test harness for the `mcc` C compiler.
//!
//! `run_diff` builds every program in a corpus with both the reference C
//! compiler and the `mcc`+`fasm` pipeline, runs both binaries, and compares
//! exit statuses. `run_reject` drives an invalid-program corpus through
//! `mcc` alone and expects every program to be rejected. All toolchain and
//! program invocations are blocking subprocess calls; tests resolve
//! strictly one at a time, in sorted discovery order.

use std::fs;
use std::path::PathBuf;

use anyhow::Result;

mod artifacts;
mod discover;
mod exec;
mod report;
mod toolchain;

pub use artifacts::ArtifactDir;
pub use discover::{discover, retain_matching, TestCase, SOURCE_EXT};
pub use exec::{run_executable, ExecutionOutcome};
pub use report::{Reporter, RunSummary};
pub use toolchain::{BuildOutcome, Phase, ToolFailure, Toolchain};

/// Knobs shared by both run modes.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Corpus directory scanned for `.c` programs.
    pub tests_dir: PathBuf,
    /// Scratch directory, wiped at run start (differential mode only).
    pub artifact_dir: PathBuf,
    /// Wall-clock budget per compiled program; 0 waits forever.
    pub timeout_seconds: u64,
    /// Substring (or exact, with `exact`) stem filter.
    pub filter: Option<String>,
    pub exact: bool,
    /// Abort the whole run on the first toolchain failure instead of
    /// recording it against the test.
    pub fail_fast: bool,
    pub verbose: bool,
}

/// Differential mode: for every discovered program, compile and run under
/// both toolchains and compare exit statuses. Returns the final counters;
/// individual verdicts go to the console as they resolve.
pub fn run_diff(config: &HarnessConfig, toolchain: &Toolchain) -> Result<RunSummary> {
    let cases = discover_cases(config)?;
    let artifacts = ArtifactDir::prepare(&config.artifact_dir)?;

    let mut reporter = Reporter::new(cases.len());
    reporter.start(&config.tests_dir);
    for case in &cases {
        if config.verbose {
            eprintln!("test: {}", case.stem);
        }
        let tool_failed = diff_one(config, toolchain, &artifacts, case, &mut reporter)?;
        sweep(&artifacts, case);
        if tool_failed && config.fail_fast {
            anyhow::bail!(
                "toolchain failure on {} (fail-fast)",
                case.source.display()
            );
        }
    }
    reporter.end(&config.tests_dir);
    Ok(reporter.summary())
}

/// Rejection mode: every discovered program is expected to be refused by
/// the compiler-under-test. Exit 0 from the compiler is the failure.
pub fn run_reject(config: &HarnessConfig, toolchain: &Toolchain) -> Result<RunSummary> {
    let cases = discover_cases(config)?;

    let mut reporter = Reporter::new(cases.len());
    reporter.start(&config.tests_dir);
    for case in &cases {
        if config.verbose {
            eprintln!("test: {}", case.stem);
        }
        let code = toolchain.compile_silenced(case)?;
        // Drop whatever the compiler emitted before its verdict.
        for leftover in [&case.asm, &case.assembled] {
            if leftover.exists() {
                let _ = fs::remove_file(leftover);
            }
        }
        if code == 0 {
            reporter.accepted(&case.source);
        } else {
            reporter.pass(&case.stem);
        }
    }
    reporter.end(&config.tests_dir);
    Ok(reporter.summary())
}

fn discover_cases(config: &HarnessConfig) -> Result<Vec<TestCase>> {
    let mut cases = discover(&config.tests_dir)?;
    if let Some(filter) = &config.filter {
        retain_matching(&mut cases, filter, config.exact);
    }
    Ok(cases)
}

/// Drive both toolchains and both executions for one test and print its
/// verdict. Returns whether a toolchain phase failed, the fail-fast
/// trigger; harness-level errors (unspawnable tool, filesystem trouble)
/// propagate as `Err` and abort the run regardless of flags.
fn diff_one(
    config: &HarnessConfig,
    toolchain: &Toolchain,
    artifacts: &ArtifactDir,
    case: &TestCase,
    reporter: &mut Reporter,
) -> Result<bool> {
    let reference_exe = match toolchain.compile_reference(case)? {
        BuildOutcome::Built(exe) => exe,
        BuildOutcome::Failed(failure) => {
            reporter.tool_failure(&case.source, &failure);
            return Ok(true);
        }
    };
    let reference_run = run_executable(&reference_exe, config.timeout_seconds)?;
    artifacts.stash(&reference_exe)?;
    if reference_run.timed_out {
        reporter.timeout(&case.source, &reference_exe, config.timeout_seconds);
        return Ok(false);
    }

    let under_test_exe = match toolchain.compile_under_test(case, artifacts)? {
        BuildOutcome::Built(exe) => exe,
        BuildOutcome::Failed(failure) => {
            reporter.tool_failure(&case.source, &failure);
            return Ok(true);
        }
    };
    let under_test_run = run_executable(&under_test_exe, config.timeout_seconds)?;
    artifacts.stash(&under_test_exe)?;
    if under_test_run.timed_out {
        reporter.timeout(&case.source, &under_test_exe, config.timeout_seconds);
        return Ok(false);
    }

    if reference_run.exit_code == under_test_run.exit_code {
        reporter.pass(&case.stem);
    } else {
        reporter.mismatch(
            &case.source,
            reference_run.exit_code,
            under_test_run.exit_code,
        );
    }
    Ok(false)
}

/// Best-effort relocation of anything a failed phase left beside the
/// source, so a rerun never collides with stale intermediates.
fn sweep(artifacts: &ArtifactDir, case: &TestCase) {
    for leftover in [
        &case.asm,
        &case.assembled,
        &case.reference_exe,
        &case.under_test_exe,
    ] {
        let _ = artifacts.stash_if_exists(leftover);
    }
}
