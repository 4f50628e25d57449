use std::path::Path;

use owo_colors::OwoColorize;

use crate::toolchain::ToolFailure;

/// Counters for one run. The total is fixed before iteration starts; by the
/// end of the run the printed verdicts add up to exactly `total`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Prints the verdict stream and keeps the running counters.
///
/// Output is colored for a human watching the console; nothing here is a
/// machine-readable contract.
#[derive(Debug)]
pub struct Reporter {
    summary: RunSummary,
    current: usize,
}

impl Reporter {
    pub fn new(total: usize) -> Reporter {
        Reporter {
            summary: RunSummary {
                total,
                ..RunSummary::default()
            },
            current: 0,
        }
    }

    pub fn start(&self, dir: &Path) {
        println!("Start testing in {}", dir.display().blue());
    }

    pub fn end(&self, dir: &Path) {
        println!("End testing in {}", dir.display().blue());
        println!(
            "summary: passed={} failed={} total={}",
            self.summary.passed, self.summary.failed, self.summary.total
        );
    }

    pub fn pass(&mut self, stem: &str) {
        self.current += 1;
        self.summary.passed += 1;
        println!("{}", pass_line(stem, self.current, self.summary.total));
    }

    pub fn mismatch(&mut self, source: &Path, cc_code: i32, mcc_code: i32) {
        self.fail_line(mismatch_line(source, cc_code, mcc_code));
    }

    pub fn tool_failure(&mut self, source: &Path, failure: &ToolFailure) {
        self.fail_line(tool_failure_line(source, failure));
    }

    pub fn timeout(&mut self, source: &Path, exe: &Path, seconds: u64) {
        self.fail_line(timeout_line(source, exe, seconds));
    }

    /// Rejection-mode failure: an invalid program the compiler accepted.
    pub fn accepted(&mut self, source: &Path) {
        self.fail_line(accepted_line(source));
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    fn fail_line(&mut self, line: String) {
        self.current += 1;
        self.summary.failed += 1;
        println!("{line}");
    }
}

fn pass_line(stem: &str, current: usize, total: usize) -> String {
    format!(
        "{} {current}/{total}",
        format!("{stem:<20} passed").green()
    )
}

fn mismatch_line(source: &Path, cc_code: i32, mcc_code: i32) -> String {
    format!(
        "{} not passed, cc_code={cc_code}, mcc_code={mcc_code}",
        source.display().red()
    )
}

fn tool_failure_line(source: &Path, failure: &ToolFailure) -> String {
    match failure {
        ToolFailure::Exited { phase, status } => format!(
            "{} not passed, {} exited {status}",
            source.display().red(),
            phase.tool()
        ),
        ToolFailure::MissingOutput { phase, expected } => format!(
            "{} not passed, {} produced no {}",
            source.display().red(),
            phase.tool(),
            expected.display()
        ),
    }
}

fn timeout_line(source: &Path, exe: &Path, seconds: u64) -> String {
    let exe_name = exe
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| exe.display().to_string());
    format!(
        "{} not passed, {exe_name} timed out after {seconds}s",
        source.display().red()
    )
}

fn accepted_line(source: &Path) -> String {
    format!(
        "{} not passed, accepted by mcc (exit 0)",
        source.display().red()
    )
}
