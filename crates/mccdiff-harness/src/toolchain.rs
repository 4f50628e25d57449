use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

use crate::artifacts::ArtifactDir;
use crate::discover::TestCase;
use crate::exec;

/// Which external tool a per-test failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Reference C compiler building the trusted binary.
    Reference,
    /// Compiler-under-test lowering the source to assembly.
    Compile,
    /// Assembler turning the assembly file into an executable.
    Assemble,
}

impl Phase {
    /// Conventional name of the tool driving this phase.
    pub fn tool(self) -> &'static str {
        match self {
            Phase::Reference => "cc",
            Phase::Compile => "mcc",
            Phase::Assemble => "fasm",
        }
    }
}

/// A per-test toolchain failure. Distinct from a harness error: the run
/// records it against the test and continues.
#[derive(Debug)]
pub enum ToolFailure {
    /// The tool exited non-zero.
    Exited { phase: Phase, status: i32 },
    /// The tool exited zero but the artifact it promised never appeared.
    MissingOutput { phase: Phase, expected: PathBuf },
}

/// Outcome of one adapter invocation.
#[derive(Debug)]
pub enum BuildOutcome {
    Built(PathBuf),
    Failed(ToolFailure),
}

/// Resolved commands for the three external tools.
///
/// Names are conventional (`cc`, `mcc`, `fasm`) and looked up on `PATH`;
/// each can be overridden with `MCCDIFF_CC`, `MCCDIFF_MCC`, `MCCDIFF_FASM`.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub cc: OsString,
    pub mcc: OsString,
    pub fasm: OsString,
}

impl Toolchain {
    pub fn from_env() -> Toolchain {
        Toolchain {
            cc: std::env::var_os("MCCDIFF_CC").unwrap_or_else(|| "cc".into()),
            mcc: std::env::var_os("MCCDIFF_MCC").unwrap_or_else(|| "mcc".into()),
            fasm: std::env::var_os("MCCDIFF_FASM").unwrap_or_else(|| "fasm".into()),
        }
    }

    /// `cc <source> -o <stem>_cc`. The reference build never says anything
    /// about the compiler-under-test; its failures are reported as
    /// reference-phase failures.
    pub fn compile_reference(&self, case: &TestCase) -> Result<BuildOutcome> {
        let status = Command::new(&self.cc)
            .arg(&case.source)
            .arg("-o")
            .arg(&case.reference_exe)
            .status()
            .with_context(|| {
                format!("spawn reference compiler: {}", display_tool(&self.cc))
            })?;
        if !status.success() {
            return Ok(BuildOutcome::Failed(ToolFailure::Exited {
                phase: Phase::Reference,
                status: exec::exit_code(status),
            }));
        }
        if !case.reference_exe.is_file() {
            return Ok(BuildOutcome::Failed(ToolFailure::MissingOutput {
                phase: Phase::Reference,
                expected: case.reference_exe.clone(),
            }));
        }
        Ok(BuildOutcome::Built(case.reference_exe.clone()))
    }

    /// `mcc <source>` then `fasm <stem>.asm` (assembler stdout suppressed).
    /// On success the assembly file is stashed as evidence and the
    /// executable is renamed with the `_mcc` suffix so the two toolchains
    /// cannot collide.
    pub fn compile_under_test(
        &self,
        case: &TestCase,
        artifacts: &ArtifactDir,
    ) -> Result<BuildOutcome> {
        let status = Command::new(&self.mcc)
            .arg(&case.source)
            .status()
            .with_context(|| {
                format!("spawn compiler-under-test: {}", display_tool(&self.mcc))
            })?;
        if !status.success() {
            return Ok(BuildOutcome::Failed(ToolFailure::Exited {
                phase: Phase::Compile,
                status: exec::exit_code(status),
            }));
        }
        if !case.asm.is_file() {
            return Ok(BuildOutcome::Failed(ToolFailure::MissingOutput {
                phase: Phase::Compile,
                expected: case.asm.clone(),
            }));
        }

        let status = Command::new(&self.fasm)
            .arg(&case.asm)
            .stdout(Stdio::null())
            .status()
            .with_context(|| format!("spawn assembler: {}", display_tool(&self.fasm)))?;
        if !status.success() {
            return Ok(BuildOutcome::Failed(ToolFailure::Exited {
                phase: Phase::Assemble,
                status: exec::exit_code(status),
            }));
        }
        if !case.assembled.is_file() {
            return Ok(BuildOutcome::Failed(ToolFailure::MissingOutput {
                phase: Phase::Assemble,
                expected: case.assembled.clone(),
            }));
        }

        artifacts
            .stash(&case.asm)
            .with_context(|| format!("stash assembly file: {}", case.asm.display()))?;
        fs::rename(&case.assembled, &case.under_test_exe).with_context(|| {
            format!(
                "rename {} -> {}",
                case.assembled.display(),
                case.under_test_exe.display()
            )
        })?;
        Ok(BuildOutcome::Built(case.under_test_exe.clone()))
    }

    /// Run only the compiler-under-test with its output suppressed and
    /// report its exit code. Rejection mode's single probe.
    pub fn compile_silenced(&self, case: &TestCase) -> Result<i32> {
        let status = Command::new(&self.mcc)
            .arg(&case.source)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| {
                format!("spawn compiler-under-test: {}", display_tool(&self.mcc))
            })?;
        Ok(exec::exit_code(status))
    }
}

fn display_tool(tool: &OsString) -> String {
    Path::new(tool).display().to_string()
}
