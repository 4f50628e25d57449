use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Extension of the programs the corpus directories hold.
pub const SOURCE_EXT: &str = "c";

const ASM_EXT: &str = "asm";
const REFERENCE_SUFFIX: &str = "_cc";
const UNDER_TEST_SUFFIX: &str = "_mcc";

/// One test program and every path the toolchains derive from it.
///
/// All derivation goes through `Path` components, so a source like
/// `loop.v2.c` keeps its inner dots intact (`loop.v2.asm`, `loop.v2_cc`).
#[derive(Debug, Clone)]
pub struct TestCase {
    /// The `.c` source inside the corpus directory.
    pub source: PathBuf,
    /// File stem, used for report lines and filtering.
    pub stem: String,
    /// Assembly file the compiler-under-test emits next to the source.
    pub asm: PathBuf,
    /// Executable the assembler emits (assembly path minus its extension).
    pub assembled: PathBuf,
    /// Reference executable, disambiguated with the `_cc` suffix.
    pub reference_exe: PathBuf,
    /// Under-test executable, disambiguated with the `_mcc` suffix.
    pub under_test_exe: PathBuf,
}

impl TestCase {
    fn from_source(source: PathBuf) -> Option<TestCase> {
        let stem = source.file_stem()?.to_str()?.to_string();
        let dir = source.parent()?;
        let reference_exe = dir.join(format!("{stem}{REFERENCE_SUFFIX}"));
        let under_test_exe = dir.join(format!("{stem}{UNDER_TEST_SUFFIX}"));
        Some(TestCase {
            asm: source.with_extension(ASM_EXT),
            assembled: source.with_extension(""),
            reference_exe,
            under_test_exe,
            stem,
            source,
        })
    }
}

/// Collect every `.c` file directly inside `dir`, sorted by file name so
/// verdict order does not depend on the filesystem.
pub fn discover(dir: &Path) -> Result<Vec<TestCase>> {
    let mut cases = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("scan test directory: {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if path.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXT) {
            continue;
        }
        if let Some(case) = TestCase::from_source(path) {
            cases.push(case);
        }
    }
    Ok(cases)
}

/// Keep only the cases whose stem matches `filter`.
pub fn retain_matching(cases: &mut Vec<TestCase>, filter: &str, exact: bool) {
    if exact {
        cases.retain(|c| c.stem == filter);
    } else {
        cases.retain(|c| c.stem.contains(filter));
    }
}
