#![cfg(unix)]

use std::fs;

use mccdiff_harness::run_diff;

use fake_toolchain::{config, dir_names, sandbox, write_source};

#[test]
fn matching_programs_pass() {
    let sb = sandbox("diff-pass");
    write_source(&sb.corpus, "return_0.c", "int main(void) { return 0; }\n");
    write_source(&sb.corpus, "return_5.c", "int main(void) { return 5; }\n");

    let cfg = config(&sb);
    let summary = run_diff(&cfg, &sb.toolchain).expect("run ok");
    assert_eq!(summary.total, 2);
    assert_eq!(summary.passed, 2);
    assert_eq!(summary.failed, 0);

    // Corpus is clean again; every byproduct moved to the artifact dir.
    assert_eq!(dir_names(&sb.corpus), ["return_0.c", "return_5.c"]);
    assert_eq!(
        dir_names(&cfg.artifact_dir),
        [
            "return_0.asm",
            "return_0_cc",
            "return_0_mcc",
            "return_5.asm",
            "return_5_cc",
            "return_5_mcc",
        ]
    );
    let _ = fs::remove_dir_all(&sb.root);
}

#[test]
fn miscompiled_program_fails() {
    let sb = sandbox("diff-miscompile");
    write_source(
        &sb.corpus,
        "return_5.c",
        "int main(void) { return 5; } /* MCC_RETURNS=0 */\n",
    );

    let summary = run_diff(&config(&sb), &sb.toolchain).expect("run ok");
    assert_eq!(summary.total, 1);
    assert_eq!(summary.passed, 0);
    assert_eq!(summary.failed, 1);
    let _ = fs::remove_dir_all(&sb.root);
}

#[test]
fn compile_failure_is_recorded_and_the_run_continues() {
    let sb = sandbox("diff-reject");
    write_source(&sb.corpus, "a_bad.c", "int main(void) { MCC_REJECT }\n");
    write_source(&sb.corpus, "b_good.c", "int main(void) { return 1; }\n");

    let summary = run_diff(&config(&sb), &sb.toolchain).expect("run ok");
    assert_eq!(summary.total, 2);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 1);
    let _ = fs::remove_dir_all(&sb.root);
}

#[test]
fn assembler_failure_sweeps_the_assembly_file() {
    let sb = sandbox("diff-asmfail");
    write_source(
        &sb.corpus,
        "bad.c",
        "int main(void) { return 1; } /* ASM_FAIL */\n",
    );

    let cfg = config(&sb);
    let summary = run_diff(&cfg, &sb.toolchain).expect("run ok");
    assert_eq!(summary.failed, 1);

    // The orphaned .asm must not stay beside the source.
    assert_eq!(dir_names(&sb.corpus), ["bad.c"]);
    assert!(dir_names(&cfg.artifact_dir).contains(&"bad.asm".to_string()));
    let _ = fs::remove_dir_all(&sb.root);
}

#[test]
fn missing_assembly_output_fails_the_test() {
    let sb = sandbox("diff-silent");
    write_source(
        &sb.corpus,
        "quiet.c",
        "int main(void) { return 1; } /* MCC_SILENT */\n",
    );

    let summary = run_diff(&config(&sb), &sb.toolchain).expect("run ok");
    assert_eq!(summary.total, 1);
    assert_eq!(summary.failed, 1);
    let _ = fs::remove_dir_all(&sb.root);
}

#[test]
fn fail_fast_aborts_on_toolchain_failure() {
    let sb = sandbox("diff-failfast");
    write_source(&sb.corpus, "a_bad.c", "int main(void) { MCC_REJECT }\n");
    write_source(&sb.corpus, "b_good.c", "int main(void) { return 1; }\n");

    let mut cfg = config(&sb);
    cfg.fail_fast = true;
    assert!(run_diff(&cfg, &sb.toolchain).is_err());
    let _ = fs::remove_dir_all(&sb.root);
}

#[test]
fn artifact_dir_is_reset_and_verdicts_are_stable() {
    let sb = sandbox("diff-reset");
    write_source(&sb.corpus, "return_3.c", "int main(void) { return 3; }\n");

    let cfg = config(&sb);
    fs::create_dir_all(&cfg.artifact_dir).unwrap();
    fs::write(cfg.artifact_dir.join("stale_exe"), b"old").unwrap();

    let first = run_diff(&cfg, &sb.toolchain).expect("first run ok");
    assert!(!cfg.artifact_dir.join("stale_exe").exists());

    let second = run_diff(&cfg, &sb.toolchain).expect("second run ok");
    assert_eq!(first.passed, second.passed);
    assert_eq!(first.failed, second.failed);
    assert_eq!(
        dir_names(&cfg.artifact_dir),
        ["return_3.asm", "return_3_cc", "return_3_mcc"]
    );
    let _ = fs::remove_dir_all(&sb.root);
}

#[test]
fn hung_program_times_out_instead_of_hanging_the_run() {
    let sb = sandbox("diff-hang");
    write_source(
        &sb.corpus,
        "spin.c",
        "int main(void) { while (1) { } } /* SLEEP=30 */\n",
    );

    let mut cfg = config(&sb);
    cfg.timeout_seconds = 1;
    let summary = run_diff(&cfg, &sb.toolchain).expect("run ok");
    assert_eq!(summary.total, 1);
    assert_eq!(summary.failed, 1);
    let _ = fs::remove_dir_all(&sb.root);
}

#[test]
fn filter_narrows_the_total() {
    let sb = sandbox("diff-filter");
    write_source(&sb.corpus, "return_0.c", "int main(void) { return 0; }\n");
    write_source(&sb.corpus, "return_5.c", "int main(void) { return 5; }\n");
    write_source(&sb.corpus, "loop.c", "int main(void) { return 9; }\n");

    let mut cfg = config(&sb);
    cfg.filter = Some("return".to_string());
    let summary = run_diff(&cfg, &sb.toolchain).expect("run ok");
    assert_eq!(summary.total, 2);
    assert_eq!(summary.passed, 2);
    let _ = fs::remove_dir_all(&sb.root);
}
