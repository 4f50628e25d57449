use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser};

use mccdiff_harness::{
    discover, retain_matching, run_diff, run_reject, HarnessConfig, RunSummary, Toolchain,
};

#[derive(Parser, Debug)]
#[command(name = "mccdiff")]
#[command(about = "Differential test harness for the mcc C compiler.", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Compare mcc against the reference compiler on a corpus of programs.
    Diff(DiffArgs),
    /// Check that every program in an invalid corpus is rejected by mcc.
    Reject(RejectArgs),
}

#[derive(Debug, Args)]
struct CorpusArgs {
    /// Directory scanned for .c test programs.
    #[arg(long, value_name = "DIR")]
    tests: Option<PathBuf>,

    #[arg(long, value_name = "DIR", default_value = "tests/build")]
    artifact_dir: PathBuf,

    /// Wall-clock limit per compiled program; 0 disables the limit.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout_seconds: u64,

    /// Only run tests whose stem contains SUBSTR.
    #[arg(long, value_name = "SUBSTR")]
    filter: Option<String>,

    /// Treat --filter as a whole-stem match.
    #[arg(long)]
    exact: bool,

    /// Print the discovered test names and exit.
    #[arg(long)]
    list: bool,

    /// Abort on the first toolchain failure instead of recording it.
    #[arg(long)]
    fail_fast: bool,

    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct DiffArgs {
    #[command(flatten)]
    corpus: CorpusArgs,
}

#[derive(Debug, Args)]
struct RejectArgs {
    #[command(flatten)]
    corpus: CorpusArgs,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Command::Diff(args) => cmd_diff(args),
        Command::Reject(args) => cmd_reject(args),
    }
}

fn cmd_diff(args: DiffArgs) -> Result<ExitCode> {
    let (config, list) = harness_config(args.corpus, "tests/basic");
    if list {
        return list_tests(&config);
    }
    let summary = run_diff(&config, &Toolchain::from_env())?;
    Ok(exit_code_for(&summary))
}

fn cmd_reject(args: RejectArgs) -> Result<ExitCode> {
    let (config, list) = harness_config(args.corpus, "tests/invalid");
    if list {
        return list_tests(&config);
    }
    let summary = run_reject(&config, &Toolchain::from_env())?;
    Ok(exit_code_for(&summary))
}

fn harness_config(args: CorpusArgs, default_tests: &str) -> (HarnessConfig, bool) {
    let config = HarnessConfig {
        tests_dir: args.tests.unwrap_or_else(|| PathBuf::from(default_tests)),
        artifact_dir: args.artifact_dir,
        timeout_seconds: args.timeout_seconds,
        filter: args.filter,
        exact: args.exact,
        fail_fast: args.fail_fast,
        verbose: args.verbose,
    };
    (config, args.list)
}

fn list_tests(config: &HarnessConfig) -> Result<ExitCode> {
    let mut cases = discover(&config.tests_dir)?;
    if let Some(filter) = &config.filter {
        retain_matching(&mut cases, filter, config.exact);
    }
    for case in &cases {
        println!("{}", case.stem);
    }
    Ok(ExitCode::SUCCESS)
}

fn exit_code_for(summary: &RunSummary) -> ExitCode {
    if summary.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
