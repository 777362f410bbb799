//! NAAb Governance CLI
//!
//! The `naab-govern` command checks polyglot blocks against a `govern.json`
//! policy and inspects audit ledgers.
//!
//! ## Commands
//!
//! - `check`: run the check catalog over one block
//! - `lint`: load a policy and print its schema warnings
//! - `verify-audit`: verify a tamper-evident audit ledger
//! - `catalog`: list the registered checks in evaluation order

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::{info, Level};

use naab_governance::rules::FileOutput;
use naab_governance::{
    catalog, telemetry, verify_ledger, write_reports, Governance, LoadedPolicy, RuleStore, VERSION,
};

#[derive(Parser)]
#[command(name = "naab-govern")]
#[command(author = "NAAb Contributors")]
#[command(version = VERSION)]
#[command(
    about = "Governance checks and audit verification for NAAb polyglot blocks",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Check one polyglot block against the policy
    Check {
        /// File holding the block source
        file: PathBuf,

        /// Block language (python, javascript, shell, ...)
        #[arg(short, long)]
        language: String,

        /// Policy file (default: discover govern.json upward from the block)
        #[arg(short, long)]
        policy: Option<PathBuf>,

        /// Allow SOFT violations for this run (each override is audited)
        #[arg(long = "governance-override")]
        governance_override: bool,

        /// Line of the block in its host file
        #[arg(long, default_value_t = 0)]
        line: usize,

        /// Environment variable holding the audit ledger HMAC key
        #[arg(long)]
        key_env: Option<String>,

        /// Print the governance summary after the check
        #[arg(long)]
        summary: bool,

        /// Result format on stdout
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[command(flatten)]
        reports: ReportArgs,
    },

    /// Load a policy and print schema warnings
    Lint {
        /// Policy file (default: discover govern.json from the current directory)
        #[arg(short, long)]
        policy: Option<PathBuf>,

        /// Exit non-zero when any warning is raised
        #[arg(long)]
        strict: bool,
    },

    /// Verify a tamper-evident audit ledger
    VerifyAudit {
        /// Ledger file (one JSON entry per line)
        ledger: PathBuf,

        /// Environment variable holding the HMAC key; signatures are checked when set
        #[arg(long)]
        key_env: Option<String>,

        /// Report format on stdout
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List registered checks in evaluation order
    Catalog,
}

/// Report paths given on the command line, relative to the working directory.
#[derive(clap::Args)]
struct ReportArgs {
    #[arg(long)]
    report_json: Option<PathBuf>,
    #[arg(long)]
    report_sarif: Option<PathBuf>,
    #[arg(long)]
    report_junit: Option<PathBuf>,
    #[arg(long)]
    report_csv: Option<PathBuf>,
    #[arg(long)]
    report_html: Option<PathBuf>,
}

impl ReportArgs {
    fn file_output(self) -> FileOutput {
        FileOutput {
            report_json: self.report_json,
            report_sarif: self.report_sarif,
            report_junit: self.report_junit,
            report_csv: self.report_csv,
            report_html: self.report_html,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    telemetry::init_tracing(cli.json, level);

    match cli.command {
        Commands::Check {
            file,
            language,
            policy,
            governance_override,
            line,
            key_env,
            summary,
            format,
            reports,
        } => cmd_check(CheckArgs {
            file: &file,
            language: &language,
            policy: policy.as_deref(),
            governance_override,
            line,
            key_env: key_env.as_deref(),
            summary,
            format,
            reports: reports.file_output(),
        }),
        Commands::Lint { policy, strict } => cmd_lint(policy.as_deref(), strict),
        Commands::VerifyAudit {
            ledger,
            key_env,
            format,
        } => cmd_verify_audit(&ledger, key_env.as_deref(), format),
        Commands::Catalog => cmd_catalog(),
    }
}

fn read_key(var: Option<&str>) -> Result<Option<Vec<u8>>> {
    let Some(var) = var else {
        return Ok(None);
    };
    let key = std::env::var(var).with_context(|| format!("HMAC key variable {var} is not set"))?;
    if key.is_empty() {
        anyhow::bail!("HMAC key variable {var} is empty");
    }
    Ok(Some(key.into_bytes()))
}

fn load_policy(explicit: Option<&Path>, start: &Path) -> Result<Option<LoadedPolicy>> {
    let policy = match explicit {
        Some(path) => Some(RuleStore::load(path)?),
        None => RuleStore::discover_and_load(start)?,
    };
    Ok(policy)
}

struct CheckArgs<'a> {
    file: &'a Path,
    language: &'a str,
    policy: Option<&'a Path>,
    governance_override: bool,
    line: usize,
    key_env: Option<&'a str>,
    summary: bool,
    format: OutputFormat,
    reports: FileOutput,
}

fn cmd_check(args: CheckArgs<'_>) -> Result<ExitCode> {
    let code = std::fs::read_to_string(args.file)
        .with_context(|| format!("Failed to read block source: {:?}", args.file))?;

    let start = args
        .file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let Some(policy) = load_policy(args.policy, start)? else {
        eprintln!("[governance] no govern.json found; governance inactive");
        return Ok(ExitCode::SUCCESS);
    };
    for warning in &policy.warnings {
        eprintln!("[governance] warning: {warning}");
    }

    let key = read_key(args.key_env)?;
    let gov = Governance::from_policy(&policy, key.as_deref()).quiet();
    gov.set_override(args.governance_override);

    let source = args.file.display().to_string();
    let outcome = gov.check_polyglot_block_traced(args.language, &code, &source, args.line);
    info!(
        language = args.language,
        evaluated = outcome.evaluated.len(),
        blocked = outcome.is_blocked(),
        "block checked"
    );

    match args.format {
        OutputFormat::Json => {
            let doc = json!({
                "file": source,
                "language": args.language,
                "blocked": outcome.is_blocked(),
                "message": outcome.blocked,
                "evaluated": outcome.evaluated,
                "violations": outcome.violations,
                "results": gov.results(),
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Text => match &outcome.blocked {
            Some(message) => eprintln!("{message}"),
            None => println!(
                "ok: {} checks evaluated, {} violation(s), not blocked",
                outcome.evaluated.len(),
                outcome.violations
            ),
        },
    }

    if args.summary || gov.rules().output.summary.enabled {
        eprint!("{}", gov.format_summary());
    }

    let results = gov.results();
    let mut written = gov.write_reports()?;
    written.extend(write_reports(
        &args.reports,
        Path::new("."),
        gov.rules().mode,
        &results,
    )?);
    for path in &written {
        eprintln!("[governance] report written: {}", path.display());
    }

    let counts = gov.finish();
    info!(
        passed = counts.passed,
        warned = counts.warned,
        blocked = counts.blocked,
        "governance session complete"
    );

    Ok(if outcome.is_blocked() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn cmd_lint(policy: Option<&Path>, strict: bool) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let Some(policy) = load_policy(policy, &cwd)? else {
        anyhow::bail!("no govern.json found from {:?} upward", cwd);
    };

    println!(
        "{}: mode {}, {} custom rule(s)",
        policy.source.display(),
        policy.rules.mode,
        policy.rules.custom_rules.len()
    );
    if policy.warnings.is_empty() {
        println!("no warnings");
        return Ok(ExitCode::SUCCESS);
    }
    for warning in &policy.warnings {
        println!("warning: {warning}");
    }
    Ok(if strict {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn cmd_verify_audit(
    ledger: &Path,
    key_env: Option<&str>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let key = read_key(key_env)?;
    let report = verify_ledger(ledger, key.as_deref());
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", report.report()),
    }
    Ok(if report.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_catalog() -> Result<ExitCode> {
    for (i, desc) in catalog().iter().enumerate() {
        let category = serde_json::to_value(desc.category)?;
        println!(
            "{:>2}. {:<45} {:<13} {}",
            i + 1,
            desc.id,
            category.as_str().unwrap_or_default(),
            desc.default_level
        );
    }
    Ok(ExitCode::SUCCESS)
}
