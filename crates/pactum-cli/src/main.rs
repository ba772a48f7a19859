//! Contract enforcement demo CLI.
//!
//! Provides the `pactum` binary, which runs one of the built-in scenarios
//! and prints a JSON report of the outcome.

mod scenarios;

use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;

use pactum_check::enforcement;
use pactum_check::{ContractError, ContractViolation, EnforcementMode, Value};

/// Runtime contracts for callables and types.
#[derive(Parser)]
#[command(name = "pactum", about = "Runtime contracts for callables and types")]
struct Cli {
    /// Enforcement mode: enabled or disabled (default: $PACTUM_CONTRACTS,
    /// else enabled in debug builds).
    #[arg(long)]
    mode: Option<EnforcementMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a demonstration scenario.
    Run {
        #[command(subcommand)]
        scenario: Scenario,
    },
}

#[derive(Subcommand)]
enum Scenario {
    /// Withdraw from an account whose balance must stay non-negative.
    Bank {
        #[arg(long)]
        balance: i64,

        #[arg(long)]
        withdraw: i64,
    },
    /// Add two positive integers (broken when `i` is 7).
    Add {
        #[arg(long)]
        i: i64,

        #[arg(long)]
        j: i64,
    },
    /// Sum a one-shot stream of 1..n behind an "all positive" check.
    SumStream {
        #[arg(long)]
        n: i64,

        /// Materialize the stream before the check runs.
        #[arg(long)]
        materialize: bool,
    },
}

impl Scenario {
    fn name(&self) -> &'static str {
        match self {
            Scenario::Bank { .. } => "bank",
            Scenario::Add { .. } => "add",
            Scenario::SumStream { .. } => "sum-stream",
        }
    }

    fn run(&self) -> Result<Value, ContractError> {
        match *self {
            Scenario::Bank { balance, withdraw } => scenarios::bank(balance, withdraw),
            Scenario::Add { i, j } => scenarios::add(i, j),
            Scenario::SumStream { n, materialize } => scenarios::sum_stream(n, materialize),
        }
    }
}

#[derive(Serialize)]
struct Report {
    scenario: &'static str,
    mode: EnforcementMode,
    #[serde(flatten)]
    outcome: Outcome,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Outcome {
    Ok { result: Value },
    Violation { violation: ContractViolation },
    Error { message: String },
}

impl Outcome {
    fn from_result(result: Result<Value, ContractError>) -> Self {
        match result {
            Ok(result) => Outcome::Ok { result },
            Err(ContractError::Violation(violation)) => Outcome::Violation { violation },
            Err(e) => Outcome::Error {
                message: e.to_string(),
            },
        }
    }

    /// 0 = success, 1 = contract violation, 2 = any other error.
    fn exit_code(&self) -> i32 {
        match self {
            Outcome::Ok { .. } => 0,
            Outcome::Violation { .. } => 1,
            Outcome::Error { .. } => 2,
        }
    }
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    if let Some(mode) = cli.mode {
        if let Err(e) = enforcement::init(mode) {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
        tracing::info!(%mode, "contract enforcement fixed from --mode");
    }

    match cli.command {
        Commands::Run { scenario } => {
            let report = Report {
                scenario: scenario.name(),
                mode: enforcement::mode(),
                outcome: Outcome::from_result(scenario.run()),
            };
            let code = report.outcome.exit_code();
            tracing::info!(scenario = report.scenario, code, "scenario finished");
            let json = serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
                format!("{{\"error\": \"failed to serialize report: {}\"}}", e)
            });
            println!("{}", json);
            process::exit(code);
        }
    }
}
