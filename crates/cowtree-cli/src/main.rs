//! `cowtree` command line tool
//!
//! Runs the hero scenario against the bundled fixture, or applies
//! `PATH=JSON` edits to a JSON document through a single produce call.

mod edit;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use cowtree::{DraftError, ProduceConfig, Producer, SharingReport, Value};
use cowtree_test_utils::{run_hero_scenario, test_data};
use edit::{apply_all, Edit};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Command::new("cowtree")
        .version(cowtree::VERSION)
        .about("Copy-on-write updates of nested records and sequences")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log produce calls at debug level"),
        )
        .subcommand(Command::new("demo").about("Run the hero scenario on the bundled fixture"))
        .subcommand(
            Command::new("apply")
                .about("Apply edits to a JSON document and print the result")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .short('i')
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON document to edit"),
                )
                .arg(
                    Arg::new("set")
                        .long("set")
                        .short('s')
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(Edit))
                        .help("Edit of the form PATH=JSON, applied in order"),
                )
                .arg(
                    Arg::new("strict-keys")
                        .long("strict-keys")
                        .action(ArgAction::SetTrue)
                        .help("Reject keys that do not match the container kind"),
                )
                .arg(
                    Arg::new("allow-sparse")
                        .long("allow-sparse")
                        .action(ArgAction::SetTrue)
                        .help("Pad sequences with null on writes past the end"),
                )
                .arg(
                    Arg::new("max-sparse-gap")
                        .long("max-sparse-gap")
                        .value_parser(value_parser!(usize))
                        .help("Most nulls one sparse write may pad with"),
                )
                .arg(
                    Arg::new("report")
                        .long("report")
                        .action(ArgAction::SetTrue)
                        .help("Print which containers were shared or rebuilt"),
                ),
        );

    let matches = cli.get_matches();
    init_tracing(matches.get_flag("verbose"));

    let outcome = match matches.subcommand() {
        Some(("demo", _)) => run_demo(),
        Some(("apply", args)) => run_apply(args),
        _ => Ok(true),
    };

    match outcome {
        Ok(passed) => std::process::exit(if passed { 0 } else { 1 }),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "cowtree=debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_demo() -> Result<bool> {
    let base = test_data();
    let outcome = run_hero_scenario(&base).context("hero scenario failed")?;

    let tags = outcome
        .result
        .as_record()
        .and_then(|record| record.get("tags"))
        .cloned()
        .unwrap_or_default();
    println!("Result tags: {tags}");

    if outcome.untouched {
        println!("Origin Data remains untouched.");
    } else {
        println!("Origin Data has been mutated.");
    }
    if outcome.result_right {
        println!("Result is right.");
    } else {
        println!("Result is wrong.");
    }

    Ok(outcome.passed())
}

fn run_apply(args: &ArgMatches) -> Result<bool> {
    let input = args
        .get_one::<PathBuf>("input")
        .context("missing --input")?;
    let edits: Vec<Edit> = args
        .get_many::<Edit>("set")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let config = ProduceConfig::new()
        .with_strict_keys(args.get_flag("strict-keys"))
        .with_sparse_writes(args.get_flag("allow-sparse"));
    let config = match args.get_one::<usize>("max-sparse-gap") {
        Some(max) => config.with_max_sparse_gap(*max),
        None => config,
    };

    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let base: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;

    tracing::info!(input = %input.display(), edits = edits.len(), "applying edits");

    let (result, stats) = Producer::new(config)
        .produce_with_stats::<_, DraftError>(&base, |draft| apply_all(draft, &edits))
        .context("failed to apply edits")?;

    let json = serde_json::to_string_pretty(&result).context("failed to encode result")?;
    println!("{json}");

    if args.get_flag("report") {
        let report = SharingReport::compare(&base, &result);
        println!();
        print!("{report}");
        println!("rebuilt {} reused {}", stats.rebuilt, stats.reused);
    }

    Ok(true)
}
