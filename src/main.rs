//! aml_subtypes command-line interface

use std::fs;

use clap::Parser;
use log::{info, LevelFilter};

use aml_subtypes::cli::{Cli, Commands, InputArgs, View};
use aml_subtypes::prelude::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const SUBCOMMANDS: [&str; 7] = ["prepare", "precompute", "build", "query", "genes", "write-config", "help"];

/// Top-level output when no subcommand is given; clap's own help is disabled
fn print_without_subcommand(args: &[String]) {
    let flags = args.get(1..).unwrap_or_default();
    if flags.iter().any(|a| a == "--help") {
        print_long_help();
    } else if flags.iter().any(|a| a == "-h") {
        print_short_help();
    } else if flags.iter().any(|a| a == "-V" || a == "--version") {
        println!("aml_subtypes {}", VERSION);
    } else {
        print_no_args();
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let subcommand = args.iter().skip(1).find(|a| !a.starts_with('-'));
    if !subcommand.map_or(false, |a| SUBCOMMANDS.contains(&a.as_str())) {
        print_without_subcommand(&args);
        return;
    }

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Some(Commands::Prepare { inputs, output }) => run_prepare(&inputs, &output),
        Some(Commands::Precompute { data, threads }) => run_precompute(&data, threads),
        Some(Commands::Build {
            inputs,
            output,
            threads,
        }) => run_build(&inputs, &output, threads),
        Some(Commands::Query {
            data,
            gene,
            view,
            pretty,
        }) => run_query(&data, &gene, view, pretty),
        Some(Commands::Genes { data, prefix, limit }) => run_genes(&data, prefix.as_deref(), limit),
        Some(Commands::WriteConfig { output }) => run_write_config(output.as_deref()),
        None => {
            print_no_args();
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_no_args() {
    println!("aml_subtypes v{}", VERSION);
    println!("Run `aml_subtypes -h` for usage or `aml_subtypes --help` for detailed information.");
}

fn print_short_help() {
    println!("aml_subtypes v{}", VERSION);
    println!();
    println!("Usage: aml_subtypes <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  prepare       Align raw inputs into a data directory");
    println!("  precompute    Test every gene against every subtype");
    println!("  build         prepare + precompute");
    println!("  query         Heatmap or boxplot bundle for one gene (JSON)");
    println!("  genes         Print the autocomplete list");
    println!("  write-config  Print the default preparation settings");
    println!();
    println!("Run `aml_subtypes <COMMAND> -h` for command-specific options.");
}

fn print_long_help() {
    println!("aml_subtypes v{}", VERSION);
    println!("Gene expression by genetic subtype in AML cohorts");
    println!();
    println!("Usage: aml_subtypes <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  prepare       Align raw inputs into a data directory");
    println!("                  - patients shared by RNA and DNA data, sorted");
    println!("                  - protein-coding genes with clean symbols");
    println!("                  - expression and variance filters, z-scaling");
    println!("                  - recurrent mutations as subtype columns");
    println!("  precompute    Wilcoxon rank-sum per gene and subtype,");
    println!("                Benjamini-Hochberg within each gene");
    println!("  build         prepare + precompute");
    println!("  query         Heatmap or boxplot bundle for one gene (JSON)");
    println!("  genes         Print the autocomplete list");
    println!("  write-config  Print the default preparation settings");
    println!();
    println!("Global Options:");
    println!("  -v, --verbose    Enable verbose output");
    println!("  -h               Print short help");
    println!("      --help       Print detailed help");
    println!("  -V, --version    Print version");
    println!();
    println!("Examples:");
    println!("  aml_subtypes build -e expression.tsv -m mutations.tsv -s mapping.tsv -o data/");
    println!();
    println!("  aml_subtypes query -d data/ -g MEIS1 --view boxplot --pretty");
    println!();
    println!("  aml_subtypes genes -d data/ --prefix HOX");
}

fn configure_threads(threads: usize) {
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }
}

fn load_config(path: Option<&str>) -> Result<PrepConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            PrepConfig::from_json_file(path)
        }
        None => Ok(PrepConfig::default()),
    }
}

fn run_prepare(inputs: &InputArgs, output: &str) -> Result<()> {
    let config = load_config(inputs.config.as_deref())?;
    let prepared = prepare(&inputs.expression, &inputs.mutations, &inputs.mapping, output, &config)?;

    println!();
    println!("{}", prepared.report);
    println!(
        "Aligned {} genes x {} patients, {} subtypes -> {}",
        prepared.cohort.n_genes(),
        prepared.cohort.n_patients(),
        prepared.cohort.mutations().n_subtypes(),
        output
    );
    Ok(())
}

fn run_precompute(data: &str, threads: usize) -> Result<()> {
    configure_threads(threads);
    let table = precompute(data)?;

    println!();
    println!("{}", table.summary());
    Ok(())
}

fn run_build(inputs: &InputArgs, output: &str, threads: usize) -> Result<()> {
    configure_threads(threads);
    let config = load_config(inputs.config.as_deref())?;
    let table = build(&inputs.expression, &inputs.mutations, &inputs.mapping, output, &config)?;

    println!();
    println!("{}", table.summary());
    println!("Data directory: {}", output);
    Ok(())
}

fn run_query(data: &str, gene: &str, view: View, pretty: bool) -> Result<()> {
    let store = CohortStore::load(data)?;

    let json = match view {
        View::Heatmap => {
            let bundle = store.heatmap(gene)?;
            if pretty {
                serde_json::to_string_pretty(&bundle)?
            } else {
                serde_json::to_string(&bundle)?
            }
        }
        View::Boxplot => {
            let result = store.boxplot(gene)?;
            info!("{} significant subtypes for {}", result.n_significant(), gene.trim());
            if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            }
        }
    };

    println!("{}", json);
    Ok(())
}

fn run_genes(data: &str, prefix: Option<&str>, limit: usize) -> Result<()> {
    let store = CohortStore::load(data)?;
    match prefix {
        Some(prefix) => {
            for gene in store.suggest(prefix, limit) {
                println!("{}", gene);
            }
        }
        None => {
            for gene in store.genes() {
                println!("{}", gene);
            }
        }
    }
    Ok(())
}

fn run_write_config(output: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(&PrepConfig::default())?;
    match output {
        Some(path) => {
            fs::write(path, json + "\n")?;
            info!("Default configuration written to: {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
