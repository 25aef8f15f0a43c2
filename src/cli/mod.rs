//! Command-line interface for aml_subtypes

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "aml_subtypes")]
#[command(version)]
#[command(about = "Gene expression by genetic subtype in AML cohorts")]
#[command(disable_help_flag = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Which bundle `query` returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Heatmap,
    Boxplot,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Align raw inputs into a data directory
    #[command(
        long_about = "Align raw inputs into a data directory.\n\n\
            Joins expression and mutation data through the sample mapping, keeps\n\
            protein-coding genes with clean symbols that pass the expression and\n\
            variance filters, z-scales each gene and builds the subtype panel.",
        after_long_help = "\
Examples:
  aml_subtypes prepare -e expression.tsv -m mutations.tsv -s mapping.tsv -o data/
  aml_subtypes prepare -e expression.tsv -m mutations.tsv -s mapping.tsv -o data/ \\
    --config thresholds.json"
    )]
    Prepare {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output data directory
        #[arg(short, long)]
        output: String,
    },

    /// Test every gene against every subtype in a data directory
    #[command(
        long_about = "Test every gene against every subtype in a data directory.\n\n\
            Runs a Wilcoxon rank-sum test per gene and subtype, adjusts the p-values\n\
            of each gene across its subtypes (Benjamini-Hochberg) and writes\n\
            stat_results.tsv next to the aligned tables.",
        after_long_help = "\
Examples:
  aml_subtypes precompute -d data/
  aml_subtypes precompute -d data/ --threads 8"
    )]
    Precompute {
        /// Data directory written by `prepare`
        #[arg(short, long)]
        data: String,

        /// Number of worker threads [default: all cores]
        #[arg(long, default_value_t = 0,
            long_help = "Number of worker threads for the per-gene tests.\n\
                0 uses every available core.")]
        threads: usize,
    },

    /// Run prepare and precompute in one pass
    #[command(after_long_help = "\
Examples:
  aml_subtypes build -e expression.tsv -m mutations.tsv -s mapping.tsv -o data/")]
    Build {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output data directory
        #[arg(short, long)]
        output: String,

        /// Number of worker threads [default: all cores]
        #[arg(long, default_value_t = 0)]
        threads: usize,
    },

    /// Print the heatmap or boxplot bundle for one gene as JSON
    #[command(
        long_about = "Print the heatmap or boxplot bundle for one gene as JSON.\n\n\
            The gene must be in the autocomplete list. A boxplot for a gene with no\n\
            significant subtype prints an explicit no_significant_results object.",
        after_long_help = "\
Examples:
  aml_subtypes query -d data/ -g MEIS1
  aml_subtypes query -d data/ -g MEIS1 --view boxplot --pretty"
    )]
    Query {
        /// Data directory
        #[arg(short, long)]
        data: String,

        /// Gene symbol
        #[arg(short, long)]
        gene: String,

        /// Bundle to build [default: heatmap]
        #[arg(long, value_enum, default_value_t = View::Heatmap)]
        view: View,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the autocomplete list
    Genes {
        /// Data directory
        #[arg(short, long)]
        data: String,

        /// Only genes starting with this prefix (case-insensitive)
        #[arg(long)]
        prefix: Option<String>,

        /// Maximum number of suggestions with --prefix
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Print the default preparation settings as JSON
    WriteConfig {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Raw input files shared by `prepare` and `build`
#[derive(clap::Args)]
pub struct InputArgs {
    /// Expression table
    #[arg(short, long,
        long_help = "Expression table (genes x RNA samples).\n\
            Must have 'symbol' and 'biotype' columns; columns named after a mapped\n\
            RNA sample hold log2 normalized values. Tab or comma delimited.")]
    pub expression: String,

    /// Mutation call list
    #[arg(short, long,
        long_help = "Mutation call list with 'sample_id', 'symbol' and 't_vaf' columns.\n\
            Sample IDs are DNA sample IDs. Missing VAF may be empty or NA.")]
    pub mutations: String,

    /// Sample mapping
    #[arg(short = 's', long,
        long_help = "Sample mapping with 'patient_id', 'rna_sample_id' and 'dna_sample_id'\n\
            columns. Patients lacking either sample are dropped.")]
    pub mapping: String,

    /// JSON file overriding filter thresholds
    #[arg(short, long)]
    pub config: Option<String>,
}
