//! Flock CLI - resolve per-target configuration for a deployment fleet

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod display;
mod exit_codes;

#[derive(Parser)]
#[command(name = "flock")]
#[command(author = "Flock Contributors")]
#[command(version)]
#[command(about = "Fleet configuration resolver for chart deployments", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Values root directory
    #[arg(long, global = true, default_value = "values")]
    root: PathBuf,

    /// Inventory file
    #[arg(short, long, global = true, default_value = "inventory.yaml")]
    inventory: PathBuf,

    /// Playbook file
    #[arg(short, long, global = true, default_value = "playbook.yaml")]
    playbook: PathBuf,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List inventory entries and their resolved groups
    Targets {
        /// Limit to entries whose groups match these patterns
        #[arg(short, long)]
        limit: Vec<String>,
    },

    /// Print the layered values for one entry
    Values {
        /// Entry name
        entry: String,

        /// Print the pre-evaluation tree
        #[arg(long)]
        raw: bool,

        /// Do not attempt envelope decryption
        #[arg(long)]
        skip_decrypt: bool,

        /// Do not run the expression evaluator
        #[arg(long)]
        skip_eval: bool,

        /// Private age key file for envelope decryption
        #[arg(long, env = "SOPS_AGE_KEY_FILE")]
        age_key_file: Option<PathBuf>,

        /// Set values on the command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,
    },

    /// Materialize the playbook for matching entries
    Playbook {
        /// Entry name filter (anchored regex, empty matches all)
        filter: Option<String>,

        /// Limit to entries whose groups match these patterns
        #[arg(short, long)]
        limit: Vec<String>,

        /// Do not run the expression evaluator (prints raw trees)
        #[arg(long)]
        skip_eval: bool,

        /// Do not attempt envelope decryption
        #[arg(long)]
        skip_decrypt: bool,

        /// Directory with exported cluster data (<namespace>/<configMap>.yaml)
        #[arg(long)]
        cluster_data: Option<PathBuf>,

        /// Skip the cluster data merge even when --cluster-data is given
        #[arg(long)]
        skip_cluster_data: bool,

        /// Private age key file for envelope decryption
        #[arg(long, env = "SOPS_AGE_KEY_FILE")]
        age_key_file: Option<PathBuf>,

        /// Set values on the command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,

        /// Print only the admitted play names per target
        #[arg(long)]
        names_only: bool,
    },
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();

    if cli.debug {
        // SAFETY: We're the only thread at this point (start of main)
        unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
    }

    let result = match cli.command {
        Commands::Targets { limit } => commands::targets::run(&cli.inventory, &limit),

        Commands::Values {
            entry,
            raw,
            skip_decrypt,
            skip_eval,
            age_key_file,
            set,
        } => commands::values::run(
            &cli.root,
            &cli.inventory,
            &entry,
            raw,
            skip_decrypt,
            skip_eval,
            age_key_file.as_deref(),
            &set,
        ),

        Commands::Playbook {
            filter,
            limit,
            skip_eval,
            skip_decrypt,
            cluster_data,
            skip_cluster_data,
            age_key_file,
            set,
            names_only,
        } => commands::playbook::run(
            &cli.root,
            &cli.inventory,
            &cli.playbook,
            filter.as_deref().unwrap_or(""),
            &limit,
            skip_eval,
            skip_decrypt,
            cluster_data.as_deref(),
            skip_cluster_data,
            age_key_file.as_deref(),
            &set,
            names_only,
        ),
    };

    if let Err(report) = result {
        eprintln!("{:?}", report);
        std::process::exit(exit_codes::ERROR);
    }
}
