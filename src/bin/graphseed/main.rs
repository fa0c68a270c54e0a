use clap::{Args, Parser, Subcommand};
use log::error;
use std::{path::PathBuf, process::ExitCode};

use graphseed::{AvailableKgDataset, DatasetSplit};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "graphseed", version, about = "Materialize knowledge datasets as property graphs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a dataset and its graph store, then print the dataset record
    Create(CreateArgs),
    /// Print the tables of a graph store with their node and edge counts
    Inspect {
        /// directory of the graph store
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
pub(crate) struct CreateArgs {
    #[arg(long)]
    pub(crate) name: String,
    /// knowledge-graph benchmark dataset, e.g. FB15k
    #[arg(long, value_name = "DATASET", conflicts_with = "stix", required_unless_present = "stix")]
    pub(crate) kg: Option<AvailableKgDataset>,
    /// split of the knowledge graph to load, may be repeated (default: train)
    #[arg(long = "split", value_name = "SPLIT", requires = "kg")]
    pub(crate) splits: Vec<DatasetSplit>,
    /// STIX bundle file, raw JSON or a data URL
    #[arg(long, value_name = "FILE")]
    pub(crate) stix: Option<PathBuf>,
    /// keep exactly this many nodes
    #[arg(long, conflicts_with = "ratio")]
    pub(crate) count: Option<usize>,
    /// keep this share of the nodes, in (0, 1]
    #[arg(long)]
    pub(crate) ratio: Option<f64>,
    /// directory holding graphseed.toml, defaults to $GRAPHSEED_HOME
    #[arg(long)]
    pub(crate) home: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let res = match cli.command {
        Command::Create(args) => commands::create(args),
        Command::Inspect { path } => commands::inspect(&path),
    };
    match res {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
