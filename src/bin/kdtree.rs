//! `kdtree`: build, persist and query KD-Tree models from the command line.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use kdtree_nn::core::indexing::kdtree::{read_model, DecodeLimits};
use kdtree_nn::core::query::write_results;
use kdtree_nn::{Config, CsvTable, DataTable, KdTreeIndex};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a tree over DATA and save it to MODEL.
    Build {
        data: PathBuf,
        model: PathBuf,
        /// Hyperplane bound stored with the index (not persisted in the model).
        #[arg(long)]
        bound: Option<f64>,
        /// Split rule: 0 max std, 1 min |skew|, 2 min |kurtosis|.
        #[arg(long)]
        rule: Option<i64>,
        /// Write the model without the `# nodes=<N>` header.
        #[arg(long)]
        plain: bool,
        /// Print the built tree to stdout.
        #[arg(long)]
        print: bool,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Answer every row of QUERIES and write `index,distance` lines to OUTPUT.
    Query {
        data: PathBuf,
        model: PathBuf,
        queries: PathBuf,
        output: PathBuf,
        #[arg(long)]
        bound: Option<f64>,
        /// Run queries on the current thread only.
        #[arg(long)]
        sequential: bool,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print a saved model with the coordinates of each node.
    Print { data: PathBuf, model: PathBuf },
    /// Print a JSON summary of a saved model.
    Inspect {
        model: PathBuf,
        /// Check the model against this table.
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Commands::Build {
            data,
            model,
            bound,
            rule,
            plain,
            print,
            config,
        } => {
            let config = load_config(config.as_deref())?
                .with_overrides(bound, rule, plain, false)?;

            let table = load_table(&data)?;
            let index = KdTreeIndex::build(table, &config)
                .with_context(|| format!("Failed to build a tree over '{}'", data.display()))?;
            index.save(&model)?;
            if print {
                print!("{}", index.render()?);
            }
        }
        Commands::Query {
            data,
            model,
            queries,
            output,
            bound,
            sequential,
            config,
        } => {
            let config = load_config(config.as_deref())?
                .with_overrides(bound, None, false, sequential)?;

            let index = KdTreeIndex::open(load_table(&data)?, &model, &config)
                .with_context(|| format!("Invalid model '{}'", model.display()))?;
            let queries = load_table(&queries)?;
            let results = index.search_all(&queries)?;

            let file = File::create(&output)
                .with_context(|| format!("Cannot create output '{}'", output.display()))?;
            write_results(&results, BufWriter::new(file))
                .with_context(|| format!("Failed to write results to '{}'", output.display()))?;
            info!("Wrote {} results to {}", results.len(), output.display());
        }
        Commands::Print { data, model } => {
            let index = KdTreeIndex::open(load_table(&data)?, &model, &Config::default())
                .with_context(|| format!("Invalid model '{}'", model.display()))?;
            print!("{}", index.render()?);
        }
        Commands::Inspect { model, data } => {
            let limits = match data {
                Some(path) => DecodeLimits::for_table(&load_table(&path)?),
                None => DecodeLimits::unbounded(),
            };
            let file = File::open(&model)
                .with_context(|| format!("Cannot open model '{}'", model.display()))?;
            let tree = read_model(BufReader::new(file), limits)
                .with_context(|| format!("Invalid model '{}'", model.display()))?;
            println!("{}", serde_json::to_string_pretty(&tree.summary())?);
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Ok(Config::load_or_default(path)?)
}

fn load_table(path: &Path) -> Result<CsvTable> {
    let table = CsvTable::from_path(path)?;
    info!(
        "Loaded {} rows x {} dims from {}",
        table.size(),
        table.dim(),
        path.display()
    );
    Ok(table)
}
