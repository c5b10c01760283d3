mod display;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rosie_core::{Module, Settings};
use rosie_driver::{Driver, RunReport};
use rosie_store::adapter_for;
use tracing::info;

#[derive(Parser)]
#[command(name = "rosie", version)]
#[command(about = "Flags suspicious congressional expense reimbursements")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a module's dataset, run its classifiers and write the suspicions.
    Run {
        #[arg(value_enum, default_value_t = Target::ChamberOfDeputies)]
        module: Target,
        /// Directory holding the datasets; outputs are written here too.
        #[arg(long, env = "ROSIE_DATA_PATH", default_value = "/tmp/serenata-data")]
        path: PathBuf,
        /// TOML file overriding classifier parameters and file names.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    ChamberOfDeputies,
    FederalSenate,
    /// Every module, each in its own sub-directory of `--path`.
    All,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    info!("rosie v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Command::Run {
            module,
            path,
            config,
        } => {
            let settings = Settings::load(config.as_deref()).context("loading settings")?;
            let runs = match module {
                Target::ChamberOfDeputies => vec![(Module::ChamberOfDeputies, path)],
                Target::FederalSenate => vec![(Module::FederalSenate, path)],
                Target::All => Module::ALL
                    .into_iter()
                    .map(|m| (m, path.join(m.dir_name())))
                    .collect(),
            };
            for (module, dir) in runs {
                let report = run(module, &dir, &settings)?;
                display::print_summary(&report)?;
            }
        }
    }
    Ok(())
}

fn run(module: Module, dir: &Path, settings: &Settings) -> anyhow::Result<RunReport> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating data directory {}", dir.display()))?;
    let dataset = adapter_for(module, settings)
        .dataset(dir)
        .with_context(|| format!("loading {module} dataset from {}", dir.display()))?;
    Driver::new(module, settings.clone())
        .run(&dataset, dir)
        .with_context(|| format!("running {module} classifiers"))
}
