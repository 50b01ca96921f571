use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::args::{Cli, Commands};
use cli::commands::{compile, load_config, witness};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(entry) = &cli.entry {
        config.entry = entry.clone();
    }

    match &cli.command {
        Commands::Compile {
            path,
            out,
            encoding,
            randomize,
        } => {
            if let Some(encoding) = encoding {
                config.encoding = (*encoding).into();
            }
            config.randomize |= *randomize;
            compile::compile_file(path, out.as_deref(), &config)
        }
        Commands::Witness { path, inputs, out } => {
            witness::witness_file(path, inputs, out.as_deref(), &config)
        }
    }
}
