use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use constraints::Encoding;

#[derive(Parser)]
#[command(name = "ercs")]
#[command(about = "Compile ercs programs to ER1CS constraint systems", long_about = None)]
pub struct Cli {
    /// Compiler configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Entry function, overrides the config file
    #[arg(long, global = true)]
    pub entry: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a source file and write the constraint system as JSON
    Compile {
        /// Path to the source file
        path: PathBuf,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Row encoding
        #[arg(long, value_enum)]
        encoding: Option<EncodingArg>,
        /// Append a blinding row
        #[arg(long)]
        randomize: bool,
    },
    /// Compile a source file, evaluate its witness and check every row
    Witness {
        /// Path to the source file
        path: PathBuf,
        /// Input values as name=value pairs (comma-separated, decimal or 0x hex)
        #[arg(long)]
        inputs: String,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EncodingArg {
    Dense,
    Sparse,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Dense => Encoding::Dense,
            EncodingArg::Sparse => Encoding::Sparse,
        }
    }
}
