//! CLI argument parsing for dqm-autoplot

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "dqm-autoplot")]
#[command(version)]
#[command(
    about = "Generate default NanoAOD DQM plot definitions from a ROOT file's schema",
    long_about = None
)]
pub struct Cli {
    /// NanoAOD ROOT file, or a JSON schema snapshot (.json)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Where to write the generated configuration
    #[arg(short, long, value_name = "PATH", default_value = "newDQM.py")]
    pub output: PathBuf,

    /// Name of the tree to inspect
    #[arg(short, long, value_name = "NAME", default_value = "Events")]
    pub tree: String,

    /// Existing DQM configuration (TOML) to merge into, instead of the built-in one
    #[arg(long, value_name = "TOML")]
    pub existing: Option<PathBuf>,

    /// Also write the schema and value ranges as a JSON snapshot
    #[arg(long = "dump-schema", value_name = "JSON")]
    pub dump_schema: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long)]
    pub debug: bool,
}
