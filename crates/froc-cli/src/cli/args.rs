use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "froc",
    version,
    about = "Match rater responses to reference lesions and build FROC reader-study reports"
)]
pub struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create empty reference and rater directories for a list of series
    Prepare(PrepareArgs),
    /// Evaluate every rater against the reference and write a report
    Evaluate(EvaluateArgs),
    /// Match one set of responses against one set of lesions
    Match(MatchArgs),
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct PrepareArgs {
    /// Text file with one case path (`patient/YYYYMMDD_MOD/SE<n>`) per line
    #[arg(long)]
    pub keys: PathBuf,

    #[arg(long)]
    pub target_dir: PathBuf,

    #[arg(long, default_value_t = 3)]
    pub num_of_raters: usize,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Directory holding the reference and raters trees
    #[arg(long)]
    pub eval_dir: PathBuf,

    /// Report path (overrides output.path from the config)
    #[arg(long)]
    pub out_path: Option<PathBuf>,

    /// Config file. Defaults to <eval-dir>/froc.yaml when present
    #[arg(long, env = "FROC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable per-case result caching
    #[arg(long)]
    pub no_cache: bool,

    /// Evaluate cases on all cores
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MatchArgs {
    /// JSON document `{"lesions": [...], "responses": [...]}`
    #[arg(long)]
    pub input: PathBuf,
}
