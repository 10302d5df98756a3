use std::path::{Path, PathBuf};

use anyhow::Context;
use froc_core::config::{load_config, EvalConfig, DEFAULT_CONFIG_FILE};
use froc_core::report::{write_json, RjafrocReport, Summary};
use froc_core::{DirectoryLoader, Evaluator};

use crate::cli::args::EvaluateArgs;
use crate::exit_codes;

/// Explicit `--config`, else `<eval_dir>/froc.yaml` if it exists, else defaults.
fn resolve_config(eval_dir: &Path, explicit: Option<&Path>) -> anyhow::Result<EvalConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let candidate = eval_dir.join(DEFAULT_CONFIG_FILE);
            if !candidate.is_file() {
                return Ok(EvalConfig::default());
            }
            candidate
        }
    };
    tracing::info!(path = %path.display(), "using config");
    Ok(load_config(&path)?)
}

pub fn run(args: EvaluateArgs) -> anyhow::Result<i32> {
    let cfg = resolve_config(&args.eval_dir, args.config.as_deref())?;
    let use_cache = cfg.evaluation.cache && !args.no_cache;
    let parallel = cfg.evaluation.parallel || args.parallel;
    let out_path: PathBuf = args.out_path.unwrap_or(cfg.output.path);

    let collection = DirectoryLoader::new(&args.eval_dir)
        .with_layout(cfg.layout)
        .load()
        .with_context(|| format!("failed to load study from {}", args.eval_dir.display()))?;

    let evaluator = Evaluator::new(collection).with_cache(use_cache);
    let result = if parallel {
        evaluator.evaluate_all_parallel()?
    } else {
        evaluator.evaluate_all()?
    };

    let summary = Summary::from_result(&result);
    let report = RjafrocReport::from_result(&result)?;
    write_json(&report, &summary, &out_path)
        .with_context(|| format!("failed to write report {}", out_path.display()))?;

    print!("{summary}");
    println!("Report written to {}", out_path.display());
    Ok(exit_codes::SUCCESS)
}
