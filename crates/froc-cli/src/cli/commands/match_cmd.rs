use std::path::Path;

use anyhow::Context;
use froc_core::{match_responses, Lesion, RaterOutcome, Response, SignalError, SignalRecord};
use serde::Deserialize;

use crate::cli::args::MatchArgs;
use crate::exit_codes;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MatchInput {
    #[serde(default)]
    lesions: Vec<SignalRecord>,
    #[serde(default)]
    responses: Vec<SignalRecord>,
}

fn convert<T: TryFrom<SignalRecord, Error = SignalError>>(
    records: Vec<SignalRecord>,
    kind: &str,
) -> anyhow::Result<Vec<T>> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, rec)| T::try_from(rec).with_context(|| format!("{kind} #{i}")))
        .collect()
}

pub fn match_file(path: &Path) -> anyhow::Result<RaterOutcome> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let input: MatchInput = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let lesions: Vec<Lesion> = convert(input.lesions, "lesion")?;
    let responses: Vec<Response> = convert(input.responses, "response")?;
    Ok(match_responses(&responses, &lesions)?)
}

pub fn run(args: MatchArgs) -> anyhow::Result<i32> {
    let outcome = match_file(&args.input)?;
    tracing::info!(
        tp = outcome.true_positives.len(),
        fp = outcome.false_positives.len(),
        "matched"
    );
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(exit_codes::SUCCESS)
}
