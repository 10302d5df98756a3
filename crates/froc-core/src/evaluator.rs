//! Runs the matcher for every (case, rater) pair of a collection.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::collection::{CaseCollection, CaseInput, EvaluationInput};
use crate::errors::EvaluationError;
use crate::keys::{CaseKey, RaterCaseKey};
use crate::matching::{match_responses, RaterOutcome};
use crate::signals::{sort_signals, Lesion};

/// Matching outcome of every rater on one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseEvaluation {
    pub case_key: CaseKey,
    /// Lesions in canonical order.
    pub lesions: Vec<Lesion>,
    pub raters: BTreeMap<RaterCaseKey, RaterOutcome>,
}

pub type EvaluationResult = BTreeMap<CaseKey, CaseEvaluation>;

pub fn evaluate_case(case: &CaseInput) -> Result<CaseEvaluation, EvaluationError> {
    let mut raters = BTreeMap::new();
    for (rater_key, responses) in &case.responses {
        let outcome = match_responses(responses, &case.lesions).map_err(|source| {
            EvaluationError::Matching {
                case: case.case_key.clone(),
                rater: rater_key.clone(),
                source,
            }
        })?;
        raters.insert(rater_key.clone(), outcome);
    }

    tracing::debug!(case = %case.case_key, raters = raters.len(), "evaluated case");

    Ok(CaseEvaluation {
        case_key: case.case_key.clone(),
        lesions: sort_signals(&case.lesions),
        raters,
    })
}

pub fn evaluate_input(input: &EvaluationInput) -> Result<EvaluationResult, EvaluationError> {
    input
        .iter()
        .map(|(key, case)| Ok((key.clone(), evaluate_case(case)?)))
        .collect()
}

/// Indexed evaluation over a case collection, optionally memoized.
///
/// The collection is assumed immutable for the evaluator's lifetime, so
/// cached entries are never invalidated. Each cached slot is written at
/// most once; concurrent first accesses may compute twice but the first
/// stored value is the one every caller sees.
pub struct Evaluator<C> {
    collection: C,
    cache: Option<Vec<OnceLock<Arc<CaseEvaluation>>>>,
}

impl<C: CaseCollection> Evaluator<C> {
    pub fn new(collection: C) -> Self {
        let cache = Some((0..collection.len()).map(|_| OnceLock::new()).collect());
        Self { collection, cache }
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = match (enabled, self.cache.take()) {
            (true, Some(existing)) => Some(existing),
            (true, None) => Some((0..self.collection.len()).map(|_| OnceLock::new()).collect()),
            (false, _) => None,
        };
        self
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<Arc<CaseEvaluation>, EvaluationError> {
        let case = self
            .collection
            .case(index)
            .ok_or(EvaluationError::IndexOutOfRange {
                index,
                len: self.collection.len(),
            })?;

        let Some(slot) = self.cache.as_ref().and_then(|c| c.get(index)) else {
            return Ok(Arc::new(evaluate_case(case)?));
        };
        if let Some(hit) = slot.get() {
            return Ok(Arc::clone(hit));
        }

        let computed = Arc::new(evaluate_case(case)?);
        let _ = slot.set(Arc::clone(&computed));
        Ok(slot.get().cloned().unwrap_or(computed))
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<Arc<CaseEvaluation>, EvaluationError>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    pub fn evaluate_all(&self) -> Result<EvaluationResult, EvaluationError> {
        let mut result = EvaluationResult::new();
        for evaluation in self.iter() {
            let evaluation = evaluation?;
            result.insert(evaluation.case_key.clone(), (*evaluation).clone());
        }
        tracing::info!(cases = result.len(), "evaluation finished");
        Ok(result)
    }

    /// Same result as [`Evaluator::evaluate_all`], with cases spread over
    /// the rayon thread pool.
    #[cfg(feature = "parallel")]
    pub fn evaluate_all_parallel(&self) -> Result<EvaluationResult, EvaluationError>
    where
        C: Sync,
    {
        use rayon::prelude::*;

        let evaluations = (0..self.len())
            .into_par_iter()
            .map(|i| self.get(i))
            .collect::<Result<Vec<_>, _>>()?;
        let result: EvaluationResult = evaluations
            .into_iter()
            .map(|e| (e.case_key.clone(), (*e).clone()))
            .collect();
        tracing::info!(cases = result.len(), "parallel evaluation finished");
        Ok(result)
    }
}
