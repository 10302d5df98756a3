//! Per-rater TP/FP counts for the console and the JSON report header.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::evaluator::EvaluationResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaterSummary {
    /// Cases this rater responded to.
    pub cases: usize,
    pub true_positives: usize,
    pub false_positives: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub cases: usize,
    pub lesions: usize,
    pub raters: BTreeMap<String, RaterSummary>,
}

impl Summary {
    pub fn from_result(result: &EvaluationResult) -> Self {
        let mut summary = Self {
            cases: result.len(),
            ..Self::default()
        };
        for evaluation in result.values() {
            summary.lesions += evaluation.lesions.len();
            for (rater_key, outcome) in &evaluation.raters {
                let entry = summary
                    .raters
                    .entry(rater_key.rater_name().to_string())
                    .or_default();
                entry.cases += 1;
                entry.true_positives += outcome.true_positives.len();
                entry.false_positives += outcome.false_positives.len();
            }
        }
        summary
    }

    pub fn total_true_positives(&self) -> usize {
        self.raters.values().map(|r| r.true_positives).sum()
    }

    pub fn total_false_positives(&self) -> usize {
        self.raters.values().map(|r| r.false_positives).sum()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} cases, {} lesions, {} raters",
            self.cases,
            self.lesions,
            self.raters.len()
        )?;
        for (name, r) in &self.raters {
            writeln!(
                f,
                "  {name}: {} cases, {} TP, {} FP",
                r.cases, r.true_positives, r.false_positives
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::InMemoryCollection;
    use crate::coords::SeriesCoordinates;
    use crate::evaluator::Evaluator;
    use crate::keys::CaseKey;
    use crate::signals::{Lesion, Response};

    #[test]
    fn counts_outcomes_per_rater() {
        let key = CaseKey::new("P1", "20240101", "CT", "1").unwrap();
        let lesion = Lesion::new(SeriesCoordinates::origin(), 3.0, "L").unwrap();
        let hit = Response::new(SeriesCoordinates::origin(), 1.0, "a", 1.0).unwrap();
        let miss = Response::new(SeriesCoordinates::new(9.0, 0.0, 0.0), 1.0, "b", 1.0).unwrap();

        let mut b = InMemoryCollection::builder();
        b.add_reference(key.clone(), vec![lesion]).unwrap();
        b.add_responses(key.to_rater_key("r1").unwrap(), vec![hit, miss.clone()])
            .unwrap();
        b.add_responses(key.to_rater_key("r2").unwrap(), vec![miss])
            .unwrap();
        let result = Evaluator::new(b.build()).evaluate_all().unwrap();

        let summary = Summary::from_result(&result);
        assert_eq!(summary.cases, 1);
        assert_eq!(summary.lesions, 1);
        assert_eq!(
            summary.raters["r1"],
            RaterSummary { cases: 1, true_positives: 1, false_positives: 1 }
        );
        assert_eq!(summary.total_true_positives(), 1);
        assert_eq!(summary.total_false_positives(), 2);
        assert!(summary.to_string().contains("r2: 1 cases, 0 TP, 1 FP"));
    }
}
