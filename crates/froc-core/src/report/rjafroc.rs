//! Flattens an evaluation result into the TRUTH / TP / FP tables consumed by
//! RJafroc, plus two lookup tables mapping ids back to lesions and raters.
//!
//! Numbering: cases by their position in the result, lesions from 1 within
//! each case (0 marks a case without lesions), readers and modalities from
//! 0 in first-seen order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::errors::ReportError;
use crate::evaluator::EvaluationResult;
use crate::report::ids::IdInterner;
use crate::signals::Signal;

pub const PARADIGM_FROC: &str = "FROC";
pub const PARADIGM_FCTRL: &str = "FCTRL";

/// Row of the TRUTH table. Padding rows leave the ids empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthRow {
    pub case_id: Option<u32>,
    pub lesion_id: Option<u32>,
    pub weight: Option<f64>,
    pub reader_ids: Vec<u32>,
    pub modality_ids: Vec<u32>,
    pub paradigm: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TpRow {
    pub reader_id: u32,
    pub modality_id: u32,
    pub case_id: u32,
    pub lesion_id: u32,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FpRow {
    pub reader_id: u32,
    pub modality_id: u32,
    pub case_id: u32,
    pub rating: f64,
}

/// Lesion geometry behind a `(case_id, lesion_id)` pair. Geometry is empty
/// for the placeholder row of a lesion-free case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LesionRow {
    pub modality_id: u32,
    pub modality: String,
    pub case_id: u32,
    pub patient_id: String,
    pub study_date: String,
    pub series_number: String,
    pub lesion_id: u32,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaterRow {
    pub reader_id: u32,
    pub rater: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RjafrocReport {
    pub truth: Vec<TruthRow>,
    pub tp: Vec<TpRow>,
    pub fp: Vec<FpRow>,
    pub lesions: Vec<LesionRow>,
    pub raters: Vec<RaterRow>,
}

impl RjafrocReport {
    pub fn from_result(result: &EvaluationResult) -> Result<Self, ReportError> {
        let mut modalities = IdInterner::<String>::new(0);
        let mut readers = IdInterner::<String>::new(0);
        let mut lesion_modalities: BTreeMap<(u32, u32), BTreeSet<u32>> = BTreeMap::new();
        let mut report = Self::default();

        for (case_id, evaluation) in result.values().enumerate() {
            let case_id = case_id as u32;
            let key = &evaluation.case_key;
            let modality_id = modalities.intern(&key.modality().to_string());

            let lesion_row = |lesion_id: u32, geometry: Option<([f64; 3], f64)>| LesionRow {
                modality_id,
                modality: key.modality().to_string(),
                case_id,
                patient_id: key.patient_id().to_string(),
                study_date: key.study_date().to_string(),
                series_number: key.series_number().to_string(),
                lesion_id,
                x: geometry.map(|(c, _)| c[0]),
                y: geometry.map(|(c, _)| c[1]),
                z: geometry.map(|(c, _)| c[2]),
                radius: geometry.map(|(_, r)| r),
            };

            if evaluation.lesions.is_empty() {
                lesion_modalities
                    .entry((case_id, 0))
                    .or_default()
                    .insert(modality_id);
                report.truth.push(truth_row(case_id, 0, 0.0));
                report.lesions.push(lesion_row(0, None));
            } else {
                let weight = 1.0 / evaluation.lesions.len() as f64;
                for (i, lesion) in evaluation.lesions.iter().enumerate() {
                    let lesion_id = i as u32 + 1;
                    lesion_modalities
                        .entry((case_id, lesion_id))
                        .or_default()
                        .insert(modality_id);
                    report.truth.push(truth_row(case_id, lesion_id, weight));
                    report.lesions.push(lesion_row(
                        lesion_id,
                        Some((lesion.coords().to_array(), lesion.radius())),
                    ));
                }
            }

            for (rater_key, outcome) in &evaluation.raters {
                let reader_id = readers.intern(&rater_key.rater_name().to_string());

                for tp in &outcome.true_positives {
                    let position = evaluation
                        .lesions
                        .iter()
                        .position(|l| *l == tp.lesion)
                        .ok_or_else(|| ReportError::UnknownLesion {
                            case: key.clone(),
                            rater: rater_key.clone(),
                        })?;
                    report.tp.push(TpRow {
                        reader_id,
                        modality_id,
                        case_id,
                        lesion_id: position as u32 + 1,
                        rating: tp.response.confidence(),
                    });
                }

                report
                    .fp
                    .extend(outcome.false_positives.iter().map(|r| FpRow {
                        reader_id,
                        modality_id,
                        case_id,
                        rating: r.confidence(),
                    }));
            }
        }

        while report.truth.len() < 2 {
            report.truth.push(TruthRow {
                case_id: None,
                lesion_id: None,
                weight: None,
                reader_ids: Vec::new(),
                modality_ids: Vec::new(),
                paradigm: String::new(),
            });
        }
        report.truth[0].paradigm = PARADIGM_FROC.to_string();
        report.truth[1].paradigm = PARADIGM_FCTRL.to_string();

        let reader_ids: Vec<u32> = readers.ids().collect();
        for row in &mut report.truth {
            row.reader_ids = reader_ids.clone();
            if let (Some(case_id), Some(lesion_id)) = (row.case_id, row.lesion_id) {
                row.modality_ids = lesion_modalities
                    .get(&(case_id, lesion_id))
                    .map(|ids| ids.iter().copied().collect())
                    .unwrap_or_default();
            }
        }

        report.raters = readers
            .iter()
            .map(|(reader_id, name)| RaterRow {
                reader_id,
                rater: name.clone(),
            })
            .collect();

        tracing::debug!(
            truth = report.truth.len(),
            tp = report.tp.len(),
            fp = report.fp.len(),
            "built report rows"
        );
        Ok(report)
    }
}

fn truth_row(case_id: u32, lesion_id: u32, weight: f64) -> TruthRow {
    TruthRow {
        case_id: Some(case_id),
        lesion_id: Some(lesion_id),
        weight: Some(weight),
        reader_ids: Vec::new(),
        modality_ids: Vec::new(),
        paradigm: String::new(),
    }
}
