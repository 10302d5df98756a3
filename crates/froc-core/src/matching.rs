//! Response/lesion matching for one rater on one case.
//!
//! Lesions and responses form the two sides of a capacity-1 stable
//! matching. A pair is admissible only when the lesion contains the
//! response ([`Response::is_true_positive`]); both sides rank their
//! admissible partners by ascending center distance, ties going to the
//! partner that comes first in canonical order. Deferred acceptance with
//! lesions proposing yields the lesion-optimal stable matching, which is
//! unique for total preference orders, so the result does not depend on
//! input order.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::errors::MatchError;
use crate::signals::{sort_signals, Lesion, Response, Signal};

/// A response credited with localizing a lesion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruePositive {
    pub response: Response,
    pub lesion: Lesion,
}

/// TP/FP partition of one rater's responses on one case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaterOutcome {
    pub true_positives: Vec<TruePositive>,
    pub false_positives: Vec<Response>,
}

impl RaterOutcome {
    /// Number of responses covered by this outcome.
    pub fn len(&self) -> usize {
        self.true_positives.len() + self.false_positives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ranked admissible partners for both sides, as indexes into the
/// canonically sorted lesion and response lists.
///
/// Only [`Preferences::build`] creates one, so every stored index is in
/// range for the lists it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    /// `lesions[i]` lists responses inside lesion `i`, closest first.
    lesions: Vec<Vec<usize>>,
    /// `responses[j]` lists lesions containing response `j`, closest first.
    responses: Vec<Vec<usize>>,
}

impl Preferences {
    pub fn build(responses: &[Response], lesions: &[Lesion]) -> Self {
        let lesion_prefs = lesions
            .iter()
            .map(|lesion| {
                rank_by_distance(
                    responses
                        .iter()
                        .enumerate()
                        .filter(|(_, r)| r.is_true_positive(lesion))
                        .map(|(j, r)| (j, lesion.distance(r))),
                )
            })
            .collect();

        let response_prefs = responses
            .iter()
            .map(|response| {
                rank_by_distance(
                    lesions
                        .iter()
                        .enumerate()
                        .filter(|(_, l)| response.is_true_positive(l))
                        .map(|(i, l)| (i, response.distance(l))),
                )
            })
            .collect();

        Self {
            lesions: lesion_prefs,
            responses: response_prefs,
        }
    }

    pub fn lesion_count(&self) -> usize {
        self.lesions.len()
    }

    pub fn response_count(&self) -> usize {
        self.responses.len()
    }

    /// Responses admissible for `lesion`, closest first. Empty when out of range.
    pub fn lesion_ranking(&self, lesion: usize) -> &[usize] {
        self.lesions.get(lesion).map_or(&[], Vec::as_slice)
    }

    /// Lesions admissible for `response`, closest first. Empty when out of range.
    pub fn response_ranking(&self, response: usize) -> &[usize] {
        self.responses.get(response).map_or(&[], Vec::as_slice)
    }

    /// Position of `lesion` in the ranking of `response`, if admissible.
    pub fn response_rank(&self, response: usize, lesion: usize) -> Option<usize> {
        self.response_ranking(response).iter().position(|&l| l == lesion)
    }

    /// Position of `response` in the ranking of `lesion`, if admissible.
    pub fn lesion_rank(&self, lesion: usize, response: usize) -> Option<usize> {
        self.lesion_ranking(lesion).iter().position(|&r| r == response)
    }
}

fn rank_by_distance(candidates: impl Iterator<Item = (usize, f64)>) -> Vec<usize> {
    let mut ranked: Vec<(usize, f64)> = candidates.collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().map(|(idx, _)| idx).collect()
}

/// Lesion-proposing deferred acceptance with lesion capacity 1.
///
/// Returns, for each lesion, the index of the response it holds.
pub fn deferred_acceptance(prefs: &Preferences) -> Vec<Option<usize>> {
    let n_lesions = prefs.lesions.len();
    let n_responses = prefs.responses.len();

    // rank[j][i]: position of lesion i in response j's list.
    let mut rank = vec![vec![usize::MAX; n_lesions]; n_responses];
    for (j, ranked) in prefs.responses.iter().enumerate() {
        for (pos, &i) in ranked.iter().enumerate() {
            rank[j][i] = pos;
        }
    }

    let mut next_proposal = vec![0usize; n_lesions];
    let mut held_by: Vec<Option<usize>> = vec![None; n_responses];
    let mut free: VecDeque<usize> = (0..n_lesions).collect();

    while let Some(lesion) = free.pop_front() {
        while let Some(&response) = prefs.lesions[lesion].get(next_proposal[lesion]) {
            next_proposal[lesion] += 1;
            match held_by[response] {
                None => {
                    held_by[response] = Some(lesion);
                    break;
                }
                Some(current) if rank[response][lesion] < rank[response][current] => {
                    held_by[response] = Some(lesion);
                    free.push_back(current);
                    break;
                }
                Some(_) => {}
            }
        }
    }

    let mut assignment = vec![None; n_lesions];
    for (response, lesion) in held_by.iter().enumerate() {
        if let Some(lesion) = *lesion {
            assignment[lesion] = Some(response);
        }
    }
    assignment
}

/// Admissible (lesion, response) pairs that would both rather be matched
/// to each other than keep `assignment`. Empty for a stable matching.
///
/// Lesions missing from `assignment` count as unmatched; out-of-range
/// response indexes in it are ignored.
pub fn blocking_pairs(prefs: &Preferences, assignment: &[Option<usize>]) -> Vec<(usize, usize)> {
    let mut partner_of_response = vec![None; prefs.response_count()];
    for (lesion, response) in assignment.iter().enumerate() {
        if let Some(slot) = response.and_then(|r| partner_of_response.get_mut(r)) {
            *slot = Some(lesion);
        }
    }

    let mut pairs = Vec::new();
    for (lesion, ranked) in prefs.lesions.iter().enumerate() {
        let held = assignment.get(lesion).copied().flatten();
        for &response in ranked {
            if held == Some(response) {
                continue;
            }
            let lesion_wants = match held {
                None => true,
                Some(current) => {
                    prefs.lesion_rank(lesion, response) < prefs.lesion_rank(lesion, current)
                }
            };
            let response_wants = match partner_of_response[response] {
                None => true,
                Some(current) => {
                    prefs.response_rank(response, lesion) < prefs.response_rank(response, current)
                }
            };
            if lesion_wants && response_wants {
                pairs.push((lesion, response));
            }
        }
    }
    pairs
}

fn find_duplicate<T: PartialEq>(items: &[T]) -> Option<(usize, usize)> {
    for (i, a) in items.iter().enumerate() {
        for (j, b) in items.iter().enumerate().skip(i + 1) {
            if a == b {
                return Some((i, j));
            }
        }
    }
    None
}

/// Splits `responses` into true positives and false positives against
/// `lesions`.
///
/// Fails only when either list contains the same signal twice. Empty lists
/// are valid: with no lesions or no responses every response is a false
/// positive.
pub fn match_responses(
    responses: &[Response],
    lesions: &[Lesion],
) -> Result<RaterOutcome, MatchError> {
    if let Some((first, second)) = find_duplicate(lesions) {
        return Err(MatchError::DuplicateLesion {
            name: lesions[first].name().to_string(),
            first,
            second,
        });
    }
    if let Some((first, second)) = find_duplicate(responses) {
        return Err(MatchError::DuplicateResponse {
            name: responses[first].name().to_string(),
            first,
            second,
        });
    }

    let responses = sort_signals(responses);
    let lesions = sort_signals(lesions);

    if responses.is_empty() || lesions.is_empty() {
        return Ok(RaterOutcome {
            true_positives: Vec::new(),
            false_positives: responses,
        });
    }

    let prefs = Preferences::build(&responses, &lesions);
    let assignment = deferred_acceptance(&prefs);

    let mut matched = vec![false; responses.len()];
    let mut true_positives = Vec::new();
    for (lesion_idx, response_idx) in assignment.iter().enumerate() {
        if let Some(j) = *response_idx {
            let response = &responses[j];
            let lesion = &lesions[lesion_idx];
            debug_assert!(response.is_true_positive(lesion));
            matched[j] = true;
            true_positives.push(TruePositive {
                response: response.clone(),
                lesion: lesion.clone(),
            });
        }
    }

    let false_positives: Vec<Response> = responses
        .into_iter()
        .zip(matched)
        .filter_map(|(r, m)| (!m).then_some(r))
        .collect();

    tracing::debug!(
        lesions = lesions.len(),
        tp = true_positives.len(),
        fp = false_positives.len(),
        "matched responses"
    );

    Ok(RaterOutcome {
        true_positives,
        false_positives,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::SeriesCoordinates;

    fn lesion(x: f64, y: f64, z: f64, r: f64, name: &str) -> Lesion {
        Lesion::new(SeriesCoordinates::new(x, y, z), r, name).unwrap()
    }

    fn response(x: f64, y: f64, z: f64, confidence: f64, name: &str) -> Response {
        Response::new(SeriesCoordinates::new(x, y, z), 1.0, name, confidence).unwrap()
    }

    #[test]
    fn closest_response_wins_the_lesion() {
        let l = lesion(0.0, 0.0, 0.0, 5.0, "L");
        let a = response(1.0, 0.0, 0.0, 0.9, "A");
        let b = response(2.0, 0.0, 0.0, 0.5, "B");

        let out = match_responses(&[b.clone(), a.clone()], &[l.clone()]).unwrap();
        assert_eq!(
            out.true_positives,
            vec![TruePositive {
                response: a,
                lesion: l
            }]
        );
        assert_eq!(out.false_positives, vec![b]);
    }

    #[test]
    fn response_outside_radius_is_false_positive() {
        let l = lesion(0.0, 0.0, 0.0, 3.0, "L");
        let r = response(5.0, 0.0, 0.0, 1.0, "R");
        let out = match_responses(&[r.clone()], &[l]).unwrap();
        assert!(out.true_positives.is_empty());
        assert_eq!(out.false_positives, vec![r]);
    }

    #[test]
    fn response_covered_by_two_lesions_goes_to_the_closer_one() {
        let near = lesion(0.0, 0.0, 0.0, 2.0, "near");
        let far = lesion(3.0, 0.0, 0.0, 2.0, "far");
        let r = response(1.2, 0.0, 0.0, 1.0, "R");

        let out = match_responses(&[r.clone()], &[far, near.clone()]).unwrap();
        assert_eq!(out.true_positives.len(), 1);
        assert_eq!(out.true_positives[0].lesion, near);
        assert!(out.false_positives.is_empty());
    }

    #[test]
    fn displaced_lesion_falls_back_to_its_next_choice() {
        // L1 prefers R1, but R1 is closer to L2; L1 then takes R2.
        let l1 = lesion(0.0, 0.0, 0.0, 4.0, "L1");
        let l2 = lesion(5.0, 0.0, 0.0, 4.0, "L2");
        let r1 = response(3.0, 0.0, 0.0, 1.0, "R1");
        let r2 = response(-3.5, 0.0, 0.0, 1.0, "R2");

        let out = match_responses(&[r1.clone(), r2.clone()], &[l1.clone(), l2.clone()]).unwrap();
        assert!(out.false_positives.is_empty());
        let pairs: Vec<(&str, &str)> = out
            .true_positives
            .iter()
            .map(|tp| (tp.response.name(), tp.lesion.name()))
            .collect();
        assert!(pairs.contains(&("R1", "L2")));
        assert!(pairs.contains(&("R2", "L1")));
    }

    #[test]
    fn empty_inputs_skip_matching() {
        let l = lesion(0.0, 0.0, 0.0, 5.0, "L");
        let r = response(0.0, 0.0, 0.0, 1.0, "R");

        let out = match_responses(&[], &[l]).unwrap();
        assert!(out.is_empty());

        let out = match_responses(&[r.clone()], &[]).unwrap();
        assert!(out.true_positives.is_empty());
        assert_eq!(out.false_positives, vec![r]);
    }

    #[test]
    fn duplicates_are_rejected() {
        let l = lesion(0.0, 0.0, 0.0, 5.0, "L");
        let r = response(0.0, 0.0, 0.0, 1.0, "R");

        let err = match_responses(&[r.clone()], &[l.clone(), l.clone()]).unwrap_err();
        assert_eq!(
            err,
            MatchError::DuplicateLesion {
                name: "L".into(),
                first: 0,
                second: 1
            }
        );

        let other = response(9.0, 0.0, 0.0, 1.0, "X");
        let err = match_responses(&[r.clone(), other, r], &[l]).unwrap_err();
        assert!(matches!(
            err,
            MatchError::DuplicateResponse {
                first: 0,
                second: 2,
                ..
            }
        ));
    }

    #[test]
    fn equidistant_responses_tie_break_on_canonical_order() {
        let l = lesion(0.0, 0.0, 0.0, 5.0, "L");
        let low = response(0.0, 0.0, -1.0, 0.2, "low");
        let high = response(0.0, 0.0, 1.0, 0.8, "high");

        let a = match_responses(&[high.clone(), low.clone()], &[l.clone()]).unwrap();
        let b = match_responses(&[low.clone(), high.clone()], &[l]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.true_positives[0].response, low);
    }

    #[test]
    fn deferred_acceptance_result_has_no_blocking_pairs() {
        let lesions = vec![
            lesion(0.0, 0.0, 0.0, 3.0, "a"),
            lesion(2.0, 0.0, 0.0, 3.0, "b"),
            lesion(4.0, 0.0, 0.0, 3.0, "c"),
        ];
        let responses = vec![
            response(1.0, 0.0, 0.0, 1.0, "1"),
            response(1.5, 0.5, 0.0, 1.0, "2"),
            response(3.0, 0.0, 0.0, 1.0, "3"),
            response(9.0, 0.0, 0.0, 1.0, "4"),
        ];
        let prefs = Preferences::build(&responses, &lesions);
        let assignment = deferred_acceptance(&prefs);
        assert!(blocking_pairs(&prefs, &assignment).is_empty());
        assert!(prefs.response_ranking(3).is_empty());
        assert_eq!(prefs.lesion_count(), 3);
        assert_eq!(prefs.response_count(), 4);
    }

    #[test]
    fn rankings_out_of_range_are_empty() {
        let lesions = vec![lesion(0.0, 0.0, 0.0, 3.0, "a")];
        let responses = vec![response(1.0, 0.0, 0.0, 1.0, "1")];
        let prefs = Preferences::build(&responses, &lesions);

        assert!(prefs.lesion_ranking(5).is_empty());
        assert!(prefs.response_ranking(5).is_empty());
        assert_eq!(prefs.lesion_rank(5, 0), None);
        // A truncated assignment leaves the lesion free, so its pair blocks.
        assert_eq!(blocking_pairs(&prefs, &[]), [(0, 0)]);
        assert_eq!(blocking_pairs(&prefs, &[Some(7)]), [(0, 0)]);
    }
}
