//! Reference lesions and rater responses grouped per case.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::CollectionError;
use crate::keys::{CaseKey, RaterCaseKey};
use crate::signals::{Lesion, Response};

/// Everything needed to evaluate one case: its lesions and the responses
/// of every rater who read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseInput {
    pub case_key: CaseKey,
    pub lesions: Vec<Lesion>,
    pub responses: BTreeMap<RaterCaseKey, Vec<Response>>,
}

impl CaseInput {
    pub fn new(case_key: CaseKey, lesions: Vec<Lesion>) -> Self {
        Self {
            case_key,
            lesions,
            responses: BTreeMap::new(),
        }
    }
}

pub type EvaluationInput = BTreeMap<CaseKey, CaseInput>;

/// Indexed, immutable access to the cases of a reader study.
pub trait CaseCollection {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The case at `index`, or `None` when `index >= len()`.
    fn case(&self, index: usize) -> Option<&CaseInput>;
}

/// Cases held in memory, ordered by [`CaseKey`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryCollection {
    cases: Vec<CaseInput>,
}

impl InMemoryCollection {
    pub fn builder() -> CaseCollectionBuilder {
        CaseCollectionBuilder::default()
    }

    pub fn from_input(input: EvaluationInput) -> Self {
        Self {
            cases: input.into_values().collect(),
        }
    }

    pub fn into_input(self) -> EvaluationInput {
        self.cases
            .into_iter()
            .map(|c| (c.case_key.clone(), c))
            .collect()
    }

    pub fn case_keys(&self) -> impl Iterator<Item = &CaseKey> + '_ {
        self.cases.iter().map(|c| &c.case_key)
    }

    pub fn cases(&self) -> &[CaseInput] {
        &self.cases
    }
}

impl CaseCollection for InMemoryCollection {
    fn len(&self) -> usize {
        self.cases.len()
    }

    fn case(&self, index: usize) -> Option<&CaseInput> {
        self.cases.get(index)
    }
}

/// Assembles a collection; reference cases must be registered before the
/// responses that refer to them.
#[derive(Debug, Default)]
pub struct CaseCollectionBuilder {
    cases: BTreeMap<CaseKey, CaseInput>,
}

impl CaseCollectionBuilder {
    pub fn add_reference(
        &mut self,
        case_key: CaseKey,
        lesions: Vec<Lesion>,
    ) -> Result<&mut Self, CollectionError> {
        if self.cases.contains_key(&case_key) {
            return Err(CollectionError::DuplicateCase(case_key));
        }
        self.cases
            .insert(case_key.clone(), CaseInput::new(case_key, lesions));
        Ok(self)
    }

    pub fn add_responses(
        &mut self,
        rater_key: RaterCaseKey,
        responses: Vec<Response>,
    ) -> Result<&mut Self, CollectionError> {
        let Some(case) = self.cases.get_mut(rater_key.case_key()) else {
            return Err(CollectionError::UnknownCase(rater_key));
        };
        if case.responses.contains_key(&rater_key) {
            return Err(CollectionError::DuplicateRaterCase(rater_key));
        }
        case.responses.insert(rater_key, responses);
        Ok(self)
    }

    pub fn contains_case(&self, case_key: &CaseKey) -> bool {
        self.cases.contains_key(case_key)
    }

    pub fn build(self) -> InMemoryCollection {
        InMemoryCollection::from_input(self.cases)
    }
}
