//! Reads a reader study laid out on disk.
//!
//! ```text
//! <root>/reference/<patient>/<date>_<MODALITY>/SE<n>/*.json
//! <root>/raters/<rater>/<patient>/<date>_<MODALITY>/SE<n>/*.json
//! ```
//!
//! How signals are extracted from a case directory is delegated to a
//! [`SignalSource`]; the bundled [`JsonSignalSource`] reads lists of
//! `{x, y, z, r, name, confidence?}` records.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::collection::InMemoryCollection;
use crate::config::LayoutConfig;
use crate::errors::LoaderError;
use crate::keys::CaseKey;
use crate::signals::{Lesion, Response, SignalRecord};

/// Extracts located findings from one case directory.
pub trait SignalSource {
    fn read_responses(&self, case_dir: &Path) -> Result<Vec<Response>, LoaderError>;

    /// Ground truth is annotated the same way as responses.
    fn read_lesions(&self, case_dir: &Path) -> Result<Vec<Lesion>, LoaderError> {
        Ok(self
            .read_responses(case_dir)?
            .iter()
            .map(Response::to_lesion)
            .collect())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSignalSource;

impl JsonSignalSource {
    pub const EXTENSION: &'static str = "json";

    /// Signal files of a case directory, sorted by file name.
    pub fn list_signal_files(case_dir: &Path) -> Result<Vec<PathBuf>, LoaderError> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(case_dir).map_err(|e| LoaderError::io(case_dir, e))? {
            let path = entry.map_err(|e| LoaderError::io(case_dir, e))?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(Self::EXTENSION)
            {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn read_file(path: &Path) -> Result<Vec<Response>, LoaderError> {
        let raw = std::fs::read_to_string(path).map_err(|e| LoaderError::io(path, e))?;
        let records: Vec<SignalRecord> =
            serde_json::from_str(&raw).map_err(|source| LoaderError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        records
            .into_iter()
            .enumerate()
            .map(|(index, rec)| {
                Response::try_from(rec).map_err(|source| LoaderError::InvalidSignal {
                    path: path.to_path_buf(),
                    index,
                    source,
                })
            })
            .collect()
    }
}

impl SignalSource for JsonSignalSource {
    fn read_responses(&self, case_dir: &Path) -> Result<Vec<Response>, LoaderError> {
        let mut responses = Vec::new();
        for file in Self::list_signal_files(case_dir)? {
            responses.extend(Self::read_file(&file)?);
        }
        Ok(responses)
    }
}

/// Directory of one case under `base`.
pub fn case_dir(base: &Path, key: &CaseKey) -> PathBuf {
    base.join(key.patient_id())
        .join(format!("{}_{}", key.study_date(), key.modality()))
        .join(format!("SE{}", key.series_number()))
}

/// All case directories below `root`, keyed by the case they hold.
///
/// Symlinked directories are not followed. Two directories holding the
/// same case are an error.
pub fn list_case_dirs(root: &Path) -> Result<BTreeMap<CaseKey, PathBuf>, LoaderError> {
    let mut found = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).map_err(|e| LoaderError::io(&dir, e))? {
            let entry = entry.map_err(|e| LoaderError::io(&dir, e))?;
            let path = entry.path();
            if !entry.file_type().map_err(|e| LoaderError::io(&path, e))?.is_dir() {
                continue;
            }
            let relative = path.strip_prefix(root).unwrap_or(&path);
            match CaseKey::find_in_path(relative) {
                Some(key) => match found.entry(key) {
                    Entry::Vacant(slot) => {
                        slot.insert(path);
                    }
                    Entry::Occupied(slot) => {
                        let (first, second) = if *slot.get() <= path {
                            (slot.get().clone(), path)
                        } else {
                            (path, slot.get().clone())
                        };
                        return Err(LoaderError::DuplicateCaseDir {
                            key: slot.key().clone(),
                            first,
                            second,
                        });
                    }
                },
                None => pending.push(path),
            }
        }
    }
    Ok(found)
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, LoaderError> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| LoaderError::io(dir, e))? {
        let path = entry.map_err(|e| LoaderError::io(dir, e))?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

pub struct DirectoryLoader<S = JsonSignalSource> {
    root: PathBuf,
    layout: LayoutConfig,
    source: S,
}

impl DirectoryLoader<JsonSignalSource> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_source(root, JsonSignalSource)
    }
}

impl<S: SignalSource> DirectoryLoader<S> {
    pub fn with_source(root: impl Into<PathBuf>, source: S) -> Self {
        Self {
            root: root.into(),
            layout: LayoutConfig::default(),
            source,
        }
    }

    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn reference_dir(&self) -> PathBuf {
        self.root.join(&self.layout.reference_dir)
    }

    pub fn raters_dir(&self) -> PathBuf {
        self.root.join(&self.layout.raters_dir)
    }

    /// Reads reference lesions, then every rater's responses.
    ///
    /// Responses for a case absent from the reference tree abort the load.
    pub fn load(&self) -> Result<InMemoryCollection, LoaderError> {
        let reference_dir = self.reference_dir();
        if !reference_dir.is_dir() {
            return Err(LoaderError::MissingDirectory(reference_dir));
        }

        let mut builder = InMemoryCollection::builder();
        let reference_cases = list_case_dirs(&reference_dir)?;
        tracing::info!(cases = reference_cases.len(), "reading reference");
        for (key, dir) in reference_cases {
            let lesions = self.source.read_lesions(&dir)?;
            builder.add_reference(key, lesions)?;
        }

        let raters_dir = self.raters_dir();
        if !raters_dir.is_dir() {
            tracing::warn!(
                path = %raters_dir.display(),
                "no raters directory, nothing to evaluate"
            );
            return Ok(builder.build());
        }

        for rater_dir in sorted_subdirs(&raters_dir)? {
            let rater_name = rater_dir
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            let cases = list_case_dirs(&rater_dir)?;
            tracing::info!(rater = %rater_name, cases = cases.len(), "reading rater");

            for (key, dir) in cases {
                let rater_key =
                    key.to_rater_key(rater_name.as_str())
                        .map_err(|source| LoaderError::InvalidRater {
                            name: rater_name.clone(),
                            source,
                        })?;
                let responses = self.source.read_responses(&dir)?;
                builder.add_responses(rater_key, responses)?;
            }
        }

        Ok(builder.build())
    }
}

/// Creates empty reference and rater directory trees for `case_keys`.
///
/// Raters are named `rater01`, `rater02`, ... Returns the rater names.
pub fn prepare_layout(
    root: &Path,
    case_keys: &[CaseKey],
    n_raters: usize,
    layout: &LayoutConfig,
) -> Result<Vec<String>, LoaderError> {
    if n_raters == 0 {
        return Err(LoaderError::NoRaters);
    }

    let reference_dir = root.join(&layout.reference_dir);
    let raters: Vec<String> = (1..=n_raters).map(|i| format!("rater{i:02}")).collect();

    let mut bases = vec![reference_dir];
    bases.extend(raters.iter().map(|r| root.join(&layout.raters_dir).join(r)));

    for base in &bases {
        for key in case_keys {
            let dir = case_dir(base, key);
            std::fs::create_dir_all(&dir).map_err(|e| LoaderError::io(&dir, e))?;
        }
    }

    tracing::info!(
        series = case_keys.len(),
        raters = n_raters,
        "prepared study layout"
    );
    Ok(raters)
}
