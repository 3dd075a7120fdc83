//! Syllable annotation reading
//!
//! Each recording `<name>.wav` is paired with an annotation source holding
//! syllable onsets, offsets (ms) and labels: `<name>.wav.not.mat` (MAT
//! level 5) or `<name>.wav.not.json`. The social context is encoded in
//! the file name, not in the annotation content.

pub(crate) mod mat;


pub use mat::{MatArray, MatData, MatFile};

use crate::error::{PsdError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Suffix appended to a recording's file name to find its MAT annotation
pub const MAT_SUFFIX: &str = ".not.mat";
/// Suffix appended to a recording's file name to find its JSON annotation
pub const JSON_SUFFIX: &str = ".not.json";

/// Social context of a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Context {
    Undirected,
    Directed,
    Unknown,
}

impl Context {
    /// Single-letter tag used in file names and caches
    pub fn tag(&self) -> Option<char> {
        match self {
            Context::Undirected => Some('U'),
            Context::Directed => Some('D'),
            Context::Unknown => None,
        }
    }

    pub fn from_tag(tag: Option<char>) -> Self {
        match tag.map(|c| c.to_ascii_uppercase()) {
            Some('U') => Context::Undirected,
            Some('D') => Context::Directed,
            _ => Context::Unknown,
        }
    }

    /// Infer the context from a file name.
    ///
    /// The token after the last underscore of the part before the first
    /// dot carries the context: a single letter (`U`/`D`, any case) or one
    /// of the words `undir`, `undirected`, `dir`, `directed`. Anything else
    /// is `Unknown`.
    pub fn from_filename(file_name: &str) -> Self {
        let stem = file_name.split('.').next().unwrap_or_default();
        let token = stem.rsplit('_').next().unwrap_or_default();

        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Context::from_tag(Some(c)),
            _ => match token.to_ascii_lowercase().as_str() {
                "undir" | "undirected" => Context::Undirected,
                "dir" | "directed" => Context::Directed,
                _ => Context::Unknown,
            },
        }
    }
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.tag() {
            Some(tag) => write!(f, "{}", tag),
            None => write!(f, "None"),
        }
    }
}

/// Unit of the numeric annotation outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    #[default]
    Milliseconds,
    Seconds,
}

impl TimeUnit {
    fn scale(&self, values: &[f64]) -> Vec<f64> {
        match self {
            TimeUnit::Milliseconds => values.to_vec(),
            TimeUnit::Seconds => values.iter().map(|v| v / 1e3).collect(),
        }
    }
}

/// Annotated syllables of one recording, timestamps in ms
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    onsets: Vec<f64>,
    offsets: Vec<f64>,
    syllables: Vec<char>,
    context: Context,
}

impl AnnotationRecord {
    /// Build a record, checking the parallel arrays agree
    pub fn new(
        onsets: Vec<f64>,
        offsets: Vec<f64>,
        syllables: Vec<char>,
        context: Context,
    ) -> Result<Self> {
        if onsets.len() != offsets.len() || onsets.len() != syllables.len() {
            return Err(PsdError::DataFormat(format!(
                "annotation arrays disagree: {} onsets, {} offsets, {} syllables",
                onsets.len(),
                offsets.len(),
                syllables.len()
            )));
        }

        for (i, (&on, &off)) in onsets.iter().zip(offsets.iter()).enumerate() {
            if !on.is_finite() || !off.is_finite() {
                return Err(PsdError::DataFormat(format!(
                    "non-finite timestamp at syllable {}",
                    i
                )));
            }
            if off < on {
                return Err(PsdError::DataFormat(format!(
                    "syllable {} ends before it starts ({} < {})",
                    i, off, on
                )));
            }
        }

        Ok(Self {
            onsets,
            offsets,
            syllables,
            context,
        })
    }

    pub fn onsets(&self) -> &[f64] {
        &self.onsets
    }

    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    pub fn syllables(&self) -> &[char] {
        &self.syllables
    }

    pub fn context(&self) -> Context {
        self.context
    }

    pub fn len(&self) -> usize {
        self.onsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.onsets.is_empty()
    }

    /// Gaps between consecutive syllables: `onsets[i+1] - offsets[i]`
    pub fn intervals(&self) -> Vec<f64> {
        self.onsets
            .iter()
            .skip(1)
            .zip(self.offsets.iter())
            .map(|(next_on, off)| next_on - off)
            .collect()
    }

    /// Syllable durations: `offsets[i] - onsets[i]`
    pub fn durations(&self) -> Vec<f64> {
        self.offsets
            .iter()
            .zip(self.onsets.iter())
            .map(|(off, on)| off - on)
            .collect()
    }

    /// One instance per annotated syllable
    pub fn instances(&self, source_file: &str) -> Vec<SyllableInstance> {
        self.onsets
            .iter()
            .zip(self.offsets.iter())
            .zip(self.syllables.iter())
            .map(|((&onset, &offset), &label)| SyllableInstance {
                source_file: source_file.to_string(),
                onset,
                offset,
                label,
                context: self.context,
            })
            .collect()
    }
}

/// A single annotated syllable of a recording
#[derive(Debug, Clone, PartialEq)]
pub struct SyllableInstance {
    pub source_file: String,
    /// Onset in ms
    pub onset: f64,
    /// Offset in ms
    pub offset: f64,
    pub label: char,
    pub context: Context,
}

/// Result of reading one annotation source
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Record in milliseconds regardless of the requested unit
    pub record: AnnotationRecord,
    pub onsets: Vec<f64>,
    pub offsets: Vec<f64>,
    pub intervals: Vec<f64>,
    pub durations: Vec<f64>,
}

impl Annotation {
    fn from_record(record: AnnotationRecord, unit: TimeUnit) -> Self {
        Self {
            onsets: unit.scale(record.onsets()),
            offsets: unit.scale(record.offsets()),
            intervals: unit.scale(&record.intervals()),
            durations: unit.scale(&record.durations()),
            record,
        }
    }

    pub fn syllables(&self) -> &[char] {
        self.record.syllables()
    }

    pub fn context(&self) -> Context {
        self.record.context()
    }
}

#[derive(Debug, Deserialize)]
struct JsonAnnotation {
    onsets: Vec<f64>,
    offsets: Vec<f64>,
    syllables: String,
}

/// Read an annotation source (`.not.mat` or `.not.json`)
pub fn read_annotation(path: &Path, unit: TimeUnit) -> Result<Annotation> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            PsdError::DataFormat(format!("invalid annotation path: {}", path.display()))
        })?;
    let context = Context::from_filename(file_name);

    let record = if file_name.ends_with(JSON_SUFFIX) {
        read_json_record(path, context)?
    } else {
        read_mat_record(path, context)?
    };

    Ok(Annotation::from_record(record, unit))
}

fn read_mat_record(path: &Path, context: Context) -> Result<AnnotationRecord> {
    let mat = MatFile::open(path)?;

    let numeric = |name: &str| -> Result<Vec<f64>> {
        mat.get(name)
            .and_then(MatArray::as_numeric)
            .map(<[f64]>::to_vec)
            .ok_or_else(|| {
                PsdError::DataFormat(format!(
                    "{}: missing numeric array '{}'",
                    path.display(),
                    name
                ))
            })
    };

    let onsets = numeric("onsets")?;
    let offsets = numeric("offsets")?;

    // Older annotation tools store labels under `labels`
    let syllables = mat
        .get("syllables")
        .or_else(|| mat.get("labels"))
        .and_then(MatArray::as_char)
        .ok_or_else(|| {
            PsdError::DataFormat(format!(
                "{}: missing char array 'syllables'",
                path.display()
            ))
        })?;

    AnnotationRecord::new(onsets, offsets, syllables.chars().collect(), context)
}

fn read_json_record(path: &Path, context: Context) -> Result<AnnotationRecord> {
    let content = std::fs::read_to_string(path)?;
    let raw: JsonAnnotation = serde_json::from_str(&content)
        .map_err(|e| PsdError::DataFormat(format!("{}: {}", path.display(), e)))?;

    AnnotationRecord::new(raw.onsets, raw.offsets, raw.syllables.chars().collect(), context)
}

/// Locate the annotation paired with a recording, preferring MAT over JSON
pub fn annotation_path_for(audio_path: &Path) -> Option<PathBuf> {
    let file_name = audio_path.file_name()?.to_str()?;

    [MAT_SUFFIX, JSON_SUFFIX]
        .iter()
        .map(|suffix| audio_path.with_file_name(format!("{}{}", file_name, suffix)))
        .find(|candidate| candidate.is_file())
}
