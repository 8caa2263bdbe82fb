//! Direct GO annotations of transcripts: `transcript  go-id  [label]`.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use tracing::info;

use crate::data_handling::Dataset;
use crate::error::{IsopretError, Result};
use crate::helper_functions::{field, line_of, read_tsv, source_name};
use crate::models::{AccessionNumber, AnnotationId};

pub struct GoAnnotationDataset {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct GoAnnotations {
    pub by_transcript: HashMap<AccessionNumber, BTreeSet<AnnotationId>>,
    /// Term labels from the optional third column.
    pub labels: HashMap<AnnotationId, String>,
}

impl GoAnnotations {
    pub fn term_count(&self) -> usize {
        self.by_transcript.values().flatten().collect::<BTreeSet<_>>().len()
    }
}

impl Dataset for GoAnnotationDataset {
    type Output = GoAnnotations;

    fn load(&self) -> Result<Self::Output> {
        info!("Reading GO annotations from {}", self.path.display());
        let source = source_name(&self.path);
        let mut reader = read_tsv(&self.path)?;
        let mut out = GoAnnotations::default();
        for record in reader.records() {
            let record = record?;
            if record.len() < 2 {
                return Err(IsopretError::malformed(
                    &source,
                    line_of(&record),
                    format!("expected at least 2 fields, found {}", record.len()),
                ));
            }
            let transcript = AccessionNumber::ensembl_transcript(field(&record, 0, &self.path)?)
                .map_err(|e| IsopretError::malformed(&source, line_of(&record), e.to_string()))?;
            let raw = field(&record, 1, &self.path)?;
            let term = AnnotationId::parse_go(raw).ok_or_else(|| {
                IsopretError::malformed(&source, line_of(&record), format!("not a GO id: \"{raw}\""))
            })?;
            if let Some(label) = record.get(2).map(str::trim).filter(|l| !l.is_empty()) {
                out.labels.entry(term.clone()).or_insert_with(|| label.to_string());
            }
            out.by_transcript.entry(transcript).or_default().insert(term);
        }
        info!(
            "Loaded {} GO terms annotating {} transcripts",
            out.term_count(),
            out.by_transcript.len()
        );
        Ok(out)
    }
}
