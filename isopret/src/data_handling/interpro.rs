//! Interpro domain hits per transcript and the Interpro entry descriptions.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::StringRecord;
use tracing::{debug, error, info, warn};

use crate::data_handling::Dataset;
use crate::error::{IsopretError, Result};
use crate::helper_functions::{field, line_of, read_tsv, source_name};
use crate::models::{
    merge_hits, AccessionNumber, AnnotationEntry, AnnotationId, EntryType, MergedHit, PositionalHit,
};

// ─────────────────────────────────────────────────────────────────────────────
// Domain hits: transcript  gene  interpro  start  end
// ─────────────────────────────────────────────────────────────────────────────

pub struct InterproHitsDataset {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct InterproHits {
    pub hits: Vec<PositionalHit>,
    /// Rows of transcripts without any Interpro hit (empty id column).
    pub skipped: usize,
}

fn parse_position(value: &str, record: &StringRecord, path: &Path) -> Result<u32> {
    value.parse::<u32>().map_err(|_| {
        IsopretError::malformed(source_name(path), line_of(record), format!("not a residue position: \"{value}\""))
    })
}

fn parse_hit(record: &StringRecord, path: &Path) -> Result<Option<PositionalHit>> {
    let malformed = |msg: String| IsopretError::malformed(source_name(path), line_of(record), msg);

    let interpro = record.get(2).map(str::trim).unwrap_or_default();
    if interpro.is_empty() {
        return Ok(None);
    }
    if record.len() < 5 {
        return Err(malformed(format!("expected 5 fields, found {}", record.len())));
    }
    let transcript_id =
        AccessionNumber::ensembl_transcript(field(record, 0, path)?).map_err(|e| malformed(e.to_string()))?;
    let gene_id = AccessionNumber::ensembl_gene(field(record, 1, path)?).map_err(|e| malformed(e.to_string()))?;
    let annotation_id = AnnotationId::parse_interpro(interpro)
        .ok_or_else(|| malformed(format!("not an Interpro accession: \"{interpro}\"")))?;
    let start = parse_position(field(record, 3, path)?, record, path)?;
    let end = parse_position(field(record, 4, path)?, record, path)?;
    if start == 0 || end < start {
        return Err(malformed(format!("invalid hit span {start}-{end}")));
    }
    Ok(Some(PositionalHit {
        transcript_id,
        gene_id,
        annotation_id,
        start,
        end,
    }))
}

impl Dataset for InterproHitsDataset {
    type Output = InterproHits;

    fn load(&self) -> Result<Self::Output> {
        info!("Reading Interpro domain hits from {}", self.path.display());
        let mut reader = read_tsv(&self.path)?;
        let mut out = InterproHits::default();
        for record in reader.records() {
            let record = record?;
            match parse_hit(&record, &self.path)? {
                Some(hit) => out.hits.push(hit),
                None => out.skipped += 1,
            }
        }
        info!(
            "Loaded {} Interpro hits ({} rows without an Interpro id)",
            out.hits.len(),
            out.skipped
        );
        Ok(out)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry descriptions: interpro  type  description
// ─────────────────────────────────────────────────────────────────────────────

pub struct InterproDescriptionDataset {
    pub path: PathBuf,
}

impl Dataset for InterproDescriptionDataset {
    type Output = HashMap<AnnotationId, AnnotationEntry>;

    fn load(&self) -> Result<Self::Output> {
        info!("Reading Interpro entry descriptions from {}", self.path.display());
        let source = source_name(&self.path);
        let mut reader = read_tsv(&self.path)?;
        let mut entries = HashMap::new();
        let mut unknown = 0usize;
        for record in reader.records() {
            let record = record?;
            if record.len() < 3 {
                return Err(IsopretError::malformed(
                    &source,
                    line_of(&record),
                    format!("expected 3 fields, found {}", record.len()),
                ));
            }
            let raw_id = field(&record, 0, &self.path)?;
            let id = AnnotationId::parse_interpro(raw_id).ok_or_else(|| {
                IsopretError::malformed(&source, line_of(&record), format!("not an Interpro accession: \"{raw_id}\""))
            })?;
            let raw_type = field(&record, 1, &self.path)?;
            let entry_type = EntryType::from_interpro(raw_type);
            if entry_type == EntryType::Unknown {
                warn!("Skipping {} with unrecognised entry type \"{}\"", id, raw_type);
                unknown += 1;
                continue;
            }
            let description = field(&record, 2, &self.path)?.to_string();
            entries.insert(
                id.clone(),
                AnnotationEntry {
                    id,
                    entry_type,
                    description,
                },
            );
        }
        info!("Loaded {} Interpro entries ({} of unknown type)", entries.len(), unknown);
        Ok(entries)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mapper
// ─────────────────────────────────────────────────────────────────────────────

/// Hits of every gene, joined with their entry descriptions.
#[derive(Debug, Clone, Default)]
pub struct InterproMapper {
    entries: HashMap<AnnotationId, Arc<AnnotationEntry>>,
    /// gene -> transcript -> hits
    hits: HashMap<AccessionNumber, HashMap<AccessionNumber, Vec<MergedHit>>>,
}

impl InterproMapper {
    pub fn new(hits: Vec<PositionalHit>, entries: HashMap<AnnotationId, AnnotationEntry>) -> Self {
        let entries: HashMap<AnnotationId, Arc<AnnotationEntry>> =
            entries.into_iter().map(|(k, v)| (k, Arc::new(v))).collect();

        let mut by_gene: HashMap<AccessionNumber, HashMap<AccessionNumber, Vec<MergedHit>>> = HashMap::new();
        let mut undescribed: BTreeSet<AnnotationId> = BTreeSet::new();
        for hit in hits {
            let Some(entry) = entries.get(&hit.annotation_id) else {
                undescribed.insert(hit.annotation_id.clone());
                continue;
            };
            by_gene
                .entry(hit.gene_id)
                .or_default()
                .entry(hit.transcript_id)
                .or_default()
                .push(MergedHit::new(hit, Arc::clone(entry)));
        }
        if !undescribed.is_empty() {
            error!(
                "{} Interpro accessions have hits but no description; their hits were skipped",
                undescribed.len()
            );
            debug!("Undescribed Interpro accessions: {:?}", undescribed);
        }
        Self { entries, hits: by_gene }
    }

    pub fn entry(&self, id: &AnnotationId) -> Option<&AnnotationEntry> {
        self.entries.get(id).map(Arc::as_ref)
    }

    pub fn entries(&self) -> impl Iterator<Item = &AnnotationEntry> {
        self.entries.values().map(Arc::as_ref)
    }

    /// Merged hits of each transcript of `gene`; empty if the gene has no hits.
    pub fn transcript_to_hit_map(&self, gene: &AccessionNumber) -> HashMap<AccessionNumber, Vec<MergedHit>> {
        self.hits
            .get(gene)
            .map(|transcripts| {
                transcripts
                    .iter()
                    .map(|(tx, hits)| (*tx, merge_hits(hits.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Distinct Interpro ids hitting each transcript.
    pub fn transcript_annotations(&self) -> HashMap<AccessionNumber, BTreeSet<AnnotationId>> {
        self.hits
            .values()
            .flat_map(|transcripts| transcripts.iter())
            .map(|(tx, hits)| (*tx, hits.iter().map(|h| h.annotation_id().clone()).collect()))
            .collect()
    }
}
