use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::data_handling::interpro::InterproMapper;
use crate::data_handling::transcripts::TranscriptCatalogue;
use crate::error::IsopretError;
use crate::models::{AccessionNumber, AnnotationId, GeneResult, MergedHit, Transcript};

/// One gene with its transcripts, the domain hits of its expressed isoforms and its
/// significance calls.
#[derive(Debug, Clone)]
pub struct AnnotatedGene {
    transcripts: Vec<Transcript>,
    expressed: Vec<Transcript>,
    hits: HashMap<AccessionNumber, Vec<MergedHit>>,
    result: GeneResult,
    differentially_expressed: bool,
    differentially_spliced: bool,
    expression_threshold: f64,
    splicing_threshold: f64,
}

impl AnnotatedGene {
    pub fn new(
        transcripts: Vec<Transcript>,
        mut hits: HashMap<AccessionNumber, Vec<MergedHit>>,
        result: GeneResult,
        expression_threshold: f64,
        splicing_threshold: f64,
    ) -> Self {
        let expressed: Vec<Transcript> = transcripts
            .iter()
            .filter(|t| result.is_transcript_expressed(&t.accession))
            .cloned()
            .collect();
        let expressed_ids: HashSet<AccessionNumber> = expressed.iter().map(|t| t.accession).collect();
        hits.retain(|tx, _| expressed_ids.contains(tx));
        Self {
            differentially_expressed: result.has_differential_expression(expression_threshold),
            differentially_spliced: result.has_differential_splicing(splicing_threshold),
            transcripts,
            expressed,
            hits,
            result,
            expression_threshold,
            splicing_threshold,
        }
    }

    pub fn transcripts(&self) -> &[Transcript] {
        &self.transcripts
    }

    pub fn expressed_transcripts(&self) -> &[Transcript] {
        &self.expressed
    }

    pub fn result(&self) -> &GeneResult {
        &self.result
    }

    pub fn symbol(&self) -> &str {
        self.result.symbol()
    }

    pub fn expression_threshold(&self) -> f64 {
        self.expression_threshold
    }

    pub fn splicing_threshold(&self) -> f64 {
        self.splicing_threshold
    }

    pub fn passes_expression_threshold(&self) -> bool {
        self.differentially_expressed
    }

    pub fn passes_splicing_threshold(&self) -> bool {
        self.differentially_spliced
    }

    /// Merged hits of an expressed transcript.
    pub fn hits(&self, transcript: &AccessionNumber) -> &[MergedHit] {
        self.hits.get(transcript).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn hit_map(&self) -> &HashMap<AccessionNumber, Vec<MergedHit>> {
        &self.hits
    }

    pub fn has_annotations(&self) -> bool {
        self.hits.values().any(|h| !h.is_empty())
    }

    pub fn coding_transcript_count(&self) -> usize {
        self.expressed.iter().filter(|t| t.is_coding()).count()
    }

    pub fn noncoding_transcript_count(&self) -> usize {
        self.expressed.len() - self.coding_transcript_count()
    }

    fn log2_fold_changes(&self) -> impl Iterator<Item = (AccessionNumber, f64)> + '_ {
        self.expressed.iter().filter_map(|t| {
            self.result
                .transcripts()
                .get(&t.accession)
                .map(|r| (t.accession, r.log2_fold_change()))
        })
    }

    /// Expressed isoforms with log2 fold change >= 0.
    pub fn upregulated(&self) -> Vec<(AccessionNumber, f64)> {
        self.log2_fold_changes().filter(|(_, lfc)| *lfc >= 0.0).collect()
    }

    pub fn downregulated(&self) -> Vec<(AccessionNumber, f64)> {
        self.log2_fold_changes().filter(|(_, lfc)| *lfc < 0.0).collect()
    }

    /// Distinct annotation ids on each expressed transcript that has hits.
    pub fn annotation_ids_by_transcript(&self) -> HashMap<AccessionNumber, BTreeSet<AnnotationId>> {
        self.hits
            .iter()
            .map(|(tx, hits)| (*tx, hits.iter().map(|h| h.annotation_id().clone()).collect()))
            .collect()
    }

    fn passes_both(&self) -> bool {
        self.differentially_expressed && self.differentially_spliced
    }

    /// Genes passing both thresholds first, then by symbol.
    pub fn display_order(&self, other: &Self) -> Ordering {
        other
            .passes_both()
            .cmp(&self.passes_both())
            .then_with(|| self.symbol().cmp(other.symbol()))
    }
}

/// Annotated genes of a run, in order of significance.
#[derive(Debug, Clone, Default)]
pub struct AssembledGenes {
    pub genes: Vec<AnnotatedGene>,
    /// Genes with results but no transcripts in the catalogue.
    pub missing: usize,
}

/// Assembles one [`AnnotatedGene`] per gene result that the catalogue knows.
pub fn assemble_genes(
    results: &HashMap<AccessionNumber, GeneResult>,
    catalogue: &TranscriptCatalogue,
    mapper: &InterproMapper,
    expression_threshold: f64,
    splicing_threshold: f64,
) -> AssembledGenes {
    let mut ordered: Vec<&GeneResult> = results.values().collect();
    ordered.sort_by(|a, b| a.cmp_by_significance(b));

    let assembled: Vec<Option<AnnotatedGene>> = ordered
        .par_iter()
        .map(|result| {
            let transcripts = catalogue.transcripts_for_gene(&result.gene_id());
            if transcripts.is_empty() {
                return None;
            }
            Some(AnnotatedGene::new(
                transcripts.to_vec(),
                mapper.transcript_to_hit_map(&result.gene_id()),
                (*result).clone(),
                expression_threshold,
                splicing_threshold,
            ))
        })
        .collect();

    let missing = assembled.iter().filter(|g| g.is_none()).count();
    let genes: Vec<AnnotatedGene> = assembled.into_iter().flatten().collect();
    if missing > 0 {
        warn!(
            "{}",
            IsopretError::MissingReference(format!("{missing} genes have no transcripts in the catalogue"))
        );
    }
    info!("Assembled {} annotated genes", genes.len());
    AssembledGenes { genes, missing }
}
