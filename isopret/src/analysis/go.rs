//! Gene Ontology term-for-term enrichment over direct annotations.

use std::collections::HashMap;

use tracing::info;

use crate::analysis::annotation::{AnnotationContainer, GoAnnotationContainer};
use crate::analysis::mtc::MtcMethod;
use crate::analysis::overrep::EnrichmentResults;
use crate::analysis::thresholder::Thresholder;
use crate::data_handling::go::GoAnnotations;
use crate::data_handling::transcripts::TranscriptCatalogue;
use crate::error::Result;
use crate::models::{AccessionNumber, GeneResult};

/// GO enrichment for DGE genes and DAS isoforms at the thresholds already chosen for the run.
pub fn go_term_for_term(
    results: &HashMap<AccessionNumber, GeneResult>,
    thresholds: &Thresholder,
    go: &GoAnnotations,
    catalogue: &TranscriptCatalogue,
    mtc: MtcMethod,
) -> Result<EnrichmentResults> {
    let gene_container = GoAnnotationContainer::for_genes(go, catalogue);
    let transcript_container = GoAnnotationContainer::for_transcripts(go, catalogue);
    let (genes, transcripts) = (gene_container.stats(), transcript_container.stats());
    info!(
        "GO: {} terms annotate {} genes and {} terms annotate {} transcripts",
        genes.annotating_terms,
        genes.annotated_items,
        transcripts.annotating_terms,
        transcripts.annotated_items
    );

    let go_sets = Thresholder::with_thresholds(
        results,
        thresholds.fdr(),
        thresholds.expression_threshold(),
        thresholds.splicing_threshold(),
        &gene_container,
        &transcript_container,
    );
    EnrichmentResults::calculate(&go_sets, &gene_container, &transcript_container, mtc)
}
