//! Isoform-level interpretation of HBA-DEALS results: Bayesian FDR thresholds on posterior error
//! probabilities, annotated genes with merged Interpro domain hits, and Interpro/GO
//! overrepresentation among differentially expressed genes and differentially spliced isoforms.

pub mod analysis;
pub mod config;
pub mod data_handling;
pub mod error;
pub mod helper_functions;
pub mod models;
pub mod report;

use tracing::info;

use crate::analysis::annotated_gene::{assemble_genes, AssembledGenes};
use crate::analysis::annotation::{AnnotationContainer, ContainerStats, InterproAnnotationContainer};
use crate::analysis::go::go_term_for_term;
use crate::analysis::overrep::EnrichmentResults;
use crate::analysis::thresholder::Thresholder;
use crate::config::AnalysisConfig;
use crate::data_handling::go::GoAnnotationDataset;
use crate::data_handling::hbadeals::HbaDealsDataset;
use crate::data_handling::hgnc::HgncDataset;
use crate::data_handling::interpro::{InterproDescriptionDataset, InterproHitsDataset, InterproMapper};
use crate::data_handling::transcripts::TranscriptCatalogueDataset;
use crate::data_handling::Dataset;
use crate::error::{IsopretError, Result};

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct AnalysisResults {
    pub thresholds: Thresholder,
    pub interpro: EnrichmentResults,
    pub go: Option<EnrichmentResults>,
    pub genes: AssembledGenes,
    pub interpro_gene_stats: ContainerStats,
    pub interpro_transcript_stats: ContainerStats,
    /// HBA-DEALS genes without an HGNC model.
    pub unresolved_genes: usize,
}

/// Runs the analysis, on a dedicated thread pool if the config asks for a thread count.
pub fn run(config: &AnalysisConfig) -> Result<AnalysisResults> {
    match config.threads() {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| IsopretError::Config(format!("cannot start {n} worker threads: {e}")))?;
            pool.install(|| run_analysis(config))
        }
        None => run_analysis(config),
    }
}

fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisResults> {
    // ── 1) reference data ──
    let gene_models = HgncDataset {
        path: config.hgnc().to_path_buf(),
    }
    .load()?;
    let catalogue = TranscriptCatalogueDataset {
        path: config.transcripts().to_path_buf(),
    }
    .load()?;
    let hits = InterproHitsDataset {
        path: config.interpro_hits().to_path_buf(),
    }
    .load()?;
    let entries = InterproDescriptionDataset {
        path: config.interpro_descriptions().to_path_buf(),
    }
    .load()?;
    let mapper = InterproMapper::new(hits.hits, entries);

    // ── 2) HBA-DEALS results ──
    let hbadeals = HbaDealsDataset {
        path: config.hbadeals().to_path_buf(),
        gene_models: &gene_models,
    }
    .load()?;

    // ── 3) thresholds and study/population sets ──
    let gene_container = InterproAnnotationContainer::for_genes(&mapper, &catalogue);
    let transcript_container = InterproAnnotationContainer::for_transcripts(&mapper, &catalogue);
    let interpro_gene_stats = gene_container.stats();
    let interpro_transcript_stats = transcript_container.stats();
    info!(
        "Interpro: {} entries annotate {} genes and {} entries annotate {} transcripts",
        interpro_gene_stats.annotating_terms,
        interpro_gene_stats.annotated_items,
        interpro_transcript_stats.annotating_terms,
        interpro_transcript_stats.annotated_items
    );
    let thresholds = match config.fixed_threshold() {
        Some(t) => Thresholder::with_fixed_threshold(&hbadeals.genes, t, &gene_container, &transcript_container),
        None => Thresholder::from_hbadeals(&hbadeals.genes, config.fdr(), &gene_container, &transcript_container),
    };

    // ── 4) enrichment ──
    let interpro = EnrichmentResults::calculate(&thresholds, &gene_container, &transcript_container, config.mtc())?;
    let go = config
        .go_annotations()
        .map(|path| -> Result<EnrichmentResults> {
            let go = GoAnnotationDataset {
                path: path.to_path_buf(),
            }
            .load()?;
            go_term_for_term(&hbadeals.genes, &thresholds, &go, &catalogue, config.mtc())
        })
        .transpose()?;

    // ── 5) annotated genes ──
    let genes = assemble_genes(
        &hbadeals.genes,
        &catalogue,
        &mapper,
        thresholds.expression_threshold(),
        thresholds.splicing_threshold(),
    );

    info!(
        "Analysis done: {} genes, {} DGE genes, {} DAS isoforms",
        hbadeals.genes.len(),
        thresholds.dge_study().total(),
        thresholds.das_study().total()
    );
    Ok(AnalysisResults {
        thresholds,
        interpro,
        go,
        genes,
        interpro_gene_stats,
        interpro_transcript_stats,
        unresolved_genes: hbadeals.dropped,
    })
}
