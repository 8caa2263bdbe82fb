use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::analysis::annotation::{AnnotationContainer, StudySet};
use crate::analysis::threshold::PepThreshold;
use crate::models::{AccessionNumber, GeneResult};

/// Significance thresholds of a run and the four study/population sets they induce.
///
/// Differential gene expression (DGE) sets hold genes, differential alternative splicing (DAS)
/// sets hold transcripts. Populations always contain every observed item.
#[derive(Debug, Clone)]
pub struct Thresholder {
    fdr: f64,
    expression_threshold: f64,
    splicing_threshold: f64,
    dge_study: StudySet,
    dge_population: StudySet,
    das_study: StudySet,
    das_population: StudySet,
}

impl Thresholder {
    /// Derives PEP thresholds for expression and splicing that keep the Bayesian FDR at `fdr`.
    pub fn from_hbadeals(
        results: &HashMap<AccessionNumber, GeneResult>,
        fdr: f64,
        gene_container: &dyn AnnotationContainer,
        transcript_container: &dyn AnnotationContainer,
    ) -> Self {
        let expression_peps: Vec<f64> = results.values().map(GeneResult::expression_pep).collect();
        let expression_threshold = PepThreshold::new(expression_peps, fdr).pep_threshold();
        info!("Expression PEP threshold {}", expression_threshold);

        let splicing_peps: Vec<f64> = results.values().flat_map(|g| g.splicing_peps()).collect();
        let splicing_threshold = PepThreshold::new(splicing_peps, fdr).pep_threshold();
        info!("Splicing PEP threshold {}", splicing_threshold);

        Self::with_thresholds(
            results,
            fdr,
            expression_threshold,
            splicing_threshold,
            gene_container,
            transcript_container,
        )
    }

    /// One externally chosen threshold for both expression and splicing (edgeR-style p-values).
    pub fn with_fixed_threshold(
        results: &HashMap<AccessionNumber, GeneResult>,
        threshold: f64,
        gene_container: &dyn AnnotationContainer,
        transcript_container: &dyn AnnotationContainer,
    ) -> Self {
        info!("Fixed significance threshold {}", threshold);
        Self::with_thresholds(results, threshold, threshold, threshold, gene_container, transcript_container)
    }

    /// Sets for already known thresholds, e.g. to reuse the thresholds of a run with other
    /// annotation containers.
    pub fn with_thresholds(
        results: &HashMap<AccessionNumber, GeneResult>,
        fdr: f64,
        expression_threshold: f64,
        splicing_threshold: f64,
        gene_container: &dyn AnnotationContainer,
        transcript_container: &dyn AnnotationContainer,
    ) -> Self {
        let dge_study_ids: HashSet<AccessionNumber> = results
            .values()
            .filter(|g| g.expression_pep() <= expression_threshold)
            .map(GeneResult::gene_id)
            .collect();
        let dge_population_ids: HashSet<AccessionNumber> = results.keys().copied().collect();
        info!(
            "DGE: {} study and {} population genes",
            dge_study_ids.len(),
            dge_population_ids.len()
        );

        let transcripts = || results.values().flat_map(|g| g.transcripts().values());
        let das_study_ids: HashSet<AccessionNumber> = transcripts()
            .filter(|t| t.pep() <= splicing_threshold)
            .map(|t| t.transcript_id())
            .collect();
        let das_population_ids: HashSet<AccessionNumber> = transcripts().map(|t| t.transcript_id()).collect();
        info!(
            "DAS: {} study and {} population isoforms",
            das_study_ids.len(),
            das_population_ids.len()
        );

        Self {
            fdr,
            expression_threshold,
            splicing_threshold,
            dge_study: gene_container.map_items_to_annotations("DGE Study", &dge_study_ids),
            dge_population: gene_container.map_items_to_annotations("DGE Population", &dge_population_ids),
            das_study: transcript_container.map_items_to_annotations("DAS Study", &das_study_ids),
            das_population: transcript_container.map_items_to_annotations("DAS Population", &das_population_ids),
        }
    }

    pub fn fdr(&self) -> f64 {
        self.fdr
    }

    pub fn expression_threshold(&self) -> f64 {
        self.expression_threshold
    }

    pub fn splicing_threshold(&self) -> f64 {
        self.splicing_threshold
    }

    pub fn dge_study(&self) -> &StudySet {
        &self.dge_study
    }

    pub fn dge_population(&self) -> &StudySet {
        &self.dge_population
    }

    pub fn das_study(&self) -> &StudySet {
        &self.das_study
    }

    pub fn das_population(&self) -> &StudySet {
        &self.das_population
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnnotationId, GeneModel};

    /// Every item is known; each is annotated with one term named after its parity.
    struct ParityContainer;

    impl AnnotationContainer for ParityContainer {
        fn map_items_to_annotations(&self, name: &str, items: &HashSet<AccessionNumber>) -> StudySet {
            let mut counts = HashMap::new();
            for item in items {
                let term = AnnotationId::interpro((item.number() % 2) as u32);
                *counts.entry(term).or_insert(0) += 1;
            }
            StudySet::new(name, counts, items.len(), 0)
        }

        fn annotating_term_count(&self) -> usize {
            2
        }

        fn annotated_item_count(&self) -> usize {
            0
        }

        fn description(&self, _id: &AnnotationId) -> Option<&str> {
            None
        }
    }

    fn gene(n: u64, expression_pep: f64, transcript_peps: &[f64]) -> GeneResult {
        let id = AccessionNumber::ensembl_gene(&format!("ENSG{n:011}")).unwrap();
        let model = GeneModel {
            symbol: format!("G{n}"),
            name: String::new(),
            entrez_id: None,
            ensembl_gene_id: id,
            refseq_accession: None,
        };
        let mut g = GeneResult::new(id, model).with_expression(1.0, expression_pep);
        for (i, pep) in transcript_peps.iter().enumerate() {
            let tx = AccessionNumber::ensembl_transcript(&format!("ENST{:011}", n * 10 + i as u64 + 1)).unwrap();
            g = g.with_transcript(tx, 1.0, *pep);
        }
        g
    }

    fn results() -> HashMap<AccessionNumber, GeneResult> {
        [
            gene(1, 0.0, &[0.0, 0.9]),
            gene(2, 0.001, &[0.5]),
            gene(3, 0.8, &[0.002, 0.7]),
            gene(4, 0.9, &[]),
        ]
        .into_iter()
        .map(|g| (g.gene_id(), g))
        .collect()
    }

    #[test]
    fn fixed_threshold_sets() {
        let results = results();
        let t = Thresholder::with_fixed_threshold(&results, 0.05, &ParityContainer, &ParityContainer);
        assert_eq!(t.expression_threshold(), 0.05);
        assert_eq!(t.dge_study().total(), 2);
        assert_eq!(t.dge_population().total(), 4);
        assert_eq!(t.das_study().total(), 2);
        assert_eq!(t.das_population().total(), 5);
    }

    #[test]
    fn population_is_superset_of_study() {
        let results = results();
        let t = Thresholder::from_hbadeals(&results, 0.01, &ParityContainer, &ParityContainer);
        for (study, population) in [(t.dge_study(), t.dge_population()), (t.das_study(), t.das_population())] {
            assert!(study.total() <= population.total());
            for (id, n) in study.counts() {
                assert!(*n <= population.count(id));
            }
        }
    }

    #[test]
    fn hbadeals_thresholds_come_from_the_selector() {
        let results = results();
        let t = Thresholder::from_hbadeals(&results, 0.01, &ParityContainer, &ParityContainer);
        // expression PEPs {0, 0.001, 0.8, 0.9}: every grid cutoff keeps the mean at 0.0005
        assert_eq!(t.expression_threshold(), 0.25);
        assert_eq!(t.dge_study().total(), 2);
    }
}
