use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::accession::AccessionNumber;

/// Gene metadata from HGNC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneModel {
    pub symbol: String,
    pub name: String,
    pub entrez_id: Option<String>,
    pub ensembl_gene_id: AccessionNumber,
    pub refseq_accession: Option<String>,
}

/// Differential splicing result of one expressed isoform.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptResult {
    transcript_id: AccessionNumber,
    fold_change: f64,
    pep: f64,
}

impl TranscriptResult {
    pub fn new(transcript_id: AccessionNumber, fold_change: f64, pep: f64) -> Self {
        Self {
            transcript_id,
            fold_change,
            pep,
        }
    }

    pub fn transcript_id(&self) -> AccessionNumber {
        self.transcript_id
    }

    pub fn fold_change(&self) -> f64 {
        self.fold_change
    }

    /// log2 of the fold change; a fold change of exactly zero is reported as zero.
    pub fn log2_fold_change(&self) -> f64 {
        if self.fold_change == 0.0 {
            return 0.0;
        }
        self.fold_change.log2()
    }

    pub fn pep(&self) -> f64 {
        self.pep
    }

    /// Strict: a PEP equal to the threshold is not significant.
    pub fn is_significant(&self, threshold: f64) -> bool {
        self.pep < threshold
    }
}

/// Expression result of a gene plus the splicing results of all of its expressed isoforms.
///
/// Only expressed transcripts appear in the quantification output, so the transcript map doubles as
/// the set of expressed isoforms.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneResult {
    gene_id: AccessionNumber,
    gene_model: GeneModel,
    expression_fold_change: f64,
    expression_pep: f64,
    transcripts: HashMap<AccessionNumber, TranscriptResult>,
}

impl GeneResult {
    /// A gene without an expression row yet; expression PEP defaults to 1 (not significant).
    pub fn new(gene_id: AccessionNumber, gene_model: GeneModel) -> Self {
        Self {
            gene_id,
            gene_model,
            expression_fold_change: 1.0,
            expression_pep: 1.0,
            transcripts: HashMap::new(),
        }
    }

    pub(crate) fn set_expression(&mut self, fold_change: f64, pep: f64) {
        self.expression_fold_change = fold_change;
        self.expression_pep = pep;
    }

    /// First result for a transcript wins; later duplicates are ignored.
    pub(crate) fn add_transcript(&mut self, transcript_id: AccessionNumber, fold_change: f64, pep: f64) {
        self.transcripts
            .entry(transcript_id)
            .or_insert_with(|| TranscriptResult::new(transcript_id, fold_change, pep));
    }

    pub fn with_expression(mut self, fold_change: f64, pep: f64) -> Self {
        self.set_expression(fold_change, pep);
        self
    }

    pub fn with_transcript(mut self, transcript_id: AccessionNumber, fold_change: f64, pep: f64) -> Self {
        self.add_transcript(transcript_id, fold_change, pep);
        self
    }

    pub fn gene_id(&self) -> AccessionNumber {
        self.gene_id
    }

    pub fn gene_model(&self) -> &GeneModel {
        &self.gene_model
    }

    pub fn symbol(&self) -> &str {
        &self.gene_model.symbol
    }

    pub fn expression_fold_change(&self) -> f64 {
        self.expression_fold_change
    }

    pub fn expression_pep(&self) -> f64 {
        self.expression_pep
    }

    pub fn transcripts(&self) -> &HashMap<AccessionNumber, TranscriptResult> {
        &self.transcripts
    }

    pub fn splicing_peps(&self) -> impl Iterator<Item = f64> + '_ {
        self.transcripts.values().map(TranscriptResult::pep)
    }

    pub fn is_transcript_expressed(&self, transcript_id: &AccessionNumber) -> bool {
        self.transcripts.contains_key(transcript_id)
    }

    pub fn expressed_transcript_count(&self) -> usize {
        self.transcripts.len()
    }

    pub fn significant_transcript_count(&self, pep_threshold: f64) -> usize {
        self.splicing_peps().filter(|&p| p <= pep_threshold).count()
    }

    /// Smallest splicing PEP of the gene, 1.0 if no isoform was observed.
    pub fn smallest_splicing_pep(&self) -> f64 {
        self.splicing_peps().fold(1.0, f64::min)
    }

    pub fn has_differential_expression(&self, threshold: f64) -> bool {
        self.expression_pep < threshold
    }

    pub fn has_differential_splicing(&self, threshold: f64) -> bool {
        self.splicing_peps().any(|p| p <= threshold)
    }

    fn min_pep(&self) -> f64 {
        self.expression_pep.min(self.smallest_splicing_pep())
    }

    /// Orders by the most significant PEP of either kind, smallest first.
    pub fn cmp_by_significance(&self, other: &Self) -> Ordering {
        self.min_pep()
            .total_cmp(&other.min_pep())
            .then_with(|| self.gene_id.cmp(&other.gene_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gene(acc: &str, symbol: &str) -> GeneResult {
        let id = AccessionNumber::ensembl_gene(acc).unwrap();
        GeneResult::new(
            id,
            GeneModel {
                symbol: symbol.to_string(),
                name: format!("{symbol} gene"),
                entrez_id: None,
                ensembl_gene_id: id,
                refseq_accession: None,
            },
        )
    }

    fn tx(acc: &str) -> AccessionNumber {
        AccessionNumber::ensembl_transcript(acc).unwrap()
    }

    #[test]
    fn transcript_result_accessors() {
        let result = TranscriptResult::new(tx("ENST00000635775"), 2.7, 0.001);
        assert_eq!(result.transcript_id(), tx("ENST00000635775"));
        assert!((result.pep() - 0.001).abs() < 1e-12);
        assert!((result.log2_fold_change() - 2.7f64.log2()).abs() < 1e-12);
        assert!(result.is_significant(0.01));
        assert!(!result.is_significant(0.001));
    }

    #[test]
    fn zero_fold_change_has_zero_log2() {
        let result = TranscriptResult::new(tx("ENST00000000001"), 0.0, 0.5);
        assert_eq!(result.log2_fold_change(), 0.0);
    }

    #[test]
    fn smallest_splicing_pep_defaults_to_one() {
        let g = gene("ENSG00000160710", "ADAR").with_expression(1.5, 0.0);
        assert_eq!(g.smallest_splicing_pep(), 1.0);
        assert!(!g.has_differential_splicing(0.05));
    }

    #[test]
    fn first_transcript_row_wins() {
        let g = gene("ENSG00000160710", "ADAR")
            .with_transcript(tx("ENST00000368471"), 0.56, 1e-5)
            .with_transcript(tx("ENST00000368471"), 9.0, 0.9);
        assert_eq!(g.expressed_transcript_count(), 1);
        assert!((g.smallest_splicing_pep() - 1e-5).abs() < 1e-12);
    }

    #[test]
    fn expression_is_strict_and_splicing_is_inclusive() {
        let g = gene("ENSG00000160710", "ADAR")
            .with_expression(1.5, 0.05)
            .with_transcript(tx("ENST00000368471"), 0.56, 0.05);
        assert!(!g.has_differential_expression(0.05));
        assert!(g.has_differential_splicing(0.05));
        assert_eq!(g.significant_transcript_count(0.05), 1);
    }

    #[test]
    fn orders_by_most_significant_pep() {
        let a = gene("ENSG00000000001", "A").with_expression(1.0, 0.3);
        let b = gene("ENSG00000000002", "B")
            .with_expression(1.0, 0.9)
            .with_transcript(tx("ENST00000000003"), 1.0, 0.01);
        assert_eq!(b.cmp_by_significance(&a), Ordering::Less);
    }
}
