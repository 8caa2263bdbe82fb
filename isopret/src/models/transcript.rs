use crate::models::accession::AccessionNumber;

/// 1-based, inclusive genomic interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

impl Span {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn intersection_len(&self, other: &Span) -> u64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if end < start {
            0
        } else {
            end + 1 - start
        }
    }
}

/// Reference transcript structure from the transcript catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub accession: AccessionNumber,
    pub gene_id: AccessionNumber,
    pub gene_symbol: String,
    pub coding: bool,
    pub exons: Vec<Span>,
    pub cds: Option<Span>,
}

impl Transcript {
    pub fn is_coding(&self) -> bool {
        self.coding
    }

    /// Sum of exon lengths.
    pub fn transcript_length(&self) -> u64 {
        self.exons.iter().map(Span::len).sum()
    }

    /// Exonic bases inside the CDS, stop codon included.
    pub fn cds_length(&self) -> u64 {
        match (self.coding, self.cds) {
            (true, Some(cds)) => self.exons.iter().map(|e| e.intersection_len(&cds)).sum(),
            _ => 0,
        }
    }

    /// Number of amino acids encoded, not counting the stop codon.
    pub fn protein_length(&self) -> u64 {
        (self.cds_length() / 3).saturating_sub(1)
    }
}
