//! Transcript catalogue: one row per annotated transcript.
//!
//! ```text
//! transcript       gene             symbol  coding  exons                    cds
//! ENST00000368471  ENSG00000160710  ADAR    true    100-199,300-399,500-599  150-549
//! ENST00000368474  ENSG00000160710  ADAR    false   100-199,500-650          .
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use csv::StringRecord;
use tracing::info;

use crate::data_handling::Dataset;
use crate::error::{IsopretError, Result};
use crate::helper_functions::{field, line_of, read_tsv, source_name};
use crate::models::{AccessionNumber, Span, Transcript};

pub struct TranscriptCatalogueDataset {
    pub path: PathBuf,
}

/// All transcripts of a run, grouped by gene.
#[derive(Debug, Default)]
pub struct TranscriptCatalogue {
    by_gene: HashMap<AccessionNumber, Vec<Transcript>>,
    /// transcript -> gene, built on first lookup.
    gene_index: OnceLock<HashMap<AccessionNumber, AccessionNumber>>,
}

impl TranscriptCatalogue {
    pub fn new(transcripts: Vec<Transcript>) -> Self {
        let mut by_gene: HashMap<AccessionNumber, Vec<Transcript>> = HashMap::new();
        for tx in transcripts {
            by_gene.entry(tx.gene_id).or_default().push(tx);
        }
        for txs in by_gene.values_mut() {
            txs.sort_by_key(|t| t.accession);
        }
        Self {
            by_gene,
            gene_index: OnceLock::new(),
        }
    }

    pub fn transcripts_for_gene(&self, gene: &AccessionNumber) -> &[Transcript] {
        self.by_gene.get(gene).map(Vec::as_slice).unwrap_or_default()
    }

    fn gene_index(&self) -> &HashMap<AccessionNumber, AccessionNumber> {
        self.gene_index.get_or_init(|| {
            self.by_gene
                .iter()
                .flat_map(|(gene, txs)| txs.iter().map(move |t| (t.accession, *gene)))
                .collect()
        })
    }

    pub fn gene_of(&self, transcript: &AccessionNumber) -> Option<AccessionNumber> {
        self.gene_index().get(transcript).copied()
    }

    pub fn contains_transcript(&self, transcript: &AccessionNumber) -> bool {
        self.gene_index().contains_key(transcript)
    }

    pub fn genes(&self) -> impl Iterator<Item = &AccessionNumber> {
        self.by_gene.keys()
    }

    pub fn transcripts(&self) -> impl Iterator<Item = &Transcript> {
        self.by_gene.values().flatten()
    }

    pub fn gene_count(&self) -> usize {
        self.by_gene.len()
    }

    pub fn transcript_count(&self) -> usize {
        self.by_gene.values().map(Vec::len).sum()
    }
}

fn parse_span(value: &str, record: &StringRecord, path: &Path) -> Result<Span> {
    let malformed =
        || IsopretError::malformed(source_name(path), line_of(record), format!("invalid span \"{value}\""));
    let (start, end) = value.split_once('-').ok_or_else(malformed)?;
    let start: u64 = start.trim().parse().map_err(|_| malformed())?;
    let end: u64 = end.trim().parse().map_err(|_| malformed())?;
    if start == 0 || end < start {
        return Err(malformed());
    }
    Ok(Span::new(start, end))
}

fn parse_coding(value: &str, record: &StringRecord, path: &Path) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "coding" => Ok(true),
        "false" | "0" | "no" | "noncoding" => Ok(false),
        _ => Err(IsopretError::malformed(
            source_name(path),
            line_of(record),
            format!("invalid coding flag \"{value}\""),
        )),
    }
}

fn parse_transcript(record: &StringRecord, path: &Path) -> Result<Transcript> {
    if record.len() != 6 {
        return Err(IsopretError::malformed(
            source_name(path),
            line_of(record),
            format!("expected 6 fields, found {}", record.len()),
        ));
    }
    let malformed = |e: crate::models::AccessionParseError| {
        IsopretError::malformed(source_name(path), line_of(record), e.to_string())
    };
    let accession = AccessionNumber::ensembl_transcript(field(record, 0, path)?).map_err(malformed)?;
    let gene_id = AccessionNumber::ensembl_gene(field(record, 1, path)?).map_err(malformed)?;
    let gene_symbol = field(record, 2, path)?.to_string();
    let coding = parse_coding(field(record, 3, path)?, record, path)?;
    let mut exons = field(record, 4, path)?
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_span(s, record, path))
        .collect::<Result<Vec<_>>>()?;
    exons.sort();
    let cds = match field(record, 5, path)? {
        "." | "" => None,
        s => Some(parse_span(s, record, path)?),
    };
    Ok(Transcript {
        accession,
        gene_id,
        gene_symbol,
        coding,
        exons,
        cds,
    })
}

impl Dataset for TranscriptCatalogueDataset {
    type Output = TranscriptCatalogue;

    fn load(&self) -> Result<Self::Output> {
        info!("Reading transcript catalogue from {}", self.path.display());
        let mut reader = read_tsv(&self.path)?;
        let transcripts = reader
            .records()
            .map(|record| parse_transcript(&record?, &self.path))
            .collect::<Result<Vec<_>>>()?;
        let catalogue = TranscriptCatalogue::new(transcripts);
        info!(
            "Loaded {} transcripts of {} genes",
            catalogue.transcript_count(),
            catalogue.gene_count()
        );
        Ok(catalogue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_catalogue() {
        let f = write(
            "transcript\tgene\tsymbol\tcoding\texons\tcds\n\
             ENST00000368471\tENSG00000160710\tADAR\ttrue\t500-599,100-199,300-399\t150-549\n\
             ENST00000368474\tENSG00000160710\tADAR\tfalse\t100-199,500-650\t.\n",
        );
        let catalogue = TranscriptCatalogueDataset { path: f.path().to_path_buf() }.load().unwrap();
        let gene = AccessionNumber::ensembl_gene("ENSG00000160710").unwrap();
        let txs = catalogue.transcripts_for_gene(&gene);
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].exons[0], Span::new(100, 199));
        assert_eq!(txs[0].protein_length(), 65);
        assert!(!txs[1].is_coding());

        let tx = AccessionNumber::ensembl_transcript("ENST00000368474").unwrap();
        assert_eq!(catalogue.gene_of(&tx), Some(gene));
        assert!(catalogue
            .transcripts_for_gene(&AccessionNumber::ensembl_gene("ENSG00000000001").unwrap())
            .is_empty());
    }

    #[test]
    fn bad_span_is_malformed() {
        let f = write(
            "transcript\tgene\tsymbol\tcoding\texons\tcds\n\
             ENST00000368471\tENSG00000160710\tADAR\ttrue\t100_199\t.\n",
        );
        let err = TranscriptCatalogueDataset { path: f.path().to_path_buf() }.load().unwrap_err();
        assert!(matches!(err, IsopretError::MalformedInput { line: 2, .. }));
    }
}
