//! HBA-DEALS output, one row per gene expression result or isoform splicing result:
//!
//! ```text
//! Gene             Isoform          ExplogFC/FC  P
//! ENSG00000160710  Expression       0.3013       0.10708
//! ENSG00000160710  ENST00000368471  1.0181       0.73892
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::{error, info, warn};

use crate::data_handling::Dataset;
use crate::error::{IsopretError, Result};
use crate::helper_functions::{field, line_of, parse_f64, read_tsv, source_name};
use crate::models::{AccessionNumber, GeneModel, GeneResult};

pub const HEADER: [&str; 4] = ["Gene", "Isoform", "ExplogFC/FC", "P"];

pub struct HbaDealsDataset<'a> {
    pub path: PathBuf,
    pub gene_models: &'a HashMap<AccessionNumber, GeneModel>,
}

/// Parsed results of genes that resolved to an HGNC model.
#[derive(Debug, Clone)]
pub struct HbaDealsResults {
    pub genes: HashMap<AccessionNumber, GeneResult>,
    /// Gene accessions in the file without a gene model.
    pub dropped: usize,
}

enum Row {
    Expression { fold_change: f64, pep: f64 },
    Isoform { transcript: AccessionNumber, fold_change: f64, pep: f64 },
}

fn check_header(header: &StringRecord, path: &Path) -> Result<()> {
    let found: Vec<&str> = header.iter().map(str::trim).collect();
    if found != HEADER {
        return Err(IsopretError::malformed(
            source_name(path),
            1,
            format!("expected header \"{}\", found \"{}\"", HEADER.join("\t"), found.join("\t")),
        ));
    }
    Ok(())
}

/// A posterior error probability in `[0, 1]`.
fn parse_pep(value: &str, record: &StringRecord, path: &Path) -> Result<f64> {
    let pep = parse_f64(value, record, path)?;
    if !(0.0..=1.0).contains(&pep) {
        return Err(IsopretError::malformed(
            source_name(path),
            line_of(record),
            format!("PEP must be in [0, 1], found \"{value}\""),
        ));
    }
    Ok(pep)
}

fn parse_row(record: &StringRecord, path: &Path) -> Result<(AccessionNumber, Row)> {
    if record.len() != HEADER.len() {
        return Err(IsopretError::malformed(
            source_name(path),
            line_of(record),
            format!("expected {} fields, found {}", HEADER.len(), record.len()),
        ));
    }
    let malformed = |e: crate::models::AccessionParseError| {
        IsopretError::malformed(source_name(path), line_of(record), e.to_string())
    };
    let gene = AccessionNumber::ensembl_gene(field(record, 0, path)?).map_err(malformed)?;
    let isoform = field(record, 1, path)?;
    let fold_change = parse_f64(field(record, 2, path)?, record, path)?;
    let pep = parse_pep(field(record, 3, path)?, record, path)?;

    let row = if isoform.eq_ignore_ascii_case("Expression") {
        Row::Expression { fold_change, pep }
    } else {
        let transcript = AccessionNumber::ensembl_transcript(isoform).map_err(malformed)?;
        Row::Isoform {
            transcript,
            fold_change,
            pep,
        }
    };
    Ok((gene, row))
}

impl Dataset for HbaDealsDataset<'_> {
    type Output = HbaDealsResults;

    fn load(&self) -> Result<Self::Output> {
        info!("Reading HBA-DEALS results from {}", self.path.display());
        let mut reader = read_tsv(&self.path)?;
        check_header(reader.headers()?, &self.path)?;

        // Rows of a gene stay in file order so that the first transcript row wins.
        let mut rows: BTreeMap<AccessionNumber, Vec<Row>> = BTreeMap::new();
        for record in reader.records() {
            let record = record?;
            let (gene, row) = parse_row(&record, &self.path)?;
            rows.entry(gene).or_default().push(row);
        }

        let mut genes = HashMap::new();
        let mut dropped = 0usize;
        for (gene_id, gene_rows) in rows {
            let Some(model) = self.gene_models.get(&gene_id) else {
                dropped += 1;
                continue;
            };
            let mut result = GeneResult::new(gene_id, model.clone());
            for row in gene_rows {
                match row {
                    Row::Expression { fold_change, pep } => result.set_expression(fold_change, pep),
                    Row::Isoform {
                        transcript,
                        fold_change,
                        pep,
                    } => result.add_transcript(transcript, fold_change, pep),
                }
            }
            genes.insert(gene_id, result);
        }

        if dropped > 0 {
            warn!(
                "{}",
                IsopretError::MissingReference(format!(
                    "{dropped} HBA-DEALS genes have no HGNC gene model and were skipped"
                ))
            );
        }
        if dropped > genes.len() {
            error!(
                "More genes dropped ({}) than resolved ({}); do the HGNC and HBA-DEALS files use the same Ensembl release?",
                dropped,
                genes.len()
            );
        }
        info!("Loaded HBA-DEALS results for {} genes", genes.len());
        Ok(HbaDealsResults { genes, dropped })
    }
}
