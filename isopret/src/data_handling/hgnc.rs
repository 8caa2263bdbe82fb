use std::collections::HashMap;
use std::path::PathBuf;

use csv::StringRecord;
use tracing::{debug, info};

use crate::data_handling::Dataset;
use crate::error::{IsopretError, Result};
use crate::helper_functions::{line_of, read_tsv, source_name};
use crate::models::{AccessionNumber, GeneModel};

const REQUIRED_COLUMNS: [&str; 5] = ["symbol", "name", "entrez_id", "ensembl_gene_id", "refseq_accession"];

/// HGNC complete set, keyed by Ensembl gene accession.
pub struct HgncDataset {
    pub path: PathBuf,
}

struct Columns {
    symbol: usize,
    name: usize,
    entrez_id: usize,
    ensembl_gene_id: usize,
    refseq_accession: usize,
}

impl Columns {
    fn from_header(header: &StringRecord, source: &str) -> Result<Self> {
        let find = |name: &str| {
            header.iter().position(|h| h.trim() == name).ok_or_else(|| {
                IsopretError::malformed(
                    source,
                    1,
                    format!("missing column \"{name}\" (need {})", REQUIRED_COLUMNS.join(", ")),
                )
            })
        };
        Ok(Self {
            symbol: find("symbol")?,
            name: find("name")?,
            entrez_id: find("entrez_id")?,
            ensembl_gene_id: find("ensembl_gene_id")?,
            refseq_accession: find("refseq_accession")?,
        })
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

impl Dataset for HgncDataset {
    type Output = HashMap<AccessionNumber, GeneModel>;

    fn load(&self) -> Result<Self::Output> {
        info!("Reading HGNC gene models from {}", self.path.display());
        let source = source_name(&self.path);
        let mut reader = read_tsv(&self.path)?;
        let cols = Columns::from_header(reader.headers()?, &source)?;

        let mut models = HashMap::new();
        let mut without_ensembl = 0usize;
        for record in reader.records() {
            let record = record?;
            let Some(ensembl) = non_empty(record.get(cols.ensembl_gene_id)) else {
                without_ensembl += 1;
                continue;
            };
            let ensembl_gene_id = AccessionNumber::ensembl_gene(&ensembl)
                .map_err(|e| IsopretError::malformed(&source, line_of(&record), e.to_string()))?;
            let symbol = non_empty(record.get(cols.symbol)).ok_or_else(|| {
                IsopretError::malformed(&source, line_of(&record), "empty gene symbol")
            })?;
            let model = GeneModel {
                symbol,
                name: non_empty(record.get(cols.name)).unwrap_or_default(),
                entrez_id: non_empty(record.get(cols.entrez_id)),
                ensembl_gene_id,
                refseq_accession: non_empty(record.get(cols.refseq_accession)),
            };
            models.entry(ensembl_gene_id).or_insert(model);
        }

        debug!("{} HGNC rows without an Ensembl gene id skipped", without_ensembl);
        info!("Loaded {} HGNC gene models", models.len());
        Ok(models)
    }
}
