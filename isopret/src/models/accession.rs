use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

static ENSEMBL_ACCESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ENS([GT])(\d+)(?:\.\d+)?$").expect("valid accession regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Database {
    Ensembl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Gene,
    Transcript,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed accession \"{accession}\": {reason}")]
pub struct AccessionParseError {
    pub accession: String,
    pub reason: &'static str,
}

/// Namespaced accession of a gene or transcript, e.g. `ENSG00000139618`.
///
/// Only the numeric part is stored; version suffixes such as `.2` are dropped when parsing, so
/// `ENST00000369985.3` and `ENST00000369985` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessionNumber {
    category: Category,
    database: Database,
    accession: u64,
}

impl AccessionNumber {
    pub fn ensembl_gene(ensg: &str) -> Result<Self, AccessionParseError> {
        let acc: AccessionNumber = ensg.parse()?;
        if !acc.is_gene() {
            return Err(AccessionParseError {
                accession: ensg.to_string(),
                reason: "Ensembl gene id must start with ENSG",
            });
        }
        Ok(acc)
    }

    pub fn ensembl_transcript(enst: &str) -> Result<Self, AccessionParseError> {
        let acc: AccessionNumber = enst.parse()?;
        if !acc.is_transcript() {
            return Err(AccessionParseError {
                accession: enst.to_string(),
                reason: "Ensembl transcript id must start with ENST",
            });
        }
        Ok(acc)
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn database(&self) -> Database {
        self.database
    }

    /// Integer part of the accession (139618 for `ENSG00000139618`).
    pub fn number(&self) -> u64 {
        self.accession
    }

    pub fn is_gene(&self) -> bool {
        self.category == Category::Gene
    }

    pub fn is_transcript(&self) -> bool {
        self.category == Category::Transcript
    }
}

impl FromStr for AccessionNumber {
    type Err = AccessionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = ENSEMBL_ACCESSION.captures(s.trim()).ok_or_else(|| AccessionParseError {
            accession: s.to_string(),
            reason: "expected ENSG or ENST followed by digits",
        })?;
        let category = match &caps[1] {
            "G" => Category::Gene,
            _ => Category::Transcript,
        };
        let accession: u64 = caps[2].parse().map_err(|_| AccessionParseError {
            accession: s.to_string(),
            reason: "numeric part does not fit",
        })?;
        if accession == 0 {
            return Err(AccessionParseError {
                accession: s.to_string(),
                reason: "numeric part must be positive",
            });
        }
        Ok(Self {
            category,
            database: Database::Ensembl,
            accession,
        })
    }
}

impl fmt::Display for AccessionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.category {
            Category::Gene => "ENSG",
            Category::Transcript => "ENST",
        };
        write!(f, "{prefix}{:011}", self.accession)
    }
}
