use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::analysis::mtc::MtcMethod;
use crate::analysis::threshold::DEFAULT_FDR;
use crate::error::{IsopretError, Result};

fn default_fdr() -> f64 {
    DEFAULT_FDR
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("isopret_results")
}

/// Settings of one analysis run, read from a JSON file:
///
/// ```json
/// {
///   "hbadeals": "data/hbadeals.tsv",
///   "hgnc": "data/hgnc_complete_set.txt",
///   "interpro_hits": "data/interpro_domains.tsv",
///   "interpro_descriptions": "data/interpro_entries.tsv",
///   "transcripts": "data/transcripts.tsv",
///   "go_annotations": "data/go.tsv",
///   "fdr": 0.05,
///   "mtc": "bonferroni",
///   "output_dir": "results"
/// }
/// ```
///
/// Relative paths are resolved against the directory of the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    hbadeals: PathBuf,
    hgnc: PathBuf,
    interpro_hits: PathBuf,
    interpro_descriptions: PathBuf,
    transcripts: PathBuf,
    #[serde(default)]
    go_annotations: Option<PathBuf>,
    #[serde(default = "default_fdr")]
    fdr: f64,
    /// Use this threshold for expression and splicing instead of deriving PEP thresholds.
    #[serde(default)]
    fixed_threshold: Option<f64>,
    #[serde(default)]
    mtc: MtcMethod,
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
    #[serde(default)]
    threads: Option<usize>,
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Reading configuration from {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| IsopretError::io(e, path))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json(&text, base)
    }

    /// Parse and validate; relative paths are taken relative to `base`.
    pub fn from_json(json: &str, base: &Path) -> Result<Self> {
        let mut config: AnalysisConfig = serde_json::from_str(json)?;
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.hbadeals);
        resolve(&mut self.hgnc);
        resolve(&mut self.interpro_hits);
        resolve(&mut self.interpro_descriptions);
        resolve(&mut self.transcripts);
        if let Some(go) = self.go_annotations.as_mut() {
            resolve(go);
        }
        resolve(&mut self.output_dir);
    }

    fn validate(&self) -> Result<()> {
        if !(self.fdr > 0.0 && self.fdr < 1.0) {
            return Err(IsopretError::Config(format!("fdr must be in (0, 1), got {}", self.fdr)));
        }
        if let Some(t) = self.fixed_threshold {
            if !(t > 0.0 && t <= 1.0) {
                return Err(IsopretError::Config(format!("fixed_threshold must be in (0, 1], got {t}")));
            }
        }
        if self.threads == Some(0) {
            return Err(IsopretError::Config("threads must be positive".into()));
        }
        let inputs = [
            ("hbadeals", Some(&self.hbadeals)),
            ("hgnc", Some(&self.hgnc)),
            ("interpro_hits", Some(&self.interpro_hits)),
            ("interpro_descriptions", Some(&self.interpro_descriptions)),
            ("transcripts", Some(&self.transcripts)),
            ("go_annotations", self.go_annotations.as_ref()),
        ];
        for (name, path) in inputs {
            if let Some(path) = path {
                if !path.is_file() {
                    return Err(IsopretError::Config(format!("{name}: no such file {}", path.display())));
                }
            }
        }
        Ok(())
    }

    pub fn hbadeals(&self) -> &Path {
        &self.hbadeals
    }

    pub fn hgnc(&self) -> &Path {
        &self.hgnc
    }

    pub fn interpro_hits(&self) -> &Path {
        &self.interpro_hits
    }

    pub fn interpro_descriptions(&self) -> &Path {
        &self.interpro_descriptions
    }

    pub fn transcripts(&self) -> &Path {
        &self.transcripts
    }

    pub fn go_annotations(&self) -> Option<&Path> {
        self.go_annotations.as_deref()
    }

    pub fn fdr(&self) -> f64 {
        self.fdr
    }

    pub fn fixed_threshold(&self) -> Option<f64> {
        self.fixed_threshold
    }

    pub fn mtc(&self) -> MtcMethod {
        self.mtc
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn threads(&self) -> Option<usize> {
        self.threads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn inputs() -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in ["h.tsv", "hgnc.tsv", "hits.tsv", "desc.tsv", "tx.tsv"] {
            fs::write(dir.path().join(name), "x\n").unwrap();
        }
        dir
    }

    const MINIMAL: &str = r#"{
        "hbadeals": "h.tsv",
        "hgnc": "hgnc.tsv",
        "interpro_hits": "hits.tsv",
        "interpro_descriptions": "desc.tsv",
        "transcripts": "tx.tsv"
    }"#;

    #[test]
    fn defaults_and_relative_paths() {
        let dir = inputs();
        let config = AnalysisConfig::from_json(MINIMAL, dir.path()).unwrap();
        assert_eq!(config.fdr(), DEFAULT_FDR);
        assert_eq!(config.mtc(), MtcMethod::Bonferroni);
        assert_eq!(config.hbadeals(), dir.path().join("h.tsv"));
        assert!(config.go_annotations().is_none());
        assert_eq!(config.output_dir(), dir.path().join("isopret_results"));
    }

    #[test]
    fn rejects_bad_fdr() {
        let dir = inputs();
        let json = MINIMAL.replace("\"transcripts\": \"tx.tsv\"", "\"transcripts\": \"tx.tsv\", \"fdr\": 1.5");
        let err = AnalysisConfig::from_json(&json, dir.path()).unwrap_err();
        assert!(matches!(err, IsopretError::Config(_)));
    }

    #[test]
    fn rejects_missing_file() {
        let dir = inputs();
        let json = MINIMAL.replace("h.tsv", "absent.tsv");
        let err = AnalysisConfig::from_json(&json, dir.path()).unwrap_err();
        assert!(matches!(err, IsopretError::Config(_)));
    }

    #[test]
    fn rejects_misspelled_correction() {
        let dir = inputs();
        let json = MINIMAL.replace("\"hgnc\"", "\"mtc\": \"benjamini-hochbreg\", \"hgnc\"");
        assert!(matches!(
            AnalysisConfig::from_json(&json, dir.path()),
            Err(IsopretError::Json(_))
        ));
        let json = MINIMAL.replace("\"hgnc\"", "\"mtc\": \"Benjamini_Hochberg\", \"hgnc\"");
        let config = AnalysisConfig::from_json(&json, dir.path()).unwrap();
        assert_eq!(config.mtc(), MtcMethod::BenjaminiHochberg);
    }

    #[test]
    fn rejects_unknown_keys() {
        let dir = inputs();
        let json = MINIMAL.replace("\"hgnc\"", "\"hgcn_typo\": 1, \"hgnc\"");
        assert!(matches!(
            AnalysisConfig::from_json(&json, dir.path()),
            Err(IsopretError::Json(_))
        ));
    }
}
