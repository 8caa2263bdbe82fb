use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static INTERPRO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^IPR(\d{1,9})$").expect("valid interpro regex"));
static GO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^GO:\d{7}$").expect("valid go regex"));

/// Identifier of an annotating term: an Interpro entry (`IPR000276`) or a GO term (`GO:0005515`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationId(String);

impl AnnotationId {
    pub fn interpro(number: u32) -> Self {
        Self(format!("IPR{number:06}"))
    }

    /// Canonicalizes `IPR276` and `IPR000276` to the same id.
    pub fn parse_interpro(s: &str) -> Option<Self> {
        let caps = INTERPRO_ID.captures(s.trim())?;
        caps[1].parse::<u32>().ok().map(Self::interpro)
    }

    pub fn parse_go(s: &str) -> Option<Self> {
        let s = s.trim();
        GO_ID.is_match(s).then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
