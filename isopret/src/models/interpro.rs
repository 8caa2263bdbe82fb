//! Interpro reference entries, positional hits on protein isoforms, and the merge engine that
//! collapses redundant overlapping hits of the same entry into one canonical span.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{IsopretError, Result};
use crate::models::accession::AccessionNumber;
use crate::models::term::AnnotationId;

/// Minimal reciprocal overlap for two hits of the same entry to count as one domain.
pub const OVERLAP_THRESHOLD: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryType {
    ActiveSite,
    BindingSite,
    ConservedSite,
    Domain,
    Family,
    HomologousSuperfamily,
    Ptm,
    Repeat,
    /// A GO (or other ontology) term rather than an Interpro entry.
    OntologyTerm,
    Unknown,
}

impl EntryType {
    /// Case-insensitive mapping of the Interpro type column.
    pub fn from_interpro(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE_SITE" => EntryType::ActiveSite,
            "BINDING_SITE" => EntryType::BindingSite,
            "CONSERVED_SITE" => EntryType::ConservedSite,
            "DOMAIN" => EntryType::Domain,
            "FAMILY" => EntryType::Family,
            "HOMOLOGOUS_SUPERFAMILY" => EntryType::HomologousSuperfamily,
            "PTM" => EntryType::Ptm,
            "REPEAT" => EntryType::Repeat,
            _ => EntryType::Unknown,
        }
    }

    pub fn is_site(&self) -> bool {
        matches!(
            self,
            EntryType::ActiveSite | EntryType::BindingSite | EntryType::ConservedSite | EntryType::Ptm
        )
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryType::ActiveSite => "Active_site",
            EntryType::BindingSite => "Binding_site",
            EntryType::ConservedSite => "Conserved_site",
            EntryType::Domain => "Domain",
            EntryType::Family => "Family",
            EntryType::HomologousSuperfamily => "Homologous_superfamily",
            EntryType::Ptm => "PTM",
            EntryType::Repeat => "Repeat",
            EntryType::OntologyTerm => "Ontology_term",
            EntryType::Unknown => "Unknown",
        };
        write!(f, "{s}")
    }
}

/// Reference data describing one annotation (an Interpro entry or an ontology term).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationEntry {
    pub id: AnnotationId,
    pub entry_type: EntryType,
    pub description: String,
}

/// One annotation hit on a protein isoform, residues 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionalHit {
    pub transcript_id: AccessionNumber,
    pub gene_id: AccessionNumber,
    pub annotation_id: AnnotationId,
    pub start: u32,
    pub end: u32,
}

impl PositionalHit {
    pub fn len(&self) -> u32 {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    fn contains(&self, other: &PositionalHit) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

/// A positional hit joined with the entry it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergedHit {
    hit: PositionalHit,
    entry: Arc<AnnotationEntry>,
}

impl MergedHit {
    pub fn new(hit: PositionalHit, entry: Arc<AnnotationEntry>) -> Self {
        Self { hit, entry }
    }

    pub fn hit(&self) -> &PositionalHit {
        &self.hit
    }

    pub fn entry(&self) -> &AnnotationEntry {
        &self.entry
    }

    pub fn annotation_id(&self) -> &AnnotationId {
        &self.hit.annotation_id
    }

    pub fn start(&self) -> u32 {
        self.hit.start
    }

    pub fn end(&self) -> u32 {
        self.hit.end
    }

    pub fn len(&self) -> u32 {
        self.hit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hit.is_empty()
    }

    pub fn is_domain(&self) -> bool {
        self.entry.entry_type == EntryType::Domain
    }

    pub fn is_family(&self) -> bool {
        self.entry.entry_type == EntryType::Family
    }

    pub fn is_superfamily(&self) -> bool {
        self.entry.entry_type == EntryType::HomologousSuperfamily
    }

    pub fn is_family_or_superfamily(&self) -> bool {
        self.is_family() || self.is_superfamily()
    }

    pub fn is_repeat(&self) -> bool {
        self.entry.entry_type == EntryType::Repeat
    }

    pub fn is_site(&self) -> bool {
        self.entry.entry_type.is_site()
    }

    /// True if one hit lies completely inside the other, or if the overlap spans at least
    /// [`OVERLAP_THRESHOLD`] of the longer hit.
    pub fn overlaps_by(&self, other: &MergedHit) -> bool {
        if self.hit.contains(&other.hit) || other.hit.contains(&self.hit) {
            return true;
        }
        let max_len = self.len().max(other.len()) as f64;
        let start = self.start().max(other.start()) as i64;
        let end = self.end().min(other.end()) as i64;
        let overlap = (end - start) as f64 / max_len;
        overlap >= OVERLAP_THRESHOLD
    }

    /// Span covering both hits. Both must annotate the same entry.
    pub fn merge(&self, other: &MergedHit) -> Result<MergedHit> {
        if self.annotation_id() != other.annotation_id() {
            return Err(IsopretError::ContractViolation(format!(
                "cannot merge hits of different entries ({} and {})",
                self.annotation_id(),
                other.annotation_id()
            )));
        }
        Ok(self.span_union(other))
    }

    fn span_union(&self, other: &MergedHit) -> MergedHit {
        let hit = PositionalHit {
            start: self.start().min(other.start()),
            end: self.end().max(other.end()),
            ..self.hit.clone()
        };
        MergedHit::new(hit, Arc::clone(&self.entry))
    }
}

/// Collapse the hits of one transcript so that each biological domain is represented once.
///
/// Hits are grouped by entry, sorted by position, and consecutive overlapping hits are merged.
/// The output is ordered by entry id, then start.
pub fn merge_hits(hits: Vec<MergedHit>) -> Vec<MergedHit> {
    let mut by_entry: BTreeMap<AnnotationId, Vec<MergedHit>> = BTreeMap::new();
    for hit in hits {
        by_entry.entry(hit.annotation_id().clone()).or_default().push(hit);
    }

    let mut merged = Vec::new();
    for (_, mut group) in by_entry {
        group.sort_by_key(|h| (h.start(), h.end()));
        let mut iter = group.into_iter();
        let Some(mut current) = iter.next() else {
            continue;
        };
        for next in iter {
            if current.overlaps_by(&next) {
                // same entry by construction of the group
                current = current.span_union(&next);
            } else {
                merged.push(current);
                current = next;
            }
        }
        merged.push(current);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn entry(id: u32, entry_type: EntryType) -> Arc<AnnotationEntry> {
        Arc::new(AnnotationEntry {
            id: AnnotationId::interpro(id),
            entry_type,
            description: format!("entry {id}"),
        })
    }

    fn hit(e: &Arc<AnnotationEntry>, start: u32, end: u32) -> MergedHit {
        MergedHit::new(
            PositionalHit {
                transcript_id: AccessionNumber::ensembl_transcript("ENST00000000001").unwrap(),
                gene_id: AccessionNumber::ensembl_gene("ENSG00000000001").unwrap(),
                annotation_id: e.id.clone(),
                start,
                end,
            },
            Arc::clone(e),
        )
    }

    #[test]
    fn merge_with_included_keeps_outer_span() {
        let e = entry(276, EntryType::Family);
        let a = hit(&e, 40, 64);
        let b = hit(&e, 45, 60);
        assert!(a.overlaps_by(&b));
        let m = a.merge(&b).unwrap();
        assert_eq!((m.start(), m.end()), (40, 64));
        assert!(m.is_family());
    }

    #[test]
    fn merge_spans() {
        let e = entry(276, EntryType::Family);
        let a = hit(&e, 40, 64);
        let right = a.merge(&hit(&e, 42, 70)).unwrap();
        assert_eq!((right.start(), right.end()), (40, 70));
        let left = a.merge(&hit(&e, 27, 52)).unwrap();
        assert_eq!((left.start(), left.end()), (27, 64));
        let outer = a.merge(&hit(&e, 30, 80)).unwrap();
        assert_eq!((outer.start(), outer.end()), (30, 80));
    }

    #[test]
    fn overlap_threshold() {
        let e = entry(1, EntryType::Domain);
        // (64 - 42) / 29 = 0.758
        assert!(hit(&e, 40, 64).overlaps_by(&hit(&e, 42, 70)));
        // (52 - 40) / 26 = 0.46
        assert!(!hit(&e, 40, 64).overlaps_by(&hit(&e, 27, 52)));
        assert!(!hit(&e, 1, 10).overlaps_by(&hit(&e, 20, 30)));
    }

    #[test]
    fn merging_different_entries_is_a_contract_violation() {
        let a = hit(&entry(1, EntryType::Domain), 1, 10);
        let b = hit(&entry(2, EntryType::Domain), 1, 10);
        assert!(matches!(a.merge(&b), Err(IsopretError::ContractViolation(_))));
    }

    #[test]
    fn overlap_is_symmetric_and_merge_idempotent() {
        let e = entry(7, EntryType::Repeat);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..2000 {
            let s1 = rng.gen_range(1..200);
            let s2 = rng.gen_range(1..200);
            let a = hit(&e, s1, s1 + rng.gen_range(0..60));
            let b = hit(&e, s2, s2 + rng.gen_range(0..60));
            assert_eq!(a.overlaps_by(&b), b.overlaps_by(&a));
            let ab = a.merge(&b).unwrap();
            let again = a.merge(&ab).unwrap();
            assert_eq!((again.start(), again.end()), (ab.start(), ab.end()));
        }
    }

    #[test]
    fn merge_hits_collapses_redundant_calls_per_entry() {
        let dom = entry(1, EntryType::Domain);
        let site = entry(2, EntryType::BindingSite);
        let merged = merge_hits(vec![
            hit(&dom, 45, 60),
            hit(&dom, 100, 130),
            hit(&dom, 40, 64),
            hit(&site, 50, 52),
            hit(&dom, 42, 70),
        ]);
        let spans: Vec<_> = merged
            .iter()
            .map(|h| (h.annotation_id().to_string(), h.start(), h.end()))
            .collect();
        assert_eq!(
            spans,
            vec![
                ("IPR000001".to_string(), 40, 70),
                ("IPR000001".to_string(), 100, 130),
                ("IPR000002".to_string(), 50, 52),
            ]
        );
        assert!(merged[2].is_site());
    }
}
