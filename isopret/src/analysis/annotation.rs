//! Annotation containers map genes or transcripts to the terms annotating them (Interpro entries,
//! GO terms) and restrict that mapping to a study or population item set.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use crate::data_handling::go::GoAnnotations;
use crate::data_handling::interpro::InterproMapper;
use crate::data_handling::transcripts::TranscriptCatalogue;
use crate::error::IsopretError;
use crate::models::{AccessionNumber, AnnotationId};

/// Annotation counts of one item set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySet {
    name: String,
    counts: HashMap<AnnotationId, usize>,
    total: usize,
    dropped: usize,
}

impl StudySet {
    pub fn new(name: impl Into<String>, counts: HashMap<AnnotationId, usize>, total: usize, dropped: usize) -> Self {
        Self {
            name: name.into(),
            counts,
            total,
            dropped,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of items in the set that the container could resolve.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Items of the requested set the container does not know.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Items annotated by `id`, zero if none.
    pub fn count(&self, id: &AnnotationId) -> usize {
        self.counts.get(id).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &HashMap<AnnotationId, usize> {
        &self.counts
    }

    /// Annotation ids in ascending order.
    pub fn annotation_ids(&self) -> Vec<&AnnotationId> {
        let mut ids: Vec<_> = self.counts.keys().collect();
        ids.sort();
        ids
    }

    pub fn annotation_count(&self) -> usize {
        self.counts.len()
    }
}

/// Size of an annotation container's item-to-term mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContainerStats {
    pub annotating_terms: usize,
    pub annotated_items: usize,
}

pub trait AnnotationContainer: Send + Sync {
    /// Count annotations over `items`. Items the container cannot resolve are dropped and
    /// counted on the returned set.
    fn map_items_to_annotations(&self, name: &str, items: &HashSet<AccessionNumber>) -> StudySet;

    /// Distinct terms annotating at least one item.
    fn annotating_term_count(&self) -> usize;

    /// Items with at least one annotation.
    fn annotated_item_count(&self) -> usize;

    fn description(&self, id: &AnnotationId) -> Option<&str>;

    fn stats(&self) -> ContainerStats {
        ContainerStats {
            annotating_terms: self.annotating_term_count(),
            annotated_items: self.annotated_item_count(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared item -> term mapping
// ─────────────────────────────────────────────────────────────────────────────

/// Every known item with the terms annotating it; unannotated items map to an empty set.
#[derive(Debug, Clone, Default)]
struct Associations {
    items: HashMap<AccessionNumber, BTreeSet<AnnotationId>>,
}

impl Associations {
    fn for_transcripts(
        catalogue: &TranscriptCatalogue,
        annotations: &HashMap<AccessionNumber, BTreeSet<AnnotationId>>,
    ) -> Self {
        let mut items: HashMap<AccessionNumber, BTreeSet<AnnotationId>> = catalogue
            .transcripts()
            .map(|t| (t.accession, BTreeSet::new()))
            .collect();
        for (tx, terms) in annotations {
            items.entry(*tx).or_default().extend(terms.iter().cloned());
        }
        Self { items }
    }

    /// Gene annotations are the union over the gene's transcripts.
    fn for_genes(
        catalogue: &TranscriptCatalogue,
        annotations: &HashMap<AccessionNumber, BTreeSet<AnnotationId>>,
    ) -> Self {
        let mut items: HashMap<AccessionNumber, BTreeSet<AnnotationId>> =
            catalogue.genes().map(|g| (*g, BTreeSet::new())).collect();
        let mut orphans = 0usize;
        for (tx, terms) in annotations {
            match catalogue.gene_of(tx) {
                Some(gene) => items.entry(gene).or_default().extend(terms.iter().cloned()),
                None => orphans += 1,
            }
        }
        if orphans > 0 {
            debug!("{} annotated transcripts are not in the catalogue", orphans);
        }
        Self { items }
    }

    fn study_set(&self, name: &str, requested: &HashSet<AccessionNumber>) -> StudySet {
        let mut counts: HashMap<AnnotationId, usize> = HashMap::new();
        let mut total = 0usize;
        let mut dropped = 0usize;
        for item in requested {
            let Some(terms) = self.items.get(item) else {
                dropped += 1;
                continue;
            };
            total += 1;
            for term in terms {
                *counts.entry(term.clone()).or_insert(0) += 1;
            }
        }
        if dropped > 0 {
            warn!(
                "{}",
                IsopretError::MissingReference(format!("{name}: {dropped} of {} items could not be resolved", requested.len()))
            );
        }
        debug!("{}: {} items, {} annotating terms", name, total, counts.len());
        StudySet::new(name, counts, total, dropped)
    }

    fn term_count(&self) -> usize {
        self.items.values().flatten().collect::<HashSet<_>>().len()
    }

    fn annotated_item_count(&self) -> usize {
        self.items.values().filter(|terms| !terms.is_empty()).count()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Interpro
// ─────────────────────────────────────────────────────────────────────────────

pub struct InterproAnnotationContainer {
    associations: Associations,
    descriptions: HashMap<AnnotationId, String>,
}

impl InterproAnnotationContainer {
    fn descriptions(mapper: &InterproMapper) -> HashMap<AnnotationId, String> {
        mapper.entries().map(|e| (e.id.clone(), e.description.clone())).collect()
    }

    pub fn for_transcripts(mapper: &InterproMapper, catalogue: &TranscriptCatalogue) -> Self {
        Self {
            associations: Associations::for_transcripts(catalogue, &mapper.transcript_annotations()),
            descriptions: Self::descriptions(mapper),
        }
    }

    pub fn for_genes(mapper: &InterproMapper, catalogue: &TranscriptCatalogue) -> Self {
        Self {
            associations: Associations::for_genes(catalogue, &mapper.transcript_annotations()),
            descriptions: Self::descriptions(mapper),
        }
    }
}

impl AnnotationContainer for InterproAnnotationContainer {
    fn map_items_to_annotations(&self, name: &str, items: &HashSet<AccessionNumber>) -> StudySet {
        self.associations.study_set(name, items)
    }

    fn annotating_term_count(&self) -> usize {
        self.associations.term_count()
    }

    fn annotated_item_count(&self) -> usize {
        self.associations.annotated_item_count()
    }

    fn description(&self, id: &AnnotationId) -> Option<&str> {
        self.descriptions.get(id).map(String::as_str)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gene Ontology
// ─────────────────────────────────────────────────────────────────────────────

pub struct GoAnnotationContainer {
    associations: Associations,
    labels: HashMap<AnnotationId, String>,
}

impl GoAnnotationContainer {
    pub fn for_transcripts(go: &GoAnnotations, catalogue: &TranscriptCatalogue) -> Self {
        Self {
            associations: Associations::for_transcripts(catalogue, &go.by_transcript),
            labels: go.labels.clone(),
        }
    }

    pub fn for_genes(go: &GoAnnotations, catalogue: &TranscriptCatalogue) -> Self {
        Self {
            associations: Associations::for_genes(catalogue, &go.by_transcript),
            labels: go.labels.clone(),
        }
    }
}

impl AnnotationContainer for GoAnnotationContainer {
    fn map_items_to_annotations(&self, name: &str, items: &HashSet<AccessionNumber>) -> StudySet {
        self.associations.study_set(name, items)
    }

    fn annotating_term_count(&self) -> usize {
        self.associations.term_count()
    }

    fn annotated_item_count(&self) -> usize {
        self.associations.annotated_item_count()
    }

    fn description(&self, id: &AnnotationId) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnnotationEntry, EntryType, PositionalHit, Span, Transcript};

    fn tx(acc: &str) -> AccessionNumber {
        AccessionNumber::ensembl_transcript(acc).unwrap()
    }

    fn gene(acc: &str) -> AccessionNumber {
        AccessionNumber::ensembl_gene(acc).unwrap()
    }

    fn transcript(acc: &str, gene_acc: &str) -> Transcript {
        Transcript {
            accession: tx(acc),
            gene_id: gene(gene_acc),
            gene_symbol: "G".into(),
            coding: true,
            exons: vec![Span::new(1, 300)],
            cds: Some(Span::new(1, 300)),
        }
    }

    fn catalogue() -> TranscriptCatalogue {
        TranscriptCatalogue::new(vec![
            transcript("ENST00000000001", "ENSG00000000001"),
            transcript("ENST00000000002", "ENSG00000000001"),
            transcript("ENST00000000003", "ENSG00000000002"),
        ])
    }

    fn go() -> GoAnnotations {
        let binding = AnnotationId::parse_go("GO:0005515").unwrap();
        let rna = AnnotationId::parse_go("GO:0003723").unwrap();
        GoAnnotations {
            by_transcript: HashMap::from([
                (tx("ENST00000000001"), BTreeSet::from([binding.clone()])),
                (tx("ENST00000000002"), BTreeSet::from([binding.clone(), rna])),
            ]),
            labels: HashMap::from([(binding, "protein binding".to_string())]),
        }
    }

    #[test]
    fn transcript_container_counts_and_drops() {
        let container = GoAnnotationContainer::for_transcripts(&go(), &catalogue());
        let items = HashSet::from([tx("ENST00000000001"), tx("ENST00000000003"), tx("ENST00000000099")]);
        let set = container.map_items_to_annotations("study", &items);
        assert_eq!(set.total(), 2);
        assert_eq!(set.dropped(), 1);
        assert_eq!(set.count(&AnnotationId::parse_go("GO:0005515").unwrap()), 1);
        assert_eq!(set.count(&AnnotationId::parse_go("GO:0003723").unwrap()), 0);
        assert_eq!(container.annotating_term_count(), 2);
        assert_eq!(container.annotated_item_count(), 2);
        assert_eq!(
            container.description(&AnnotationId::parse_go("GO:0005515").unwrap()),
            Some("protein binding")
        );
    }

    #[test]
    fn gene_container_unions_transcript_terms() {
        let container = GoAnnotationContainer::for_genes(&go(), &catalogue());
        let items = HashSet::from([gene("ENSG00000000001"), gene("ENSG00000000002")]);
        let set = container.map_items_to_annotations("population", &items);
        assert_eq!(set.total(), 2);
        assert_eq!(set.count(&AnnotationId::parse_go("GO:0005515").unwrap()), 1);
        assert_eq!(set.count(&AnnotationId::parse_go("GO:0003723").unwrap()), 1);
        assert_eq!(container.annotated_item_count(), 1);
    }

    #[test]
    fn interpro_container_stats() {
        let kringle = AnnotationId::interpro(1);
        let entries = HashMap::from([(
            kringle.clone(),
            AnnotationEntry {
                id: kringle.clone(),
                entry_type: EntryType::Domain,
                description: "Kringle".into(),
            },
        )]);
        let hits = ["ENST00000000001", "ENST00000000003"]
            .iter()
            .zip(["ENSG00000000001", "ENSG00000000002"])
            .map(|(t, g)| PositionalHit {
                transcript_id: tx(t),
                gene_id: gene(g),
                annotation_id: kringle.clone(),
                start: 10,
                end: 60,
            })
            .collect();
        let mapper = InterproMapper::new(hits, entries);

        let transcripts = InterproAnnotationContainer::for_transcripts(&mapper, &catalogue());
        assert_eq!(
            transcripts.stats(),
            ContainerStats {
                annotating_terms: 1,
                annotated_items: 2
            }
        );
        let genes = InterproAnnotationContainer::for_genes(&mapper, &catalogue());
        assert_eq!(genes.stats().annotated_items, 2);
        assert_eq!(genes.description(&kringle), Some("Kringle"));
    }
}
