//! Term-for-term overrepresentation of annotations in a study set against its population,
//! using the upper tail of the hypergeometric distribution.

use std::cmp::Ordering;

use rayon::prelude::*;
use statrs::distribution::{DiscreteCDF, Hypergeometric};
use tracing::{debug, info};

use crate::analysis::annotation::{AnnotationContainer, StudySet};
use crate::analysis::mtc::MtcMethod;
use crate::analysis::thresholder::Thresholder;
use crate::error::{IsopretError, Result};
use crate::models::AnnotationId;

#[derive(Debug, Clone, PartialEq)]
pub struct OverrepResult {
    pub annotation_id: AnnotationId,
    pub description: String,
    pub study_annotated: usize,
    pub study_total: usize,
    pub population_annotated: usize,
    pub population_total: usize,
    pub raw_pvalue: f64,
    pub adjusted_pvalue: f64,
}

fn percentage(numerator: usize, denominator: usize) -> String {
    if denominator == 0 {
        return "0%".to_string();
    }
    format!("{:.2}%", 100.0 * numerator as f64 / denominator as f64)
}

/// `%.3f` above 0.01, `%.4f` above 0.001, `0` for zero, scientific otherwise.
pub fn format_pvalue(p: f64) -> String {
    if p > 0.01 {
        format!("{p:.3}")
    } else if p > 0.001 {
        format!("{p:.4}")
    } else if p == 0.0 {
        "0".to_string()
    } else {
        format!("{p:.2e}")
    }
}

impl OverrepResult {
    /// e.g. `5/10 (50.00%)`
    pub fn study_counts(&self) -> String {
        format!(
            "{}/{} ({})",
            self.study_annotated,
            self.study_total,
            percentage(self.study_annotated, self.study_total)
        )
    }

    pub fn population_counts(&self) -> String {
        format!(
            "{}/{} ({})",
            self.population_annotated,
            self.population_total,
            percentage(self.population_annotated, self.population_total)
        )
    }

    pub fn raw_p(&self) -> String {
        format_pvalue(self.raw_pvalue)
    }

    pub fn adjusted_p(&self) -> String {
        format_pvalue(self.adjusted_pvalue)
    }

    /// Ascending raw p-value, ties by annotation id.
    pub fn cmp_by_pvalue(&self, other: &Self) -> Ordering {
        self.raw_pvalue
            .total_cmp(&other.raw_pvalue)
            .then_with(|| self.annotation_id.cmp(&other.annotation_id))
    }
}

/// `P(X >= k)` for `X ~ Hypergeometric(population, successes, draws)`; 1 for `k == 0`.
pub fn upper_tail(population: usize, successes: usize, draws: usize, k: usize) -> Result<f64> {
    if k == 0 {
        return Ok(1.0);
    }
    let hyper = Hypergeometric::new(population as u64, successes as u64, draws as u64).map_err(|e| {
        IsopretError::ContractViolation(format!(
            "invalid hypergeometric parameters N={population} K={successes} n={draws}: {e}"
        ))
    })?;
    // sf(x) is P(X > x)
    Ok(hyper.sf((k - 1) as u64))
}

fn check_sets(study: &StudySet, population: &StudySet) -> Result<()> {
    if study.total() > population.total() {
        return Err(IsopretError::ContractViolation(format!(
            "{} has {} items, more than {} in {}",
            study.name(),
            study.total(),
            population.total(),
            population.name()
        )));
    }
    for (id, &n) in study.counts() {
        if !population.counts().contains_key(id) {
            return Err(IsopretError::ContractViolation(format!(
                "{id} annotates {} but not {}",
                study.name(),
                population.name()
            )));
        }
        if n > population.count(id) {
            return Err(IsopretError::ContractViolation(format!(
                "{id} annotates {n} items of {} but only {} of {}",
                study.name(),
                population.count(id),
                population.name()
            )));
        }
    }
    Ok(())
}

/// One result per annotation of the population, sorted by raw p-value. Nothing is filtered.
///
/// The number of tests for the correction is the number of population annotations.
pub fn overrepresentation(
    study: &StudySet,
    population: &StudySet,
    container: &dyn AnnotationContainer,
    mtc: MtcMethod,
) -> Result<Vec<OverrepResult>> {
    check_sets(study, population)?;

    let ids = population.annotation_ids();
    let raw: Vec<f64> = ids
        .par_iter()
        .map(|id| {
            upper_tail(
                population.total(),
                population.count(id),
                study.total(),
                study.count(id),
            )
        })
        .collect::<Result<Vec<_>>>()?;
    let adjusted = mtc.adjust(&raw);

    let mut results: Vec<OverrepResult> = ids
        .into_iter()
        .zip(raw.into_iter().zip(adjusted))
        .map(|(id, (raw_pvalue, adjusted_pvalue))| OverrepResult {
            description: container.description(id).unwrap_or(id.as_str()).to_string(),
            annotation_id: id.clone(),
            study_annotated: study.count(id),
            study_total: study.total(),
            population_annotated: population.count(id),
            population_total: population.total(),
            raw_pvalue,
            adjusted_pvalue,
        })
        .collect();
    results.sort_by(OverrepResult::cmp_by_pvalue);

    let significant = results.iter().filter(|r| r.adjusted_pvalue < 0.05).count();
    info!(
        "{} vs {}: {} annotations tested ({}), {} with corrected p < 0.05",
        study.name(),
        population.name(),
        results.len(),
        mtc,
        significant
    );
    if let Some(best) = results.first() {
        debug!("Top annotation {} p={}", best.annotation_id, best.raw_p());
    }
    Ok(results)
}

/// Overrepresentation among differentially expressed genes and differentially spliced isoforms.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentResults {
    pub dge: Vec<OverrepResult>,
    pub das: Vec<OverrepResult>,
}

impl EnrichmentResults {
    /// `gene_container` and `transcript_container` must be the containers `thresholder` was built with.
    pub fn calculate(
        thresholder: &Thresholder,
        gene_container: &dyn AnnotationContainer,
        transcript_container: &dyn AnnotationContainer,
        mtc: MtcMethod,
    ) -> Result<Self> {
        Ok(Self {
            dge: overrepresentation(thresholder.dge_study(), thresholder.dge_population(), gene_container, mtc)?,
            das: overrepresentation(
                thresholder.das_study(),
                thresholder.das_population(),
                transcript_container,
                mtc,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    use crate::models::AccessionNumber;

    struct Descriptions;

    impl AnnotationContainer for Descriptions {
        fn map_items_to_annotations(&self, name: &str, _items: &HashSet<AccessionNumber>) -> StudySet {
            StudySet::new(name, HashMap::new(), 0, 0)
        }

        fn annotating_term_count(&self) -> usize {
            0
        }

        fn annotated_item_count(&self) -> usize {
            0
        }

        fn description(&self, id: &AnnotationId) -> Option<&str> {
            (id == &AnnotationId::interpro(1)).then_some("Kringle")
        }
    }

    fn ipr(n: u32) -> AnnotationId {
        AnnotationId::interpro(n)
    }

    fn sets() -> (StudySet, StudySet) {
        let study = StudySet::new("study", HashMap::from([(ipr(1), 5), (ipr(2), 1)]), 10, 0);
        let population = StudySet::new(
            "population",
            HashMap::from([(ipr(1), 8), (ipr(2), 40), (ipr(3), 12)]),
            100,
            0,
        );
        (study, population)
    }

    #[test]
    fn enriched_annotation_is_significant() {
        let (study, population) = sets();
        let results = overrepresentation(&study, &population, &Descriptions, MtcMethod::Bonferroni).unwrap();
        assert_eq!(results.len(), 3);
        let top = &results[0];
        assert_eq!(top.annotation_id, ipr(1));
        assert_eq!(top.description, "Kringle");
        assert!(top.raw_pvalue < 0.01, "p = {}", top.raw_pvalue);
        assert!((top.raw_pvalue - 1.6e-4).abs() < 2e-5, "p = {}", top.raw_pvalue);
        assert!(top.adjusted_pvalue <= top.raw_pvalue * 3.0 + 1e-15);
        assert_eq!(top.study_counts(), "5/10 (50.00%)");
        assert_eq!(top.population_counts(), "8/100 (8.00%)");
    }

    #[test]
    fn zero_count_annotations_are_reported_with_p_one() {
        let (study, population) = sets();
        let results = overrepresentation(&study, &population, &Descriptions, MtcMethod::Bonferroni).unwrap();
        let absent = results.iter().find(|r| r.annotation_id == ipr(3)).unwrap();
        assert_eq!(absent.study_annotated, 0);
        assert_eq!(absent.raw_pvalue, 1.0);
        assert_eq!(absent.description, "IPR000003");
        assert!(results.windows(2).all(|w| w[0].raw_pvalue <= w[1].raw_pvalue));
    }

    #[test]
    fn study_annotation_missing_from_population_is_a_violation() {
        let study = StudySet::new("study", HashMap::from([(ipr(9), 1)]), 1, 0);
        let (_, population) = sets();
        let err = overrepresentation(&study, &population, &Descriptions, MtcMethod::None).unwrap_err();
        assert!(matches!(err, IsopretError::ContractViolation(_)));
    }

    #[test]
    fn larger_study_is_a_violation() {
        let (_, population) = sets();
        let study = StudySet::new("study", HashMap::from([(ipr(1), 9)]), 10, 0);
        assert!(overrepresentation(&study, &population, &Descriptions, MtcMethod::None).is_err());
        let study = StudySet::new("study", HashMap::new(), 101, 0);
        assert!(overrepresentation(&study, &population, &Descriptions, MtcMethod::None).is_err());
    }

    #[test]
    fn upper_tail_edges() {
        assert_eq!(upper_tail(100, 8, 10, 0).unwrap(), 1.0);
        assert!(upper_tail(10, 20, 3, 1).is_err());
    }

    #[test]
    fn pvalue_formatting() {
        assert_eq!(format_pvalue(0.5), "0.500");
        assert_eq!(format_pvalue(0.005), "0.0050");
        assert_eq!(format_pvalue(0.0), "0");
        assert_eq!(format_pvalue(0.00016), "1.60e-4");
    }
}
