//! Tab-separated result tables.

use std::collections::BTreeSet;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{error, info};

use crate::analysis::annotated_gene::AnnotatedGene;
use crate::analysis::overrep::OverrepResult;
use crate::error::{IsopretError, Result};
use crate::AnalysisResults;

pub const INTERPRO_DAS: &str = "interpro_das.tsv";
pub const INTERPRO_DGE: &str = "interpro_dge.tsv";
pub const GO_DAS: &str = "go_das.tsv";
pub const GO_DGE: &str = "go_dge.tsv";
pub const GENES: &str = "genes.tsv";

pub fn enrichment_frame(results: &[OverrepResult]) -> PolarsResult<DataFrame> {
    let strings = |f: fn(&OverrepResult) -> String| results.iter().map(f).collect::<Vec<_>>();
    let counts = |f: fn(&OverrepResult) -> usize| results.iter().map(|r| f(r) as u64).collect::<Vec<_>>();

    DataFrame::new(vec![
        Column::new("id".into(), strings(|r| r.annotation_id.to_string())),
        Column::new("description".into(), strings(|r| r.description.clone())),
        Column::new("study".into(), strings(OverrepResult::study_counts)),
        Column::new("population".into(), strings(OverrepResult::population_counts)),
        Column::new("study_annotated".into(), counts(|r| r.study_annotated)),
        Column::new("study_total".into(), counts(|r| r.study_total)),
        Column::new("population_annotated".into(), counts(|r| r.population_annotated)),
        Column::new("population_total".into(), counts(|r| r.population_total)),
        Column::new("p_raw".into(), results.iter().map(|r| r.raw_pvalue).collect::<Vec<_>>()),
        Column::new("p_adjusted".into(), results.iter().map(|r| r.adjusted_pvalue).collect::<Vec<_>>()),
    ])
}

fn annotation_list(gene: &AnnotatedGene) -> String {
    let ids: BTreeSet<String> = gene
        .annotation_ids_by_transcript()
        .into_values()
        .flatten()
        .map(|id| id.to_string())
        .collect();
    ids.into_iter().collect::<Vec<_>>().join(",")
}

/// One row per gene, in display order.
pub fn genes_frame(genes: &[AnnotatedGene]) -> PolarsResult<DataFrame> {
    let mut ordered: Vec<&AnnotatedGene> = genes.iter().collect();
    ordered.sort_by(|a, b| a.display_order(b));

    let counts = |f: &dyn Fn(&AnnotatedGene) -> usize| ordered.iter().map(|g| f(*g) as u64).collect::<Vec<_>>();
    let peps = |f: &dyn Fn(&AnnotatedGene) -> f64| ordered.iter().map(|g| f(*g)).collect::<Vec<_>>();
    let flags = |f: &dyn Fn(&AnnotatedGene) -> bool| ordered.iter().map(|g| f(*g)).collect::<Vec<_>>();

    DataFrame::new(vec![
        Column::new(
            "symbol".into(),
            ordered.iter().map(|g| g.symbol().to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            "gene_id".into(),
            ordered.iter().map(|g| g.result().gene_id().to_string()).collect::<Vec<_>>(),
        ),
        Column::new("expression_pep".into(), peps(&|g| g.result().expression_pep())),
        Column::new("smallest_splicing_pep".into(), peps(&|g| g.result().smallest_splicing_pep())),
        Column::new("differentially_expressed".into(), flags(&|g| g.passes_expression_threshold())),
        Column::new("differentially_spliced".into(), flags(&|g| g.passes_splicing_threshold())),
        Column::new("expressed_transcripts".into(), counts(&|g| g.expressed_transcripts().len())),
        Column::new("coding".into(), counts(&|g| g.coding_transcript_count())),
        Column::new("noncoding".into(), counts(&|g| g.noncoding_transcript_count())),
        Column::new(
            "significant_transcripts".into(),
            counts(&|g| g.result().significant_transcript_count(g.splicing_threshold())),
        ),
        Column::new("upregulated".into(), counts(&|g| g.upregulated().len())),
        Column::new("downregulated".into(), counts(&|g| g.downregulated().len())),
        Column::new(
            "annotations".into(),
            ordered.iter().map(|g| annotation_list(g)).collect::<Vec<_>>(),
        ),
    ])
}

pub fn write_tsv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).map_err(|e| IsopretError::io(e, path))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b'\t')
        .finish(df)
        .map_err(|e| {
            error!("Failed to write {}: {}", path.display(), e);
            e
        })?;
    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Writes every table of a run into `output_dir` and returns the written paths.
pub fn write_report(results: &AnalysisResults, output_dir: &Path) -> Result<Vec<PathBuf>> {
    create_dir_all(output_dir).map_err(|e| IsopretError::io(e, output_dir))?;

    let mut tables: Vec<(&str, DataFrame)> = vec![
        (INTERPRO_DAS, enrichment_frame(&results.interpro.das)?),
        (INTERPRO_DGE, enrichment_frame(&results.interpro.dge)?),
        (GENES, genes_frame(&results.genes.genes)?),
    ];
    if let Some(go) = &results.go {
        tables.push((GO_DAS, enrichment_frame(&go.das)?));
        tables.push((GO_DGE, enrichment_frame(&go.dge)?));
    }

    let mut written = Vec::with_capacity(tables.len());
    for (name, mut df) in tables {
        let path = output_dir.join(name);
        write_tsv(&mut df, &path)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnnotationId;

    #[test]
    fn enrichment_table_layout() {
        let results = vec![OverrepResult {
            annotation_id: AnnotationId::interpro(276),
            description: "Kringle".into(),
            study_annotated: 5,
            study_total: 10,
            population_annotated: 8,
            population_total: 100,
            raw_pvalue: 1.6e-4,
            adjusted_pvalue: 4.8e-4,
        }];
        let mut df = enrichment_frame(&results).unwrap();
        assert_eq!(df.shape(), (1, 10));

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.tsv");
        write_tsv(&mut df, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("id\tdescription\tstudy\tpopulation"));
        assert!(lines.next().unwrap().starts_with("IPR000276\tKringle\t5/10 (50.00%)\t8/100 (8.00%)"));
    }
}
