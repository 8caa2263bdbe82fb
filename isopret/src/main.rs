use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use isopret::config::AnalysisConfig;
use isopret::helper_functions::config_path;
use isopret::report::write_report;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting isopret");

    let path = config_path();
    let config = AnalysisConfig::from_file(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;

    let results = isopret::run(&config).context("analysis failed")?;

    info!(
        "Expression PEP threshold {}, splicing PEP threshold {}",
        results.thresholds.expression_threshold(),
        results.thresholds.splicing_threshold()
    );
    for r in results.interpro.das.iter().take(5) {
        info!(
            "DAS {} {}: study {}, population {}, p={} (corrected {})",
            r.annotation_id,
            r.description,
            r.study_counts(),
            r.population_counts(),
            r.raw_p(),
            r.adjusted_p()
        );
    }

    let written = write_report(&results, config.output_dir())
        .with_context(|| format!("writing results to {}", config.output_dir().display()))?;
    for path in written {
        info!("Wrote {}", path.display());
    }
    Ok(())
}
