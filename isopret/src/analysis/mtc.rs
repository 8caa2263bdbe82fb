//! Multiple-testing correction of enrichment p-values.

use std::fmt;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum MtcMethod {
    #[default]
    Bonferroni,
    BonferroniHolm,
    BenjaminiHochberg,
    BenjaminiYekutieli,
    Sidak,
    None,
}

impl MtcMethod {
    /// Case-insensitive lookup; `None` for an unknown name.
    pub fn from_name(name: &str) -> Option<Self> {
        let method = match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "bonferroni" => MtcMethod::Bonferroni,
            "holm" | "bonferroni-holm" => MtcMethod::BonferroniHolm,
            "bh" | "fdr" | "benjamini-hochberg" => MtcMethod::BenjaminiHochberg,
            "by" | "benjamini-yekutieli" => MtcMethod::BenjaminiYekutieli,
            "sidak" => MtcMethod::Sidak,
            "none" => MtcMethod::None,
            _ => return None,
        };
        Some(method)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MtcMethod::Bonferroni => "Bonferroni",
            MtcMethod::BonferroniHolm => "Bonferroni-Holm",
            MtcMethod::BenjaminiHochberg => "Benjamini-Hochberg",
            MtcMethod::BenjaminiYekutieli => "Benjamini-Yekutieli",
            MtcMethod::Sidak => "Sidak",
            MtcMethod::None => "None",
        }
    }

    /// Adjusted p-values, in the order of `pvalues`. The number of tests is `pvalues.len()`.
    pub fn adjust(&self, pvalues: &[f64]) -> Vec<f64> {
        match self {
            MtcMethod::Bonferroni => bonferroni(pvalues),
            MtcMethod::BonferroniHolm => holm(pvalues),
            MtcMethod::BenjaminiHochberg => benjamini_hochberg(pvalues),
            MtcMethod::BenjaminiYekutieli => {
                let n = pvalues.len();
                let c: f64 = (1..=n).map(|k| 1.0 / k as f64).sum();
                benjamini_hochberg(pvalues).into_iter().map(|p| (p * c).min(1.0)).collect()
            }
            MtcMethod::Sidak => sidak(pvalues),
            MtcMethod::None => pvalues.to_vec(),
        }
    }
}

impl TryFrom<String> for MtcMethod {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::from_name(&name).ok_or_else(|| {
            format!(
                "unknown multiple-testing correction \"{name}\" (expected bonferroni, holm, bh, by, sidak or none)"
            )
        })
    }
}

impl fmt::Display for MtcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn bonferroni(pvalues: &[f64]) -> Vec<f64> {
    let n = pvalues.len() as f64;
    pvalues.iter().map(|p| (p * n).min(1.0)).collect()
}

pub fn sidak(pvalues: &[f64]) -> Vec<f64> {
    let n = pvalues.len() as i32;
    pvalues.iter().map(|p| 1.0 - (1.0 - p).powi(n)).collect()
}

fn ascending_order(pvalues: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..pvalues.len()).collect();
    order.sort_by(|&a, &b| pvalues[a].total_cmp(&pvalues[b]));
    order
}

/// Step-down Holm correction.
pub fn holm(pvalues: &[f64]) -> Vec<f64> {
    let n = pvalues.len();
    let mut adjusted = vec![0.0; n];
    let mut running_max: f64 = 0.0;
    for (rank, &i) in ascending_order(pvalues).iter().enumerate() {
        let p = ((n - rank) as f64 * pvalues[i]).min(1.0);
        running_max = running_max.max(p);
        adjusted[i] = running_max;
    }
    adjusted
}

/// Step-up Benjamini-Hochberg correction.
pub fn benjamini_hochberg(pvalues: &[f64]) -> Vec<f64> {
    let n = pvalues.len();
    let mut adjusted = vec![0.0; n];
    let mut running_min: f64 = 1.0;
    for (rank, &i) in ascending_order(pvalues).iter().enumerate().rev() {
        let p = (n as f64 / (rank + 1) as f64 * pvalues[i]).min(1.0);
        running_min = running_min.min(p);
        adjusted[i] = running_min;
    }
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: [f64; 5] = [0.01, 0.04, 0.03, 0.005, 0.5];

    fn close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-9, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn bonferroni_caps_at_one() {
        close(&bonferroni(&P), &[0.05, 0.2, 0.15, 0.025, 1.0]);
    }

    #[test]
    fn holm_is_monotone_step_down() {
        // sorted: 0.005*5, 0.01*4, 0.03*3, 0.04*2, 0.5*1
        close(&holm(&P), &[0.04, 0.09, 0.09, 0.025, 0.5]);
    }

    #[test]
    fn benjamini_hochberg_step_up() {
        // sorted ranks: 0.005 (1), 0.01 (2), 0.03 (3), 0.04 (4), 0.5 (5)
        // raw: 0.025, 0.025, 0.05, 0.05, 0.5
        close(&benjamini_hochberg(&P), &[0.025, 0.05, 0.05, 0.025, 0.5]);
    }

    #[test]
    fn names() {
        assert_eq!(MtcMethod::from_name("BH"), Some(MtcMethod::BenjaminiHochberg));
        assert_eq!(MtcMethod::from_name("bonferroni_holm"), Some(MtcMethod::BonferroniHolm));
        assert_eq!(MtcMethod::from_name("by"), Some(MtcMethod::BenjaminiYekutieli));
        assert_eq!(MtcMethod::from_name("nonsense"), None);
        let parsed: MtcMethod = serde_json::from_str("\"sidak\"").unwrap();
        assert_eq!(parsed, MtcMethod::Sidak);
        assert!(serde_json::from_str::<MtcMethod>("\"benjamini-hochbreg\"").is_err());
    }

    #[test]
    fn none_and_empty() {
        close(&MtcMethod::None.adjust(&P), &P);
        assert!(MtcMethod::BenjaminiYekutieli.adjust(&[]).is_empty());
    }
}
