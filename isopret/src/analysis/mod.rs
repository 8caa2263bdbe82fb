pub mod annotated_gene;
pub mod annotation;
pub mod go;
pub mod mtc;
pub mod overrep;
pub mod threshold;
pub mod thresholder;
