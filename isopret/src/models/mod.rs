pub mod accession;
pub mod interpro;
pub mod rnaseq;
pub mod term;
pub mod transcript;

pub use accession::{AccessionNumber, AccessionParseError, Category, Database};
pub use interpro::{merge_hits, AnnotationEntry, EntryType, MergedHit, PositionalHit};
pub use rnaseq::{GeneModel, GeneResult, TranscriptResult};
pub use term::AnnotationId;
pub use transcript::{Span, Transcript};
