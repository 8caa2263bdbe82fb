pub mod go;
pub mod hbadeals;
pub mod hgnc;
pub mod interpro;
pub mod transcripts;

use crate::error::Result;

/// An input file that can be read into its in-memory form.
pub trait Dataset {
    type Output;

    fn load(&self) -> Result<Self::Output>;
}
