//! Stored payload format
//!
//! Both stores hold one [`Datum`] per record key. Label datums are 1x1x1
//! with a single float; image datums carry the decoder output.

mod errors;
mod record;

pub use errors::{DatumError, DatumResult};
pub use record::Datum;
