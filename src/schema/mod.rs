//! Listening history input schema
//!
//! Defines the track play record consumed by the engine, its loosely-typed
//! wire form, and the validation applied at the ingestion boundary.

mod adapter;
mod track_record;

pub use adapter::*;
pub use track_record::*;
