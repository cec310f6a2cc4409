//! In-process state owned by the pipeline

pub mod dedup;

pub use dedup::DedupLedger;
