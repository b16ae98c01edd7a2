//! Core pipelines and domain logic for academiccv.
//!
//! This crate ties the record store, the section formatters and the
//! typesetter into end-to-end workflows (`render_cv`, `enrich_coauthors`,
//! `import_collections`).

pub mod assembler;
pub mod coauthors;
pub mod import;
pub mod pipeline;
pub mod sections;
pub mod typeset;
