//! Shared types, error model, and configuration for academiccv.
//!
//! This crate is the foundation depended on by all other academiccv crates.
//! It provides:
//! - [`CvError`], the unified error type
//! - Typed CV records ([`Publication`], [`ConferenceTalk`], [`CvMetadata`], ...)
//! - Configuration ([`AppConfig`], config loading, database resolution)
//! - The [`AuthorLookup`] seam used by coauthor enrichment

pub mod config;
pub mod error;
pub mod lookup;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AuthorListConfig, DbConfig, RenderConfig, ScopusConfig, TypesetConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
    resolve_database_path, resolve_database_path_in, scopus_api_key,
};
pub use error::{CvError, Result};
pub use lookup::{AffiliationInfo, AuthorLookup, AuthorProfile};
pub use types::{
    AggregationType, CoauthorRecord, Collection, CollectionRecord, ConferenceTalk, CvMetadata,
    DateField, Distinction, Document, EditorialEntry, EditorialRole, EducationEntry,
    EmploymentEntry, FundingEntry, InvitedTalk, Membership, Publication, Scalar, ServiceEntry,
    TeachingEntry, TeachingLevel, date_span, parse_record, parse_records, parse_year,
};
