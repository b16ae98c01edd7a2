//! Core domain types: collections, stored documents, and typed CV records.
//!
//! Documents are stored schema-less. Every consumer goes through
//! [`parse_records`], which turns them into typed records and reports the
//! exact collection and document id when a required field is missing or a
//! date does not start with a year.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CvError, Result};

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Named collections in the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Education,
    Employment,
    Distinctions,
    Editorial,
    Service,
    Memberships,
    Conferences,
    Talks,
    Teaching,
    Funding,
    Publications,
    Metadata,
    Coauthors,
}

impl Collection {
    /// Every collection, in CV order with metadata and coauthors last.
    pub const ALL: [Collection; 13] = [
        Collection::Education,
        Collection::Employment,
        Collection::Distinctions,
        Collection::Editorial,
        Collection::Service,
        Collection::Memberships,
        Collection::Conferences,
        Collection::Talks,
        Collection::Teaching,
        Collection::Funding,
        Collection::Publications,
        Collection::Metadata,
        Collection::Coauthors,
    ];

    /// Collection name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Education => "education",
            Self::Employment => "employment",
            Self::Distinctions => "distinctions",
            Self::Editorial => "editorial",
            Self::Service => "service",
            Self::Memberships => "memberships",
            Self::Conferences => "conferences",
            Self::Talks => "talks",
            Self::Teaching => "teaching",
            Self::Funding => "funding",
            Self::Publications => "publications",
            Self::Metadata => "metadata",
            Self::Coauthors => "coauthors",
        }
    }

    /// Check that a document parses as this collection's record type.
    pub fn validate_document(&self, doc: &Document) -> Result<()> {
        match self {
            Self::Education => parse_record::<EducationEntry>(doc).map(drop),
            Self::Employment => parse_record::<EmploymentEntry>(doc).map(drop),
            Self::Distinctions => parse_record::<Distinction>(doc).map(drop),
            Self::Editorial => parse_record::<EditorialEntry>(doc).map(drop),
            Self::Service => parse_record::<ServiceEntry>(doc).map(drop),
            Self::Memberships => parse_record::<Membership>(doc).map(drop),
            Self::Conferences => parse_record::<ConferenceTalk>(doc).map(drop),
            Self::Talks => parse_record::<InvitedTalk>(doc).map(drop),
            Self::Teaching => parse_record::<TeachingEntry>(doc).map(drop),
            Self::Funding => parse_record::<FundingEntry>(doc).map(drop),
            Self::Publications => parse_record::<Publication>(doc).map(drop),
            Self::Metadata => parse_record::<CvMetadata>(doc).map(drop),
            Self::Coauthors => parse_record::<CoauthorRecord>(doc).map(drop),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = CvError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CvError::validation(format!("unknown collection '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A stored document: its id within the collection and its JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub body: serde_json::Value,
}

impl Document {
    pub fn new(id: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }
}

/// A typed record living in one collection.
pub trait CollectionRecord: DeserializeOwned {
    const COLLECTION: Collection;
}

/// Parse one document into its typed record.
pub fn parse_record<T: CollectionRecord>(doc: &Document) -> Result<T> {
    T::deserialize(&doc.body)
        .map_err(|e| CvError::record(T::COLLECTION.as_str(), doc.id.as_str(), e.to_string()))
}

/// Parse every document of a collection, failing on the first invalid one.
pub fn parse_records<T: CollectionRecord>(docs: &[Document]) -> Result<Vec<T>> {
    docs.iter().map(parse_record).collect()
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// A loosely typed scalar: stored values may be numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Deserialize an optional string-or-number field as text.
fn opt_text<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?.map(|s| s.to_string()))
}

/// Deserialize a list of string-or-number values as text.
fn text_list<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<Scalar>>::deserialize(d)?
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.to_string())
        .collect())
}

/// Extract the year from a date-like value: the integer before the first `-`.
pub fn parse_year(raw: &str) -> std::result::Result<i32, String> {
    let prefix = raw.trim().split('-').next().unwrap_or_default();
    prefix
        .parse::<i32>()
        .map_err(|_| format!("malformed date '{raw}': expected a leading year"))
}

/// A date whose year is known to parse, e.g. `2019`, `"2019"`, `"2019-05-02"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Scalar")]
pub struct DateField {
    raw: String,
    year: i32,
}

impl DateField {
    /// The leading year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The value as stored.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Ordering key: year first, then the stored text.
    pub fn sort_key(&self) -> (i32, &str) {
        (self.year, &self.raw)
    }
}

impl TryFrom<Scalar> for DateField {
    type Error = String;

    fn try_from(value: Scalar) -> std::result::Result<Self, Self::Error> {
        let raw = value.to_string();
        let year = parse_year(&raw)?;
        Ok(Self { raw, year })
    }
}

impl TryFrom<&str> for DateField {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        Self::try_from(Scalar::Text(value.to_string()))
    }
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Render a `start-end` span; a missing end renders as nothing.
pub fn date_span(start: &DateField, end: Option<&Scalar>) -> String {
    match end {
        Some(end) => format!("{start}-{end}"),
        None => format!("{start}-"),
    }
}

// ---------------------------------------------------------------------------
// Dated entries
// ---------------------------------------------------------------------------

/// `education` collection.
#[derive(Debug, Clone, Deserialize)]
pub struct EducationEntry {
    pub start_date: DateField,
    #[serde(default)]
    pub end_date: Option<Scalar>,
    pub degree: String,
    pub institution: String,
    #[serde(default)]
    pub city: Option<String>,
}

impl CollectionRecord for EducationEntry {
    const COLLECTION: Collection = Collection::Education;
}

/// `employment` collection.
#[derive(Debug, Clone, Deserialize)]
pub struct EmploymentEntry {
    pub start_date: DateField,
    #[serde(default)]
    pub end_date: Option<Scalar>,
    pub role: String,
    #[serde(default)]
    pub dept: Option<String>,
    pub institution: String,
}

impl CollectionRecord for EmploymentEntry {
    const COLLECTION: Collection = Collection::Employment;
}

/// `distinctions` collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Distinction {
    pub start_date: DateField,
    pub title: String,
    pub organization: String,
}

impl CollectionRecord for Distinction {
    const COLLECTION: Collection = Collection::Distinctions;
}

/// `service` collection.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceEntry {
    pub role: String,
    pub organization: String,
    pub start_date: DateField,
    #[serde(default)]
    pub end_date: Option<Scalar>,
}

impl CollectionRecord for ServiceEntry {
    const COLLECTION: Collection = Collection::Service;
}

/// `memberships` collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Membership {
    pub organization: String,
    #[serde(default)]
    pub start_date: Option<DateField>,
}

impl CollectionRecord for Membership {
    const COLLECTION: Collection = Collection::Memberships;
}

/// `funding` collection. The end date must carry a year: it decides
/// whether a grant is still active.
#[derive(Debug, Clone, Deserialize)]
pub struct FundingEntry {
    pub role: String,
    pub organization: String,
    #[serde(default)]
    pub title: Option<String>,
    pub start_date: DateField,
    pub end_date: DateField,
}

impl CollectionRecord for FundingEntry {
    const COLLECTION: Collection = Collection::Funding;
}

// ---------------------------------------------------------------------------
// Grouped entries
// ---------------------------------------------------------------------------

/// Editorial roles, in the order they are listed on the CV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum EditorialRole {
    FoundingCoEditorInChief,
    AssociateEditor,
    ContributingEditor,
    HandlingEditor,
    EditorialBoard,
}

impl EditorialRole {
    pub const PRIORITY: [EditorialRole; 5] = [
        EditorialRole::FoundingCoEditorInChief,
        EditorialRole::AssociateEditor,
        EditorialRole::ContributingEditor,
        EditorialRole::HandlingEditor,
        EditorialRole::EditorialBoard,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::FoundingCoEditorInChief => "Founding Co-Editor-in-Chief",
            Self::AssociateEditor => "Associate Editor",
            Self::ContributingEditor => "Contributing Editor",
            Self::HandlingEditor => "Handling Editor (ad hoc)",
            Self::EditorialBoard => "Editorial board",
        }
    }
}

impl TryFrom<String> for EditorialRole {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        let trimmed = value.trim();
        Self::PRIORITY
            .into_iter()
            .find(|r| r.label() == trimmed)
            .ok_or_else(|| format!("unknown editorial role '{trimmed}'"))
    }
}

/// `editorial` collection.
#[derive(Debug, Clone, Deserialize)]
pub struct EditorialEntry {
    pub role: EditorialRole,
    pub journal: String,
}

impl CollectionRecord for EditorialEntry {
    const COLLECTION: Collection = Collection::Editorial;
}

/// Teaching levels, in CV order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum TeachingLevel {
    Undergraduate,
    Graduate,
}

impl TeachingLevel {
    pub const PRIORITY: [TeachingLevel; 2] = [TeachingLevel::Undergraduate, TeachingLevel::Graduate];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Undergraduate => "Undergraduate",
            Self::Graduate => "Graduate",
        }
    }
}

/// `teaching` collection.
#[derive(Debug, Clone, Deserialize)]
pub struct TeachingEntry {
    #[serde(rename = "type")]
    pub level: TeachingLevel,
    pub name: String,
}

impl CollectionRecord for TeachingEntry {
    const COLLECTION: Collection = Collection::Teaching;
}

/// `conferences` collection.
#[derive(Debug, Clone, Deserialize)]
pub struct ConferenceTalk {
    pub date: DateField,
    pub month: String,
    pub monthnum: u32,
    pub title: String,
    pub location: String,
}

impl CollectionRecord for ConferenceTalk {
    const COLLECTION: Collection = Collection::Conferences;
}

/// `talks` collection (invited addresses and colloquia).
#[derive(Debug, Clone, Deserialize)]
pub struct InvitedTalk {
    pub year: i32,
    pub place: String,
}

impl CollectionRecord for InvitedTalk {
    const COLLECTION: Collection = Collection::Talks;
}

// ---------------------------------------------------------------------------
// Publications
// ---------------------------------------------------------------------------

/// Outlet classification driving how a publication's venue is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum AggregationType {
    ConferenceProceeding,
    Journal,
    BookSeries,
    Book,
    Other(String),
}

impl AggregationType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ConferenceProceeding => "Conference Proceeding",
            Self::Journal => "Journal",
            Self::BookSeries => "Book Series",
            Self::Book => "Book",
            Self::Other(s) => s,
        }
    }

    /// Outlets rendered like a periodical (name, volume, pages).
    pub fn is_periodical(&self) -> bool {
        matches!(
            self,
            Self::ConferenceProceeding | Self::Journal | Self::BookSeries
        )
    }
}

impl From<String> for AggregationType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Conference Proceeding" => Self::ConferenceProceeding,
            "Journal" => Self::Journal,
            "Book Series" => Self::BookSeries,
            "Book" => Self::Book,
            _ => Self::Other(value),
        }
    }
}

/// `publications` collection, as harvested from Scopus and curated by hand.
#[derive(Debug, Clone, Deserialize)]
pub struct Publication {
    pub eid: String,
    pub title: String,
    #[serde(rename = "subtypeDescription")]
    pub subtype_description: String,
    #[serde(rename = "aggregationType")]
    pub aggregation_type: AggregationType,
    #[serde(rename = "coverDate")]
    pub cover_date: DateField,
    #[serde(default)]
    pub authors_abbrev: Vec<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub volume: Option<String>,
    #[serde(default, rename = "pageRange", deserialize_with = "opt_text")]
    pub page_range: Option<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub article_number: Option<String>,
    #[serde(default, rename = "publicationName")]
    pub publication_name: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default, rename = "PMCID", deserialize_with = "opt_text")]
    pub pmcid: Option<String>,
    #[serde(default)]
    pub freetoread: Option<String>,
    #[serde(default, rename = "Data")]
    pub data: Option<String>,
    #[serde(default, rename = "Code")]
    pub code: Option<String>,
    #[serde(default, rename = "OSF")]
    pub osf: Option<String>,
    #[serde(default)]
    pub firstauthor: Option<String>,
    #[serde(default, deserialize_with = "text_list")]
    pub scopus_coauthor_ids: Vec<String>,
}

impl Publication {
    /// Publication year, taken from the cover date.
    pub fn year(&self) -> i32 {
        self.cover_date.year()
    }
}

impl CollectionRecord for Publication {
    const COLLECTION: Collection = Collection::Publications;
}

// ---------------------------------------------------------------------------
// Metadata and coauthors
// ---------------------------------------------------------------------------

/// `metadata` collection: the CV owner's name and contact details.
#[derive(Debug, Clone, Deserialize)]
pub struct CvMetadata {
    pub name: String,
    #[serde(default)]
    pub address: Vec<String>,
    #[serde(default, deserialize_with = "opt_text")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub mastodon: Option<String>,
    #[serde(default)]
    pub orcid: Option<String>,
}

impl CollectionRecord for CvMetadata {
    const COLLECTION: Collection = Collection::Metadata;
}

/// `coauthors` collection, regenerated by coauthor enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoauthorRecord {
    pub scopus_id: String,
    pub name: String,
    pub affiliation: Option<Vec<String>>,
    pub affiliation_id: Option<Vec<String>>,
    /// Most recent year of a shared publication.
    pub year: i32,
}

impl CollectionRecord for CoauthorRecord {
    const COLLECTION: Collection = Collection::Coauthors;
}
