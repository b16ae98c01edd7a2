//! End-to-end `render` pipeline: store → section fragments → document → PDF.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Datelike;
use tracing::{debug, info, instrument};

use academiccv_shared::{
    AppConfig, ConferenceTalk, CvError, CvMetadata, Distinction, EditorialEntry, EducationEntry,
    EmploymentEntry, FundingEntry, InvitedTalk, Membership, Publication, RenderConfig, Result,
    ServiceEntry, TeachingEntry, TypesetConfig,
};
use academiccv_storage::Storage;

use crate::assembler::{self, Fragments, Section, WrittenDocument};
use crate::sections::{self, PublicationOptions};
use crate::typeset::{self, TypesetOutcome};

/// Everything `render_cv` needs besides the store.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub render: RenderConfig,
    pub typeset: TypesetConfig,
    /// Year used to split active from completed funding.
    pub current_year: i32,
}

impl RenderOptions {
    /// Options from the loaded config, with the current local year.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            render: config.render.clone(),
            typeset: config.typeset.clone(),
            current_year: chrono::Local::now().year(),
        }
    }
}

/// Result of the `render_cv` pipeline.
#[derive(Debug)]
pub struct RenderResult {
    pub document: WrittenDocument,
    /// Sections that produced output, in document order.
    pub sections: Vec<Section>,
    /// `None` when typesetting is disabled.
    pub typeset: Option<TypesetOutcome>,
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called for each unit of work inside a phase.
    fn item(&self, current: usize, total: usize, detail: &str);
    /// Called once when the run completes.
    fn finish(&self, message: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item(&self, _current: usize, _total: usize, _detail: &str) {}
    fn finish(&self, _message: &str) {}
}

/// Render the CV.
///
/// 1. Load metadata (exactly one record) and every section collection
/// 2. Format each section
/// 3. Assemble between the header and footer templates
/// 4. Write the output document
/// 5. Run the typesetter unless disabled
#[instrument(skip_all, fields(output = %options.render.output))]
pub async fn render_cv(
    options: &RenderOptions,
    storage: &Storage,
    progress: &dyn ProgressReporter,
) -> Result<RenderResult> {
    let start = Instant::now();
    let render = &options.render;

    // --- Phase 1: Load ---
    progress.phase("Loading records");
    let metadata = load_metadata(storage).await?;
    let fragments = build_fragments(options, &metadata, storage).await?;

    let sections: Vec<Section> = Section::ORDER
        .into_iter()
        .filter(|s| !fragments.get(*s).is_empty())
        .collect();
    debug!(?sections, "sections with content");

    // --- Phase 2: Assemble ---
    progress.phase("Assembling document");
    let header = assembler::read_template(Path::new(&render.header))?;
    let footer = assembler::read_template(Path::new(&render.footer))?;
    let text = assembler::assemble_document(&header, &fragments, &footer);

    let output = PathBuf::from(&render.output);
    let document = assembler::write_document(&output, &text)?;

    // --- Phase 3: Typeset ---
    let typeset = if options.typeset.enabled {
        progress.phase("Typesetting");
        Some(typeset::run_typesetter(&options.typeset, &document.path).await?)
    } else {
        debug!("typesetting disabled");
        None
    };

    let result = RenderResult {
        document,
        sections,
        typeset,
        elapsed: start.elapsed(),
    };

    info!(
        path = %result.document.path.display(),
        sections = result.sections.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "render pipeline complete"
    );
    progress.finish(&format!("wrote {}", result.document.path.display()));

    Ok(result)
}

/// The single metadata record.
pub async fn load_metadata(storage: &Storage) -> Result<CvMetadata> {
    let mut records: Vec<CvMetadata> = storage.load().await?;
    if records.len() != 1 {
        return Err(CvError::MetadataCount {
            found: records.len(),
        });
    }
    records
        .pop()
        .ok_or(CvError::MetadataCount { found: 0 })
}

/// Load every section collection and format it.
async fn build_fragments(
    options: &RenderOptions,
    metadata: &CvMetadata,
    storage: &Storage,
) -> Result<Fragments> {
    let render = &options.render;
    let mut fragments = Fragments::new();

    fragments.set(Section::Heading, sections::format_heading(metadata));

    let education: Vec<EducationEntry> = storage.load().await?;
    fragments.set(Section::Education, sections::format_education(&education));

    let employment: Vec<EmploymentEntry> = storage.load().await?;
    fragments.set(Section::Employment, sections::format_employment(&employment));

    let distinctions: Vec<Distinction> = storage.load().await?;
    fragments.set(Section::Distinctions, sections::format_distinctions(&distinctions));

    let editorial: Vec<EditorialEntry> = storage.load().await?;
    fragments.set(Section::Editorial, sections::format_editorial(&editorial));

    let memberships: Vec<Membership> = storage.load().await?;
    fragments.set(Section::Memberships, sections::format_memberships(&memberships));

    let service: Vec<ServiceEntry> = storage.load().await?;
    fragments.set(Section::Service, sections::format_service(&service));

    if render.include_funding {
        let funding: Vec<FundingEntry> = storage.load().await?;
        fragments.set(
            Section::Funding,
            sections::format_funding(&funding, options.current_year),
        );
    }

    let teaching: Vec<TeachingEntry> = storage.load().await?;
    fragments.set(Section::Teaching, sections::format_teaching(&teaching));

    let publications: Vec<Publication> = storage.load().await?;
    let pub_opts = PublicationOptions::from_config(render);
    fragments.set(
        Section::Publications,
        sections::format_publications(&publications, &pub_opts),
    );

    let conferences: Vec<ConferenceTalk> = storage.load().await?;
    fragments.set(Section::Conferences, sections::format_conferences(&conferences));

    let talks: Vec<InvitedTalk> = storage.load().await?;
    fragments.set(Section::Talks, sections::format_talks(&talks));

    info!(
        publications = publications.len(),
        conferences = conferences.len(),
        talks = talks.len(),
        "records loaded"
    );

    Ok(fragments)
}
