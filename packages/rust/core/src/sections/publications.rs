//! Publication list formatting.
//!
//! Entries are grouped by cover-date year (most recent first) and sorted by
//! first author within a year. Each entry is
//!
//! ```text
//! [\textbf{EID}\n] AUTHORS (YEAR). TITLE. OUTLET LINKS\vspace{2mm}
//! ```
//!
//! where the outlet depends on the aggregation type and subtype, and links
//! cover open access, DOI, data, code and OSF.

use std::collections::HashSet;

use academiccv_latex::{clean_title, escape_text, href};
use academiccv_shared::{AggregationType, AuthorListConfig, Publication, RenderConfig};
use tracing::{debug, warn};

use super::{distinct_years_desc, section_header};

/// Title fragments marking corrections that never appear on the CV.
const CORRECTION_MARKERS: [&str; 3] = ["Corrigendum", "Author Correction", "Erratum"];

/// `freetoread` values meaning the publisher copy is open access.
const OPEN_ACCESS_STATUSES: [&str; 2] = ["publisherhybridgold", "publisherfree2read"];

/// Subtypes rendered as a chapter inside a book.
const CHAPTER_SUBTYPES: [&str; 2] = ["Editorial", "Book Chapter"];

const PMC_ARTICLE_BASE: &str = "https://www.ncbi.nlm.nih.gov/pmc/articles/PMC";
const DOI_BASE: &str = "https://doi.org/";

/// Knobs for the publication list.
#[derive(Debug, Clone, Default)]
pub struct PublicationOptions {
    pub authors: AuthorListConfig,
    /// DOIs never rendered.
    pub exclude_dois: HashSet<String>,
    /// Prefix each entry with its EID in bold.
    pub debug_eids: bool,
}

impl PublicationOptions {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            authors: config.authors,
            exclude_dois: config.exclude_dois.iter().cloned().collect(),
            debug_eids: config.debug_eids,
        }
    }
}

/// True when the title marks a correction notice.
pub fn is_correction(title: &str) -> bool {
    CORRECTION_MARKERS.iter().any(|m| title.contains(m))
}

/// Render the author list. Each name is trimmed and escaped before joining.
///
/// Lists longer than `max_authors` keep the first `show_authors` names and
/// end in ` et al.`; shorter lists end in `. `.
pub fn format_author_list(authors: &[String], limits: AuthorListConfig) -> String {
    let names: Vec<String> = authors.iter().map(|a| escape_text(a.trim())).collect();

    if names.len() > limits.max_authors {
        let shown = limits.show_authors.min(names.len());
        format!("{} et al.", names[..shown].join(", "))
    } else {
        format!("{}. ", names.join(", "))
    }
}

/// Render the venue part of an entry.
///
/// Unknown type combinations produce a bold `TBD` placeholder so the gap is
/// visible in the output instead of failing the run.
pub fn format_outlet(p: &Publication) -> String {
    let name = escape_text(p.publication_name.as_deref().unwrap_or_default());
    let subtype = p.subtype_description.as_str();

    match &p.aggregation_type {
        t if t.is_periodical() => {
            let volume = p
                .volume
                .as_deref()
                .map(|v| format!(", {}", escape_text(v)))
                .unwrap_or_default();
            let pages = p
                .page_range
                .as_deref()
                .or(p.article_number.as_deref())
                .map(|v| format!(", {}", escape_text(v)))
                .unwrap_or_default();
            format!(" \\textit{{{name}{volume}}}{pages}. ")
        }
        AggregationType::Book if CHAPTER_SUBTYPES.contains(&subtype) => {
            let volume = p
                .volume
                .as_deref()
                .map(|v| format!(" (Vol. {})", escape_text(v)))
                .unwrap_or_default();
            let pages = p
                .page_range
                .as_deref()
                .map(|v| format!(", {}", escape_text(v)))
                .unwrap_or_default();
            format!(" In \\textit{{{name}{volume}}}{pages}. ")
        }
        AggregationType::Book if subtype == "Book" => {
            let volume = p
                .volume
                .as_deref()
                .map(|v| format!(" (Vol. {})", escape_text(v)))
                .unwrap_or_default();
            let publisher = escape_text(p.publisher.as_deref().unwrap_or_default());
            format!(" \\textit{{{name}}}{volume}. {publisher}.")
        }
        other => {
            warn!(
                eid = %p.eid,
                aggregation_type = other.as_str(),
                subtype,
                "unknown outlet type, rendering placeholder"
            );
            format!("\\textbf{{TBD{}}}", escape_text(other.as_str()))
        }
    }
}

/// Open access, DOI, data, code and OSF links, each followed by a space.
fn format_links(p: &Publication) -> String {
    let mut out = String::new();
    let doi = p.doi.as_deref().filter(|d| !d.is_empty());

    let pmcid = p.pmcid.as_deref().filter(|id| !id.is_empty());
    let publisher_oa = p
        .freetoread
        .as_deref()
        .is_some_and(|status| OPEN_ACCESS_STATUSES.contains(&status));

    if let Some(pmcid) = pmcid {
        out.push_str(&href(&format!("{PMC_ARTICLE_BASE}{pmcid}"), "OA"));
        out.push(' ');
    } else if let (true, Some(doi)) = (publisher_oa, doi) {
        out.push_str(&href(&format!("{DOI_BASE}{doi}"), "OA"));
        out.push(' ');
    }

    if let Some(doi) = doi {
        out.push_str(&href(&format!("{DOI_BASE}{doi}"), "DOI"));
        out.push(' ');
    }

    for (url, label) in [(&p.data, "Data"), (&p.code, "Code"), (&p.osf, "OSF")] {
        if let Some(url) = url.as_deref().filter(|u| !u.is_empty()) {
            out.push_str(&href(url, label));
            out.push(' ');
        }
    }

    out
}

/// Render one publication entry.
pub fn format_publication(p: &Publication, opts: &PublicationOptions) -> String {
    let mut out = String::new();

    if opts.debug_eids {
        out.push_str(&format!("\\textbf{{{}}}\n", escape_text(&p.eid)));
    }

    out.push_str(&format_author_list(&p.authors_abbrev, opts.authors));
    out.push_str(&format!(" ({}). ", p.year()));

    // Whole books are identified by their outlet alone.
    if p.subtype_description != "Book" {
        out.push_str(&format!("{}.", escape_text(&clean_title(&p.title))));
    }

    out.push_str(&format_outlet(p));
    out.push_str(&format_links(p));
    out.push_str("\\vspace{2mm}\n\n");
    out
}

/// Publications grouped by year, most recent first.
pub fn format_publications(publications: &[Publication], opts: &PublicationOptions) -> String {
    if publications.is_empty() {
        return String::new();
    }

    let mut out = section_header("Publications");
    for year in distinct_years_desc(publications.iter().map(Publication::year)) {
        let mut year_pubs: Vec<&Publication> =
            publications.iter().filter(|p| p.year() == year).collect();
        year_pubs.sort_by(|a, b| {
            let ka = a.firstauthor.as_deref().unwrap_or_default();
            let kb = b.firstauthor.as_deref().unwrap_or_default();
            ka.cmp(kb)
        });

        out.push_str(&format!("\\subsection*{{{year}}}"));
        for p in year_pubs {
            if is_correction(&p.title) {
                debug!(eid = %p.eid, "skipping correction notice");
                continue;
            }
            if p.doi.as_ref().is_some_and(|d| opts.exclude_dois.contains(d)) {
                debug!(eid = %p.eid, "skipping excluded doi");
                continue;
            }
            out.push_str(&format_publication(p, opts));
        }
    }
    out
}
