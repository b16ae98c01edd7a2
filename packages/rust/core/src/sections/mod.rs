//! Section formatters: one function per CV section.
//!
//! Every formatter takes the whole collection as typed records and returns
//! a LaTeX fragment. An empty collection yields an empty string; otherwise
//! the fragment opens with [`section_header`] and every entry ends with a
//! blank line.

mod conferences;
mod dated;
mod grouped;
mod heading;
mod publications;

use std::collections::BTreeSet;

pub use conferences::format_conferences;
pub use dated::{
    format_distinctions, format_education, format_employment, format_funding, format_service,
};
pub use grouped::{format_editorial, format_memberships, format_talks, format_teaching};
pub use heading::format_heading;
pub use publications::{
    PublicationOptions, format_author_list, format_outlet, format_publication,
    format_publications, is_correction,
};

/// `\section*{heading}` followed by `\noindent`.
pub(crate) fn section_header(heading: &str) -> String {
    format!("\n\\section*{{{heading}}}\n\\noindent\n")
}

/// Distinct years, most recent first.
pub(crate) fn distinct_years_desc(years: impl IntoIterator<Item = i32>) -> Vec<i32> {
    let set: BTreeSet<i32> = years.into_iter().collect();
    set.into_iter().rev().collect()
}
