//! Sections that join several records onto one line per group.

use academiccv_latex::escape_text;
use academiccv_shared::{EditorialEntry, EditorialRole, InvitedTalk, Membership, TeachingEntry, TeachingLevel};

use super::{distinct_years_desc, section_header};

/// Escape each item, then join with `, `.
fn join_escaped<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    items
        .into_iter()
        .map(escape_text)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Editorial duties: one line per role in [`EditorialRole::PRIORITY`] order.
pub fn format_editorial(entries: &[EditorialEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = section_header("Editorial duties");
    for role in EditorialRole::PRIORITY {
        let journals: Vec<&str> = entries
            .iter()
            .filter(|e| e.role == role)
            .map(|e| e.journal.as_str())
            .collect();
        if journals.is_empty() {
            continue;
        }
        out.push_str(&format!("\\textit{{{}}}: {}\n\n", role.label(), join_escaped(journals)));
    }
    out
}

/// Professional societies on a single line, most recently joined first.
pub fn format_memberships(entries: &[Membership]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut sorted: Vec<&Membership> = entries.iter().collect();
    // Undated memberships sort last.
    sorted.sort_by(|a, b| {
        let ka = a.start_date.as_ref().map(|d| d.sort_key());
        let kb = b.start_date.as_ref().map(|d| d.sort_key());
        kb.cmp(&ka)
    });

    let mut out = section_header("Professional societies");
    out.push_str(&join_escaped(sorted.iter().map(|m| m.organization.as_str())));
    out.push_str("\n\n");
    out
}

/// Teaching: one line per level, undergraduate first.
pub fn format_teaching(entries: &[TeachingEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = section_header("Teaching");
    for level in TeachingLevel::PRIORITY {
        let courses: Vec<&str> = entries
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.name.as_str())
            .collect();
        if courses.is_empty() {
            continue;
        }
        out.push_str(&format!("\\textit{{{}}}: {}\n\n", level.label(), join_escaped(courses)));
    }
    out
}

/// Invited talks: one line per year, most recent first.
pub fn format_talks(entries: &[InvitedTalk]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = section_header("Invited addresses and colloquia (* - talks given virtually)");
    for year in distinct_years_desc(entries.iter().map(|t| t.year)) {
        let places = join_escaped(
            entries
                .iter()
                .filter(|t| t.year == year)
                .map(|t| t.place.as_str()),
        );
        out.push_str(&format!("{year}: {places}\n\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use academiccv_shared::{Document, parse_records};
    use serde_json::{Value, json};

    fn records<T: academiccv_shared::CollectionRecord>(bodies: Vec<Value>) -> Vec<T> {
        let docs: Vec<Document> = bodies
            .into_iter()
            .enumerate()
            .map(|(i, body)| Document::new(format!("d{i}"), body))
            .collect();
        parse_records(&docs).unwrap()
    }

    #[test]
    fn empty_collections_render_nothing() {
        assert_eq!(format_editorial(&[]), "");
        assert_eq!(format_memberships(&[]), "");
        assert_eq!(format_teaching(&[]), "");
        assert_eq!(format_talks(&[]), "");
    }

    #[test]
    fn editorial_follows_role_priority_and_skips_absent_roles() {
        let entries: Vec<EditorialEntry> = records(vec![
            json!({"role": "Editorial board ", "journal": "NeuroImage"}),
            json!({"role": "Founding Co-Editor-in-Chief", "journal": "Imaging Neuroscience"}),
            json!({"role": "Editorial board", "journal": "eLife"}),
        ]);
        let out = format_editorial(&entries);
        assert!(out.starts_with("\n\\section*{Editorial duties}\n\\noindent\n"));
        assert!(out.contains("\\textit{Founding Co-Editor-in-Chief}: Imaging Neuroscience\n\n"));
        assert!(out.contains("\\textit{Editorial board}: NeuroImage, eLife\n\n"));
        assert!(!out.contains("Associate Editor"));
        assert!(out.find("Founding").unwrap() < out.find("Editorial board").unwrap());
    }

    #[test]
    fn memberships_join_on_one_line() {
        let entries: Vec<Membership> = records(vec![
            json!({"organization": "Society for Neuroscience", "start_date": 1995}),
            json!({"organization": "Psychonomic Society"}),
            json!({"organization": "OHBM", "start_date": 2001}),
        ]);
        let out = format_memberships(&entries);
        assert!(out.ends_with("OHBM, Society for Neuroscience, Psychonomic Society\n\n"));
    }

    #[test]
    fn teaching_lists_undergraduate_first() {
        let entries: Vec<TeachingEntry> = records(vec![
            json!({"type": "Graduate", "name": "fMRI Methods"}),
            json!({"type": "Undergraduate", "name": "Intro to Psychology"}),
            json!({"type": "Graduate", "name": "Reproducible Science"}),
        ]);
        let out = format_teaching(&entries);
        assert!(out.contains("\\textit{Undergraduate}: Intro to Psychology\n\n\\textit{Graduate}: fMRI Methods, Reproducible Science\n\n"));
    }

    #[test]
    fn talks_group_by_year_descending() {
        let entries: Vec<InvitedTalk> = records(vec![
            json!({"year": 2019, "place": "MIT"}),
            json!({"year": 2021, "place": "Oxford*"}),
            json!({"year": 2019, "place": "Harvard"}),
        ]);
        let out = format_talks(&entries);
        assert!(out.contains("2021: Oxford*\n\n2019: MIT, Harvard\n\n"));
    }
}
