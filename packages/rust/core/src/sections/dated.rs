//! Sections listing one dated entry per line.

use academiccv_latex::escape_text;
use academiccv_shared::{
    DateField, Distinction, EducationEntry, EmploymentEntry, FundingEntry, ServiceEntry, date_span,
};
use tracing::debug;

use super::section_header;

/// Stable sort by start date; ties keep store order.
fn sorted_by_start<'a, T>(
    entries: &'a [T],
    start: impl Fn(&T) -> &DateField,
    descending: bool,
) -> Vec<&'a T> {
    let mut sorted: Vec<&T> = entries.iter().collect();
    sorted.sort_by(|a, b| {
        let ord = start(a).sort_key().cmp(&start(b).sort_key());
        if descending { ord.reverse() } else { ord }
    });
    sorted
}

/// Education and training, oldest first.
pub fn format_education(entries: &[EducationEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = section_header("Education and training");
    for e in sorted_by_start(entries, |e| &e.start_date, false) {
        let span = escape_text(&date_span(&e.start_date, e.end_date.as_ref()));
        out.push_str(&format!(
            "\\textit{{{span}}}: {}, {}",
            escape_text(&e.degree),
            escape_text(&e.institution)
        ));
        if let Some(city) = &e.city {
            out.push_str(&format!(", {}", escape_text(city)));
        }
        out.push_str("\n\n");
    }
    out
}

/// Employment and professional affiliations, most recent first.
pub fn format_employment(entries: &[EmploymentEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = section_header("Employment and professional affiliations");
    for e in sorted_by_start(entries, |e| &e.start_date, true) {
        let span = escape_text(&date_span(&e.start_date, e.end_date.as_ref()));
        out.push_str(&format!("\\textit{{{span}}}: {}", escape_text(&e.role)));
        if let Some(dept) = &e.dept {
            out.push_str(&format!(" ({})", escape_text(dept)));
        }
        out.push_str(&format!(", {}\n\n", escape_text(&e.institution)));
    }
    out
}

/// Honors and awards, most recent first.
pub fn format_distinctions(entries: &[Distinction]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = section_header("Honors and Awards");
    for e in sorted_by_start(entries, |e| &e.start_date, true) {
        out.push_str(&format!(
            "\\textit{{{}}}: {}, {}\n\n",
            escape_text(e.start_date.as_str()),
            escape_text(&e.title),
            escape_text(&e.organization)
        ));
    }
    out
}

/// Service roles, most recent first.
pub fn format_service(entries: &[ServiceEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = section_header("Service");
    for e in sorted_by_start(entries, |e| &e.start_date, true) {
        out.push_str(&format!(
            "{}, {}, {}\n\n",
            escape_text(&e.role),
            escape_text(&e.organization),
            escape_text(&date_span(&e.start_date, e.end_date.as_ref()))
        ));
    }
    out
}

/// Research funding. Only grants ending in or after `current_year` are
/// listed; completed grants are counted but not rendered.
pub fn format_funding(entries: &[FundingEntry], current_year: i32) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let (active, completed): (Vec<&FundingEntry>, Vec<&FundingEntry>) =
        sorted_by_start(entries, |e| &e.start_date, true)
            .into_iter()
            .partition(|e| e.end_date.year() >= current_year);

    debug!(
        active = active.len(),
        completed = completed.len(),
        current_year,
        "completed grants are not rendered"
    );

    let mut out = section_header("Research funding");
    out.push_str("\n\\subsection*{Active:}\n");
    for e in active {
        out.push_str(&format!(
            "{}, {}, {}-{}\n\n",
            escape_text(&e.role),
            escape_text(&e.organization),
            escape_text(e.start_date.as_str()),
            escape_text(e.end_date.as_str())
        ));
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
        assert_eq!(format_education(&[]), "");
        assert_eq!(format_employment(&[]), "");
        assert_eq!(format_distinctions(&[]), "");
        assert_eq!(format_service(&[]), "");
        assert_eq!(format_funding(&[], 2024), "");
    }

    #[test]
    fn education_is_oldest_first() {
        let entries: Vec<EducationEntry> = records(vec![
            json!({"start_date": 1989, "end_date": 1993, "degree": "PhD", "institution": "University of Illinois", "city": "Urbana-Champaign, IL"}),
            json!({"start_date": 1985, "end_date": 1989, "degree": "BA", "institution": "Baylor University", "city": "Waco, TX"}),
        ]);
        let out = format_education(&entries);
        assert!(out.starts_with("\n\\section*{Education and training}\n\\noindent\n"));
        let ba = out.find("BA").unwrap();
        let phd = out.find("PhD").unwrap();
        assert!(ba < phd);
        assert!(out.contains("\\textit{1985-1989}: BA, Baylor University, Waco, TX\n\n"));
    }

    #[test]
    fn employment_omits_missing_dept_and_end() {
        let entries: Vec<EmploymentEntry> = records(vec![
            json!({"start_date": 2014, "role": "Professor", "dept": "Psychology", "institution": "Stanford University"}),
            json!({"start_date": 2009, "end_date": 2014, "role": "Professor", "institution": "UT Austin"}),
        ]);
        let out = format_employment(&entries);
        assert!(out.contains("\\textit{2014-}: Professor (Psychology), Stanford University\n\n"));
        assert!(out.contains("\\textit{2009-2014}: Professor, UT Austin\n\n"));
        assert!(out.find("Stanford").unwrap() < out.find("UT Austin").unwrap());
    }

    #[test]
    fn distinctions_escape_fields() {
        let entries: Vec<Distinction> = records(vec![json!({
            "start_date": 2020, "title": "Fellow", "organization": "Society for Research & Development"
        })]);
        let out = format_distinctions(&entries);
        assert!(out.contains("\\textit{2020}: Fellow, Society for Research \\& Development\n\n"));
    }

    #[test]
    fn service_is_most_recent_first() {
        let entries: Vec<ServiceEntry> = records(vec![
            json!({"role": "Member", "organization": "NIH Study Section", "start_date": 2010, "end_date": 2014}),
            json!({"role": "Chair", "organization": "OHBM Council", "start_date": "2018", "end_date": 2019}),
        ]);
        let out = format_service(&entries);
        assert!(out.find("OHBM").unwrap() < out.find("NIH").unwrap());
        assert!(out.contains("Chair, OHBM Council, 2018-2019\n\n"));
    }

    #[test]
    fn funding_renders_active_grants_only() {
        let entries: Vec<FundingEntry> = records(vec![
            json!({"role": "PI", "organization": "NIMH", "start_date": 2020, "end_date": 2026}),
            json!({"role": "Co-I", "organization": "NSF", "start_date": 2015, "end_date": 2019}),
            json!({"role": "PI", "organization": "NIDA", "start_date": 2022, "end_date": "2024"}),
        ]);
        let out = format_funding(&entries, 2024);
        assert!(out.starts_with("\n\\section*{Research funding}\n\\noindent\n\n\\subsection*{Active:}\n"));
        assert!(out.contains("PI, NIMH, 2020-2026\n\n"));
        assert!(out.contains("PI, NIDA, 2022-2024\n\n"));
        assert!(!out.contains("NSF"));
        assert!(out.find("NIDA").unwrap() < out.find("NIMH").unwrap());
    }

    #[test]
    fn funding_with_only_completed_grants_keeps_heading() {
        let entries: Vec<FundingEntry> = records(vec![json!({
            "role": "Co-I", "organization": "NSF", "start_date": 2015, "end_date": 2019
        })]);
        let out = format_funding(&entries, 2024);
        assert!(out.contains("\\subsection*{Active:}"));
        assert!(!out.contains("NSF"));
    }
}
