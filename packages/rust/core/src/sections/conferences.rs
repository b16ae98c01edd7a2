//! Conference presentations, grouped by year and newest month first.

use academiccv_latex::{escape_text, sentence, trim_location};
use academiccv_shared::ConferenceTalk;

use super::{distinct_years_desc, section_header};

/// Conference presentations grouped by year, latest month first within a year.
pub fn format_conferences(talks: &[ConferenceTalk]) -> String {
    if talks.is_empty() {
        return String::new();
    }

    let mut out = section_header("Conference Presentations");
    for year in distinct_years_desc(talks.iter().map(|t| t.date.year())) {
        let mut year_talks: Vec<&ConferenceTalk> =
            talks.iter().filter(|t| t.date.year() == year).collect();
        year_talks.sort_by(|a, b| b.monthnum.cmp(&a.monthnum));

        out.push_str(&format!("\\subsection*{{{year}}}"));
        for talk in year_talks {
            out.push_str(&format!(
                "\\textit{{{}}} {}, {}.\n\n",
                escape_text(&sentence(&talk.title)),
                escape_text(&trim_location(&talk.location)),
                escape_text(&talk.month)
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use academiccv_shared::{Document, parse_records};
    use serde_json::json;

    fn talks() -> Vec<ConferenceTalk> {
        let docs = vec![
            Document::new("c1", json!({"date": "2019-03-10", "month": "March", "monthnum": 3,
                "title": "Decoding cognitive states..", "location": "Boston, MA,"})),
            Document::new("c2", json!({"date": "2021-06-01", "month": "June", "monthnum": 6,
                "title": "Is fMRI reproducible?", "location": "Virtual."})),
            Document::new("c3", json!({"date": "2019-11-02", "month": "November", "monthnum": 11,
                "title": "Open science", "location": "Chicago, IL"})),
        ];
        parse_records(&docs).unwrap()
    }

    #[test]
    fn empty_renders_nothing() {
        assert_eq!(format_conferences(&[]), "");
    }

    #[test]
    fn groups_by_year_then_month_descending() {
        let out = format_conferences(&talks());
        assert!(out.starts_with("\n\\section*{Conference Presentations}\n\\noindent\n\\subsection*{2021}"));

        let y2021 = out.find("\\subsection*{2021}").unwrap();
        let y2019 = out.find("\\subsection*{2019}").unwrap();
        assert!(y2021 < y2019);

        let nov = out.find("Open science").unwrap();
        let mar = out.find("Decoding").unwrap();
        assert!(y2019 < nov && nov < mar);
    }

    #[test]
    fn title_and_location_punctuation() {
        let out = format_conferences(&talks());
        assert!(out.contains("\\textit{Decoding cognitive states.} Boston, MA, March.\n\n"));
        assert!(out.contains("\\textit{Is fMRI reproducible?} Virtual, June.\n\n"));
    }
}
