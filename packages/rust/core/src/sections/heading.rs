//! Name and contact block at the top of the CV.

use academiccv_latex::{escape_text, href, strip_scheme};
use academiccv_shared::CvMetadata;

const ORCID_BASE: &str = "https://orcid.org/";

/// The name block and two-column contact header.
///
/// Contact lines are emitted only for the fields present in the metadata.
pub fn format_heading(meta: &CvMetadata) -> String {
    let mut out = String::new();
    out.push_str("\n\\reversemarginpar\n");
    out.push_str(&format!("{{\\LARGE {}}}\\\\[4mm]\n", escape_text(&meta.name)));
    out.push_str("\\vspace{-1cm}\n\n");
    out.push_str("\\begin{multicols}{2}\n");

    for line in &meta.address {
        out.push_str(&format!("{}\\\\\n", escape_text(line)));
    }

    out.push_str("\n\\columnbreak\n\n");

    if let Some(phone) = &meta.phone {
        out.push_str(&contact_line("Phone", &escape_text(phone)));
    }
    if let Some(email) = &meta.email {
        out.push_str(&contact_line("email", &escape_text(email)));
    }
    for url in [&meta.url, &meta.github].into_iter().flatten() {
        let label = escape_text(strip_scheme(url));
        out.push_str(&contact_line("url", &href(url, &label)));
    }
    if let Some(mastodon) = &meta.mastodon {
        out.push_str(&contact_line("Mastodon", &escape_text(mastodon)));
    }
    if let Some(orcid) = &meta.orcid {
        let id = escape_text(orcid);
        out.push_str(&contact_line("ORCID", &href(&format!("{ORCID_BASE}{orcid}"), &id)));
    }

    out.push_str("\\end{multicols}\n\n\\hrule\n");
    out
}

fn contact_line(label: &str, value: &str) -> String {
    format!("{label}: {value} \\\\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use academiccv_shared::{Document, parse_record};
    use serde_json::json;

    fn metadata(body: serde_json::Value) -> CvMetadata {
        parse_record(&Document::new("meta", body)).unwrap()
    }

    #[test]
    fn full_heading() {
        let meta = metadata(json!({
            "name": "Russell A. Poldrack",
            "address": ["Department of Psychology", "Stanford University"],
            "phone": "650-555-0100",
            "email": "poldrack@stanford.edu",
            "url": "https://poldracklab.org",
            "github": "https://github.com/poldrack",
            "mastodon": "@russpoldrack@fediscience.org",
            "orcid": "0000-0001-6755-0259"
        }));
        let out = format_heading(&meta);

        assert!(out.contains("{\\LARGE Russell A. Poldrack}\\\\[4mm]\n"));
        assert!(out.contains("Department of Psychology\\\\\nStanford University\\\\\n"));
        assert!(out.contains("Phone: 650-555-0100 \\\\\n"));
        assert!(out.contains("url: \\href{https://poldracklab.org}{poldracklab.org} \\\\\n"));
        assert!(out.contains("url: \\href{https://github.com/poldrack}{github.com/poldrack} \\\\\n"));
        assert!(out.contains(
            "ORCID: \\href{https://orcid.org/0000-0001-6755-0259}{0000-0001-6755-0259} \\\\\n"
        ));
        assert!(out.ends_with("\\end{multicols}\n\n\\hrule\n"));
    }

    #[test]
    fn absent_contacts_are_skipped() {
        let meta = metadata(json!({"name": "Jane Doe", "email": "jane@example.org"}));
        let out = format_heading(&meta);
        assert!(out.contains("email: jane@example.org \\\\\n"));
        assert!(!out.contains("Phone:"));
        assert!(!out.contains("ORCID:"));
        assert!(!out.contains("url:"));
    }
}
