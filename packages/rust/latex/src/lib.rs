//! LaTeX output helpers for academiccv.
//!
//! Record fields are plain text; before they are interpolated into LaTeX
//! every field goes through exactly one of:
//! - [`escape_text`] for free text (names, titles, journals, places)
//! - [`escape_url`] for link targets inside `\href{...}`
//!
//! Neither transform is idempotent, so callers escape each field once.

mod cleanup;

pub use cleanup::{clean_title, sentence, trim_location};

/// Escape every character that is structurally significant in LaTeX text mode.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Escape a URL for the first argument of `\href`, where hyperref reads the
/// text verbatim except for `%` and `#`.
pub fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        if c == '%' || c == '#' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `\href{url}{label}`. The label is inserted as given.
pub fn href(url: &str, label: &str) -> String {
    format!("\\href{{{}}}{{{label}}}", escape_url(url))
}

/// The part of a URL after `//`, used as link text for personal pages.
pub fn strip_scheme(url: &str) -> &str {
    url.split_once("//").map_or(url, |(_, rest)| rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_special_characters() {
        assert_eq!(escape_text("R&D 100% $5 #1 a_b"), r"R\&D 100\% \$5 \#1 a\_b");
        assert_eq!(escape_text("{x}"), r"\{x\}");
        assert_eq!(escape_text(r"a\b"), r"a\textbackslash{}b");
        assert_eq!(escape_text("~^"), r"\textasciitilde{}\textasciicircum{}");
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(escape_text("Poldrack R.A."), "Poldrack R.A.");
        assert_eq!(escape_text("Müller-Lyer"), "Müller-Lyer");
    }

    #[test]
    fn escaping_is_not_idempotent() {
        let once = escape_text("a_b");
        assert_ne!(escape_text(&once), once);
    }

    #[test]
    fn url_escaping_only_touches_percent_and_hash() {
        assert_eq!(
            escape_url("https://osf.io/abc_d/?q=1%20#top"),
            r"https://osf.io/abc_d/?q=1\%20\#top"
        );
    }

    #[test]
    fn href_formatting() {
        assert_eq!(
            href("https://doi.org/10.1000/xyz", "DOI"),
            r"\href{https://doi.org/10.1000/xyz}{DOI}"
        );
    }

    #[test]
    fn scheme_stripping() {
        assert_eq!(strip_scheme("https://poldracklab.org"), "poldracklab.org");
        assert_eq!(strip_scheme("github.com/poldrack"), "github.com/poldrack");
    }
}
