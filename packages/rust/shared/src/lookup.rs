//! Author-lookup seam used by coauthor enrichment.

use std::future::Future;

use crate::error::Result;

/// A current affiliation as reported by the author-lookup service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffiliationInfo {
    pub id: String,
    pub preferred_name: String,
    pub parent_preferred_name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl AffiliationInfo {
    /// `name, parent, city, country`; the parent is left out when unknown.
    pub fn display_line(&self) -> String {
        let mut parts = vec![self.preferred_name.as_str()];
        if let Some(parent) = &self.parent_preferred_name {
            parts.push(parent.as_str());
        }
        parts.push(self.city.as_deref().unwrap_or_default());
        parts.push(self.country.as_deref().unwrap_or_default());
        parts.join(", ")
    }
}

/// What the lookup service knows about one author id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthorProfile {
    /// Indexed name, e.g. `Poldrack R.A.`. `None` when the id did not resolve.
    pub indexed_name: Option<String>,
    /// Current affiliations, `None` when the service lists none.
    pub affiliations: Option<Vec<AffiliationInfo>>,
}

/// Resolves bibliographic author ids to profiles.
pub trait AuthorLookup {
    fn lookup(&self, author_id: &str) -> impl Future<Output = Result<AuthorProfile>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affiliation_line_with_parent() {
        let aff = AffiliationInfo {
            id: "60012708".into(),
            preferred_name: "Department of Psychology".into(),
            parent_preferred_name: Some("Stanford University".into()),
            city: Some("Stanford".into()),
            country: Some("United States".into()),
        };
        assert_eq!(
            aff.display_line(),
            "Department of Psychology, Stanford University, Stanford, United States"
        );
    }

    #[test]
    fn affiliation_line_without_parent() {
        let aff = AffiliationInfo {
            id: "1".into(),
            preferred_name: "UCLA".into(),
            parent_preferred_name: None,
            city: Some("Los Angeles".into()),
            country: Some("United States".into()),
        };
        assert_eq!(aff.display_line(), "UCLA, Los Angeles, United States");
    }
}
