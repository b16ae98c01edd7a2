//! Author Retrieval response parser.
//!
//! Only the fields coauthor enrichment needs are modelled:
//! - `author-profile.preferred-name.indexed-name`
//! - `author-profile.affiliation-current.affiliation[]` with its `ip-doc`
//!
//! The API returns a bare object where a list has one element and wraps
//! some text values as `{"$": "..."}`, so both shapes are accepted.

use academiccv_shared::{AffiliationInfo, AuthorProfile, CvError, Result};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    // Tried first: derived structs also accept sequences.
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextNode {
    Plain(String),
    Wrapped {
        #[serde(rename = "$")]
        value: String,
    },
}

impl TextNode {
    fn into_string(self) -> String {
        match self {
            Self::Plain(s) => s,
            Self::Wrapped { value } => value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RetrievalEnvelope {
    #[serde(rename = "author-retrieval-response")]
    response: Option<OneOrMany<AuthorEntry>>,
}

#[derive(Debug, Deserialize)]
struct AuthorEntry {
    #[serde(rename = "author-profile")]
    profile: Option<ProfileNode>,
}

#[derive(Debug, Deserialize)]
struct ProfileNode {
    #[serde(rename = "preferred-name")]
    preferred_name: Option<PreferredName>,
    #[serde(rename = "affiliation-current")]
    affiliation_current: Option<AffiliationCurrent>,
}

#[derive(Debug, Deserialize)]
struct PreferredName {
    #[serde(rename = "indexed-name")]
    indexed_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AffiliationCurrent {
    affiliation: Option<OneOrMany<AffiliationNode>>,
}

#[derive(Debug, Deserialize)]
struct AffiliationNode {
    #[serde(rename = "@affiliation-id")]
    affiliation_id: Option<String>,
    #[serde(rename = "ip-doc")]
    ip_doc: Option<IpDoc>,
}

#[derive(Debug, Deserialize)]
struct IpDoc {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "preferred-name")]
    preferred_name: Option<TextNode>,
    #[serde(rename = "parent-preferred-name")]
    parent_preferred_name: Option<TextNode>,
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    city: Option<String>,
    country: Option<String>,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse an Author Retrieval JSON body into an [`AuthorProfile`].
pub(crate) fn parse_author_response(body: &str) -> Result<AuthorProfile> {
    let envelope: RetrievalEnvelope = serde_json::from_str(body)
        .map_err(|e| CvError::Conversion(format!("invalid author retrieval response: {e}")))?;

    let Some(profile) = envelope
        .response
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .into_iter()
        .find_map(|entry| entry.profile)
    else {
        return Ok(AuthorProfile::default());
    };

    let indexed_name = profile
        .preferred_name
        .and_then(|n| n.indexed_name)
        .filter(|n| !n.trim().is_empty());

    let affiliations = profile
        .affiliation_current
        .and_then(|c| c.affiliation)
        .map(|a| a.into_vec().into_iter().filter_map(to_affiliation).collect::<Vec<_>>())
        .filter(|list| !list.is_empty());

    Ok(AuthorProfile {
        indexed_name,
        affiliations,
    })
}

fn to_affiliation(node: AffiliationNode) -> Option<AffiliationInfo> {
    let doc = node.ip_doc?;
    let preferred_name = doc.preferred_name?.into_string();
    let id = doc.id.or(node.affiliation_id).unwrap_or_default();
    let (city, country) = match doc.address {
        Some(addr) => (addr.city, addr.country),
        None => (None, None),
    };

    Some(AffiliationInfo {
        id,
        preferred_name,
        parent_preferred_name: doc.parent_preferred_name.map(TextNode::into_string),
        city,
        country,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_affiliation_object() {
        let body = r#"{
          "author-retrieval-response": [{
            "author-profile": {
              "preferred-name": {"indexed-name": "Gorgolewski K.J."},
              "affiliation-current": {
                "affiliation": {
                  "@affiliation-id": "60012708",
                  "ip-doc": {
                    "@id": "60012708",
                    "preferred-name": {"$": "Stanford University"},
                    "address": {"city": "Palo Alto", "country": "United States"}
                  }
                }
              }
            }
          }]
        }"#;

        let profile = parse_author_response(body).unwrap();
        assert_eq!(profile.indexed_name.as_deref(), Some("Gorgolewski K.J."));
        let affs = profile.affiliations.unwrap();
        assert_eq!(affs.len(), 1);
        assert_eq!(affs[0].id, "60012708");
        assert_eq!(affs[0].display_line(), "Stanford University, Palo Alto, United States");
    }

    #[test]
    fn parses_affiliation_list_with_parent() {
        let body = r#"{
          "author-retrieval-response": {
            "author-profile": {
              "preferred-name": {"indexed-name": "Mumford J.A."},
              "affiliation-current": {
                "affiliation": [
                  {"ip-doc": {"@id": "1", "preferred-name": "Department of Psychology",
                              "parent-preferred-name": {"$": "Stanford University"},
                              "address": {"city": "Stanford", "country": "United States"}}},
                  {"ip-doc": {"@id": "2", "preferred-name": {"$": "Wu Tsai Institute"}}}
                ]
              }
            }
          }
        }"#;

        let profile = parse_author_response(body).unwrap();
        let affs = profile.affiliations.unwrap();
        assert_eq!(affs.len(), 2);
        assert_eq!(
            affs[0].display_line(),
            "Department of Psychology, Stanford University, Stanford, United States"
        );
        assert_eq!(affs[1].parent_preferred_name, None);
    }

    #[test]
    fn missing_name_and_affiliation() {
        let body = r#"{"author-retrieval-response": [{"author-profile": {}}]}"#;
        let profile = parse_author_response(body).unwrap();
        assert_eq!(profile, AuthorProfile::default());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_author_response("<html>").is_err());
    }
}
