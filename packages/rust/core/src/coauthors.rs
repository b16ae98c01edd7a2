//! Coauthor enrichment.
//!
//! Collects every Scopus coauthor id from the publications, keeps the most
//! recent shared year per id, resolves each id once through an
//! [`AuthorLookup`], and replaces the `coauthors` collection with the
//! resolved records sorted by id.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, info, instrument};

use academiccv_shared::{
    AuthorLookup, CoauthorRecord, Collection, CvError, Document, Publication, Result,
};
use academiccv_storage::Storage;

use crate::pipeline::ProgressReporter;

/// Counts from one enrichment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoauthorSummary {
    pub publications: usize,
    pub unique_ids: usize,
    pub resolved: usize,
    pub unresolved: usize,
}

/// Most recent shared year per coauthor id, ordered by id.
pub fn latest_years(publications: &[Publication]) -> BTreeMap<String, i32> {
    let mut years: BTreeMap<String, i32> = BTreeMap::new();
    for p in publications {
        let year = p.year();
        for id in &p.scopus_coauthor_ids {
            let id = id.trim();
            if id.is_empty() {
                continue;
            }
            years
                .entry(id.to_string())
                .and_modify(|y| *y = (*y).max(year))
                .or_insert(year);
        }
    }
    years
}

/// Resolve every unique coauthor id. Ids without an indexed name produce
/// no record.
pub async fn collect_coauthors<L: AuthorLookup>(
    publications: &[Publication],
    lookup: &L,
    progress: &dyn ProgressReporter,
) -> Result<Vec<CoauthorRecord>> {
    let years = latest_years(publications);
    let total = years.len();
    let mut records = Vec::with_capacity(total);

    for (i, (id, year)) in years.into_iter().enumerate() {
        progress.item(i + 1, total, &id);
        let profile = lookup.lookup(&id).await?;

        let Some(name) = profile.indexed_name else {
            debug!(scopus_id = %id, "no name for coauthor id, skipping");
            continue;
        };

        let (affiliation, affiliation_id) = match profile.affiliations {
            Some(affs) => (
                Some(affs.iter().map(|a| a.display_line()).collect()),
                Some(affs.into_iter().map(|a| a.id).collect()),
            ),
            None => (None, None),
        };

        records.push(CoauthorRecord {
            scopus_id: id,
            name,
            affiliation,
            affiliation_id,
            year,
        });
    }

    Ok(records)
}

/// Regenerate the `coauthors` collection from the stored publications.
#[instrument(skip_all)]
pub async fn enrich_coauthors<L: AuthorLookup>(
    storage: &Storage,
    lookup: &L,
    progress: &dyn ProgressReporter,
) -> Result<CoauthorSummary> {
    let start = Instant::now();

    progress.phase("Loading publications");
    let publications: Vec<Publication> = storage.load().await?;
    let unique_ids = latest_years(&publications).len();
    info!(publications = publications.len(), unique_ids, "collecting coauthors");

    progress.phase("Looking up coauthors");
    let records = collect_coauthors(&publications, lookup, progress).await?;

    progress.phase("Writing coauthors");
    let docs = records
        .iter()
        .map(|r| {
            serde_json::to_value(r)
                .map(|body| Document::new(r.scopus_id.clone(), body))
                .map_err(|e| CvError::Conversion(format!("coauthor {}: {e}", r.scopus_id)))
        })
        .collect::<Result<Vec<_>>>()?;
    storage.replace_collection(Collection::Coauthors, &docs).await?;

    let summary = CoauthorSummary {
        publications: publications.len(),
        unique_ids,
        resolved: records.len(),
        unresolved: unique_ids - records.len(),
    };

    info!(
        resolved = summary.resolved,
        unresolved = summary.unresolved,
        elapsed_ms = start.elapsed().as_millis(),
        "coauthor enrichment complete"
    );
    progress.finish(&format!("{} coauthors written", summary.resolved));

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SilentProgress;
    use academiccv_shared::{AffiliationInfo, AuthorProfile, parse_records};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// In-memory lookup that records every id it is asked for.
    #[derive(Default)]
    struct FakeLookup {
        profiles: HashMap<String, AuthorProfile>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeLookup {
        fn with(mut self, id: &str, name: &str, affs: Option<Vec<AffiliationInfo>>) -> Self {
            self.profiles.insert(
                id.to_string(),
                AuthorProfile {
                    indexed_name: Some(name.to_string()),
                    affiliations: affs,
                },
            );
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AuthorLookup for FakeLookup {
        async fn lookup(&self, author_id: &str) -> Result<AuthorProfile> {
            self.calls.lock().unwrap().push(author_id.to_string());
            Ok(self.profiles.get(author_id).cloned().unwrap_or_default())
        }
    }

    /// Always fails, like an exhausted API quota.
    struct FailingLookup;

    impl AuthorLookup for FailingLookup {
        async fn lookup(&self, _author_id: &str) -> Result<AuthorProfile> {
            Err(CvError::Network("HTTP 429 Too Many Requests".into()))
        }
    }

    fn stanford() -> AffiliationInfo {
        AffiliationInfo {
            id: "60012708".into(),
            preferred_name: "Department of Psychology".into(),
            parent_preferred_name: Some("Stanford University".into()),
            city: Some("Stanford".into()),
            country: Some("United States".into()),
        }
    }

    fn publication_docs() -> Vec<Document> {
        let base = |eid: &str, date: &str, ids: serde_json::Value| {
            json!({
                "eid": eid, "title": "Study", "subtypeDescription": "Article",
                "aggregationType": "Journal", "coverDate": date,
                "scopus_coauthor_ids": ids
            })
        };
        vec![
            Document::new("p1", base("e1", "2018-02-01", json!(["X", "Y"]))),
            Document::new("p2", base("e2", "2021-07-01", json!(["X", "Z"]))),
            Document::new("p3", base("e3", "2019-01-01", json!(["Z"]))),
        ]
    }

    fn publications() -> Vec<Publication> {
        parse_records(&publication_docs()).unwrap()
    }

    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("acv_coauthors_{}.db", Uuid::now_v7()));
        let storage = Storage::open(&tmp).await.unwrap();
        storage
            .insert_many(Collection::Publications, &publication_docs())
            .await
            .unwrap();
        storage
    }

    #[test]
    fn latest_year_wins() {
        let years = latest_years(&publications());
        assert_eq!(years.get("X"), Some(&2021));
        assert_eq!(years.get("Y"), Some(&2018));
        assert_eq!(years.get("Z"), Some(&2021));
    }

    #[tokio::test]
    async fn each_id_is_looked_up_once_and_unnamed_ids_are_dropped() {
        let lookup = FakeLookup::default()
            .with("X", "Gorgolewski K.J.", Some(vec![stanford()]))
            .with("Z", "Mumford J.A.", None);

        let records = collect_coauthors(&publications(), &lookup, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(lookup.calls(), vec!["X", "Y", "Z"]);
        let ids: Vec<_> = records.iter().map(|r| r.scopus_id.as_str()).collect();
        assert_eq!(ids, vec!["X", "Z"]);

        let x = &records[0];
        assert_eq!(x.year, 2021);
        assert_eq!(
            x.affiliation.as_deref(),
            Some(&["Department of Psychology, Stanford University, Stanford, United States".to_string()][..])
        );
        assert_eq!(x.affiliation_id.as_deref(), Some(&["60012708".to_string()][..]));

        assert_eq!(records[1].affiliation, None);
        assert_eq!(records[1].affiliation_id, None);
    }

    #[tokio::test]
    async fn enrichment_replaces_collection_and_is_idempotent() {
        let storage = test_storage().await;
        storage
            .insert(
                Collection::Coauthors,
                &Document::new("stale", json!({"scopus_id": "stale", "name": "Old", "affiliation": null, "affiliation_id": null, "year": 2000})),
            )
            .await
            .unwrap();

        let lookup = FakeLookup::default()
            .with("X", "Gorgolewski K.J.", Some(vec![stanford()]))
            .with("Z", "Mumford J.A.", None);

        let summary = enrich_coauthors(&storage, &lookup, &SilentProgress).await.unwrap();
        assert_eq!(
            summary,
            CoauthorSummary {
                publications: 3,
                unique_ids: 3,
                resolved: 2,
                unresolved: 1
            }
        );

        let first = storage.find(Collection::Coauthors).await.unwrap();
        let ids: Vec<_> = first.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["X", "Z"]);

        enrich_coauthors(&storage, &lookup, &SilentProgress).await.unwrap();
        let second = storage.find(Collection::Coauthors).await.unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );

        let typed: Vec<CoauthorRecord> = storage.load().await.unwrap();
        assert_eq!(typed[0].name, "Gorgolewski K.J.");
    }

    #[tokio::test]
    async fn lookup_failure_leaves_collection_untouched() {
        let storage = test_storage().await;
        let lookup = FakeLookup::default().with("X", "Gorgolewski K.J.", None);
        enrich_coauthors(&storage, &lookup, &SilentProgress).await.unwrap();

        let err = enrich_coauthors(&storage, &FailingLookup, &SilentProgress)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("429"));
        assert_eq!(storage.count(Collection::Coauthors).await.unwrap(), 1);
    }
}
