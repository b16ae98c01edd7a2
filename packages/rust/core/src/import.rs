//! Bulk import of CV records from a JSON dump.
//!
//! A dump is one JSON object mapping collection names to arrays of
//! documents. The whole dump is validated against the typed records before
//! anything is written, so a bad record never leaves a half-imported store.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use academiccv_shared::{Collection, CvError, Document, Result};
use academiccv_storage::Storage;

/// Documents written per collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub counts: BTreeMap<Collection, usize>,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Read and parse a dump file.
pub fn read_dump(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| CvError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| CvError::Conversion(format!("{}: {e}", path.display())))
}

/// Validate and write every collection in `dump`.
///
/// With `overwrite`, every known collection is emptied first. Without it,
/// documents are added to what is already stored and an id clash fails.
/// Either way the store is left untouched on failure.
#[instrument(skip_all, fields(overwrite = overwrite))]
pub async fn import_collections(
    storage: &Storage,
    dump: &Value,
    overwrite: bool,
) -> Result<ImportSummary> {
    let batches: Vec<(Collection, Vec<Document>)> = prepare(dump)?.into_iter().collect();

    // One transaction for the wipe and every collection.
    storage.write_collections(&batches, overwrite).await?;

    let summary = ImportSummary {
        counts: batches.iter().map(|(c, docs)| (*c, docs.len())).collect(),
    };

    info!(
        collections = summary.counts.len(),
        documents = summary.total(),
        "import complete"
    );
    Ok(summary)
}

/// Turn the dump into validated documents, grouped by collection.
fn prepare(dump: &Value) -> Result<BTreeMap<Collection, Vec<Document>>> {
    let object = dump
        .as_object()
        .ok_or_else(|| CvError::validation("dump must be a JSON object of collections"))?;

    let mut batches = BTreeMap::new();
    for (name, entries) in object {
        let collection: Collection = name.parse()?;
        let items = entries.as_array().ok_or_else(|| {
            CvError::validation(format!("collection '{name}' must be an array of documents"))
        })?;

        let mut seen = HashSet::new();
        let mut docs = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let doc = to_document(collection, index, item)?;
            if !seen.insert(doc.id.clone()) {
                return Err(CvError::record(
                    collection.as_str(),
                    doc.id.as_str(),
                    "duplicate document id",
                ));
            }
            collection.validate_document(&doc)?;
            docs.push(doc);
        }
        batches.insert(collection, docs);
    }
    Ok(batches)
}

/// Split an entry into its id and body. Ids come from `_id` (plain or
/// `{"$oid": ...}`) or `id`; entries without one get a fresh UUID.
fn to_document(collection: Collection, index: usize, item: &Value) -> Result<Document> {
    let mut body = item
        .as_object()
        .cloned()
        .ok_or_else(|| CvError::record(collection.as_str(), format!("#{index}"), "not a JSON object"))?;

    let id = match body.remove("_id") {
        Some(Value::String(s)) => Some(s),
        Some(Value::Object(o)) => o.get("$oid").and_then(Value::as_str).map(str::to_string),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
    .or_else(|| body.get("id").and_then(Value::as_str).map(str::to_string))
    .unwrap_or_else(|| Uuid::now_v7().to_string());

    Ok(Document::new(id, Value::Object(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("acv_import_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.unwrap()
    }

    #[tokio::test]
    async fn imports_fixture() {
        let raw = std::fs::read_to_string("../../../fixtures/json/cv.fixture.json").unwrap();
        let dump: Value = serde_json::from_str(&raw).unwrap();
        let storage = test_storage().await;

        let summary = import_collections(&storage, &dump, false).await.unwrap();
        assert_eq!(summary.counts.get(&Collection::Metadata), Some(&1));
        assert!(summary.total() > 10);
        assert_eq!(
            storage.count(Collection::Publications).await.unwrap(),
            summary.counts[&Collection::Publications]
        );
    }

    #[tokio::test]
    async fn ids_come_from_dump_or_are_generated() {
        let storage = test_storage().await;
        let dump = json!({
            "talks": [
                {"_id": {"$oid": "64b7f0"}, "year": 2019, "place": "MIT"},
                {"id": "talk-2", "year": 2020, "place": "Yale"},
                {"year": 2021, "place": "Oxford"}
            ]
        });
        import_collections(&storage, &dump, false).await.unwrap();

        let docs = storage.find(Collection::Talks).await.unwrap();
        assert_eq!(docs[0].id, "64b7f0");
        assert!(docs[0].body.get("_id").is_none());
        assert_eq!(docs[1].id, "talk-2");
        assert!(Uuid::parse_str(&docs[2].id).is_ok());
    }

    #[tokio::test]
    async fn unknown_collection_writes_nothing() {
        let storage = test_storage().await;
        let dump = json!({
            "talks": [{"year": 2019, "place": "MIT"}],
            "grants": [{"title": "R01"}]
        });
        let err = import_collections(&storage, &dump, false).await.unwrap_err();
        assert!(err.to_string().contains("unknown collection 'grants'"));
        assert_eq!(storage.count(Collection::Talks).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_date_names_the_record() {
        let storage = test_storage().await;
        let dump = json!({
            "conferences": [
                {"_id": "conf-9", "date": "TBD", "month": "May", "monthnum": 5,
                 "title": "Talk", "location": "Boston"}
            ]
        });
        let err = import_collections(&storage, &dump, false).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("conferences"), "{msg}");
        assert!(msg.contains("conf-9"), "{msg}");
        assert_eq!(storage.count(Collection::Conferences).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let storage = test_storage().await;
        let dump = json!({
            "talks": [
                {"_id": "t", "year": 2019, "place": "MIT"},
                {"_id": "t", "year": 2020, "place": "Yale"}
            ]
        });
        let err = import_collections(&storage, &dump, false).await.unwrap_err();
        assert!(err.to_string().contains("duplicate document id"));
    }

    #[tokio::test]
    async fn id_clash_in_a_later_collection_writes_nothing() {
        let storage = test_storage().await;
        let first = json!({"talks": [{"_id": "t1", "year": 2019, "place": "MIT"}]});
        import_collections(&storage, &first, false).await.unwrap();

        let dump = json!({
            "education": [{"_id": "e1", "start_date": 2001, "degree": "BA", "institution": "X"}],
            "talks": [{"_id": "t1", "year": 2020, "place": "Yale"}]
        });
        let err = import_collections(&storage, &dump, false).await.unwrap_err();
        assert!(err.to_string().contains("talks/t1"), "{err}");
        assert_eq!(storage.count(Collection::Education).await.unwrap(), 0);

        let docs = storage.find(Collection::Talks).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].body["place"], "MIT");
    }

    #[tokio::test]
    async fn overwrite_replaces_existing_records() {
        let storage = test_storage().await;
        let first = json!({"talks": [{"_id": "t1", "year": 2019, "place": "MIT"}]});
        import_collections(&storage, &first, false).await.unwrap();

        // Same id again without overwrite clashes.
        assert!(import_collections(&storage, &first, false).await.is_err());

        let second = json!({"talks": [{"_id": "t1", "year": 2020, "place": "Yale"}]});
        import_collections(&storage, &second, true).await.unwrap();
        let docs = storage.find(Collection::Talks).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].body["place"], "Yale");
    }

    #[test]
    fn dump_must_be_an_object() {
        assert!(prepare(&json!([1, 2])).is_err());
        assert!(prepare(&json!({"talks": {"year": 2019}})).is_err());
    }
}
