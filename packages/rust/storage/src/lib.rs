//! Embedded libSQL record store.
//!
//! The [`Storage`] struct wraps a libSQL database holding schema-less JSON
//! documents grouped into named [`Collection`]s. Queries cover what the CV
//! pipeline needs: whole-collection reads in insertion order, sort by a
//! top-level field, and prefix/substring matches on a field.
//!
//! **Access rules:**
//! - `import` and `coauthors`: read-write via [`Storage::open`]
//! - `render` and `show`: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use academiccv_shared::{Collection, CollectionRecord, CvError, Document, Result, parse_records};
use libsql::{Connection, Database, params};

/// Sort direction for [`Storage::find_sorted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| CvError::io(parent, e))?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| CvError::Storage(e.to_string()))?;

        let conn = db.connect().map_err(|e| CvError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CvError::Storage(format!(
                "database not found at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| CvError::Storage(e.to_string()))?;

        let conn = db.connect().map_err(|e| CvError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    CvError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(CvError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// All documents of a collection, in insertion order.
    pub async fn find(&self, collection: Collection) -> Result<Vec<Document>> {
        let rows = self
            .conn
            .query(
                "SELECT id, body FROM records WHERE collection = ?1 ORDER BY seq",
                params![collection.as_str()],
            )
            .await
            .map_err(|e| CvError::Storage(e.to_string()))?;
        collect_documents(rows).await
    }

    /// All documents of a collection ordered by a top-level field.
    /// Ties keep insertion order.
    pub async fn find_sorted(
        &self,
        collection: Collection,
        field: &str,
        order: SortOrder,
    ) -> Result<Vec<Document>> {
        let path = json_path(field)?;
        let sql = match order {
            SortOrder::Ascending => {
                "SELECT id, body FROM records WHERE collection = ?1
                 ORDER BY json_extract(body, ?2) ASC, seq"
            }
            SortOrder::Descending => {
                "SELECT id, body FROM records WHERE collection = ?1
                 ORDER BY json_extract(body, ?2) DESC, seq"
            }
        };
        let rows = self
            .conn
            .query(sql, params![collection.as_str(), path.as_str()])
            .await
            .map_err(|e| CvError::Storage(e.to_string()))?;
        collect_documents(rows).await
    }

    /// Documents whose `field`, read as text, starts with `prefix`.
    pub async fn find_prefix(
        &self,
        collection: Collection,
        field: &str,
        prefix: &str,
    ) -> Result<Vec<Document>> {
        let path = json_path(field)?;
        let rows = self
            .conn
            .query(
                "SELECT id, body FROM records
                 WHERE collection = ?1
                   AND substr(CAST(json_extract(body, ?2) AS TEXT), 1, length(?3)) = ?3
                 ORDER BY seq",
                params![collection.as_str(), path.as_str(), prefix],
            )
            .await
            .map_err(|e| CvError::Storage(e.to_string()))?;
        collect_documents(rows).await
    }

    /// Documents whose `field`, read as text, contains `needle`.
    pub async fn find_contains(
        &self,
        collection: Collection,
        field: &str,
        needle: &str,
    ) -> Result<Vec<Document>> {
        let path = json_path(field)?;
        let rows = self
            .conn
            .query(
                "SELECT id, body FROM records
                 WHERE collection = ?1
                   AND instr(CAST(json_extract(body, ?2) AS TEXT), ?3) > 0
                 ORDER BY seq",
                params![collection.as_str(), path.as_str(), needle],
            )
            .await
            .map_err(|e| CvError::Storage(e.to_string()))?;
        collect_documents(rows).await
    }

    /// Load a whole collection as typed records.
    pub async fn load<T: CollectionRecord>(&self) -> Result<Vec<T>> {
        let docs = self.find(T::COLLECTION).await?;
        parse_records(&docs)
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: Collection) -> Result<usize> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM records WHERE collection = ?1",
                params![collection.as_str()],
            )
            .await
            .map_err(|e| CvError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let n: i64 = row.get(0).map_err(|e| CvError::Storage(e.to_string()))?;
                Ok(n as usize)
            }
            Ok(None) => Ok(0),
            Err(e) => Err(CvError::Storage(e.to_string())),
        }
    }

    /// Non-empty collections with their document counts, by name.
    pub async fn list_collections(&self) -> Result<Vec<(String, usize)>> {
        let mut rows = self
            .conn
            .query(
                "SELECT collection, COUNT(*) FROM records GROUP BY collection ORDER BY collection",
                params![],
            )
            .await
            .map_err(|e| CvError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let name: String = row.get(0).map_err(|e| CvError::Storage(e.to_string()))?;
            let n: i64 = row.get(1).map_err(|e| CvError::Storage(e.to_string()))?;
            results.push((name, n as usize));
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert one document. Fails if the id already exists in the collection.
    pub async fn insert(&self, collection: Collection, doc: &Document) -> Result<()> {
        self.check_writable()?;
        let body = encode_body(doc)?;
        self.conn
            .execute(
                "INSERT INTO records (collection, id, body) VALUES (?1, ?2, ?3)",
                params![collection.as_str(), doc.id.as_str(), body.as_str()],
            )
            .await
            .map_err(|e| {
                CvError::Storage(format!("insert {collection}/{} failed: {e}", doc.id))
            })?;
        Ok(())
    }

    /// Insert many documents in one transaction.
    pub async fn insert_many(&self, collection: Collection, docs: &[Document]) -> Result<usize> {
        self.check_writable()?;
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| CvError::Storage(e.to_string()))?;

        insert_docs(&tx, collection, docs).await?;

        tx.commit()
            .await
            .map_err(|e| CvError::Storage(e.to_string()))?;
        Ok(docs.len())
    }

    /// Write several collections in one transaction, optionally emptying
    /// every collection first. Nothing is kept if any insert fails.
    pub async fn write_collections(
        &self,
        batches: &[(Collection, Vec<Document>)],
        wipe: bool,
    ) -> Result<usize> {
        self.check_writable()?;
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| CvError::Storage(e.to_string()))?;

        if wipe {
            tx.execute("DELETE FROM records", params![])
                .await
                .map_err(|e| CvError::Storage(e.to_string()))?;
        }

        let mut written = 0;
        for (collection, docs) in batches {
            insert_docs(&tx, *collection, docs).await?;
            written += docs.len();
        }

        tx.commit()
            .await
            .map_err(|e| CvError::Storage(e.to_string()))?;
        tracing::debug!(collections = batches.len(), written, wipe, "wrote collections");
        Ok(written)
    }

    /// Delete every document of a collection. Returns the number removed.
    pub async fn drop_collection(&self, collection: Collection) -> Result<u64> {
        self.check_writable()?;
        let removed = self
            .conn
            .execute(
                "DELETE FROM records WHERE collection = ?1",
                params![collection.as_str()],
            )
            .await
            .map_err(|e| CvError::Storage(e.to_string()))?;
        tracing::debug!(%collection, removed, "dropped collection");
        Ok(removed)
    }

    /// Drop a collection and write `docs` in its place, in one transaction.
    pub async fn replace_collection(
        &self,
        collection: Collection,
        docs: &[Document],
    ) -> Result<usize> {
        self.check_writable()?;
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| CvError::Storage(e.to_string()))?;

        tx.execute(
            "DELETE FROM records WHERE collection = ?1",
            params![collection.as_str()],
        )
        .await
        .map_err(|e| CvError::Storage(e.to_string()))?;

        insert_docs(&tx, collection, docs).await?;

        tx.commit()
            .await
            .map_err(|e| CvError::Storage(e.to_string()))?;
        tracing::debug!(%collection, count = docs.len(), "replaced collection");
        Ok(docs.len())
    }
}

/// Build a JSON path for a top-level field, rejecting anything but
/// identifier characters.
fn json_path(field: &str) -> Result<String> {
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CvError::validation(format!("invalid field name '{field}'")));
    }
    Ok(format!("$.{field}"))
}

async fn insert_docs(
    tx: &libsql::Transaction,
    collection: Collection,
    docs: &[Document],
) -> Result<()> {
    for doc in docs {
        let body = encode_body(doc)?;
        tx.execute(
            "INSERT INTO records (collection, id, body) VALUES (?1, ?2, ?3)",
            params![collection.as_str(), doc.id.as_str(), body.as_str()],
        )
        .await
        .map_err(|e| CvError::Storage(format!("insert {collection}/{} failed: {e}", doc.id)))?;
    }
    Ok(())
}

fn encode_body(doc: &Document) -> Result<String> {
    serde_json::to_string(&doc.body)
        .map_err(|e| CvError::Conversion(format!("document {}: {e}", doc.id)))
}

/// Drain `(id, body)` rows into documents.
async fn collect_documents(mut rows: libsql::Rows) -> Result<Vec<Document>> {
    let mut results = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| CvError::Storage(e.to_string()))?
    {
        let id: String = row.get(0).map_err(|e| CvError::Storage(e.to_string()))?;
        let body: String = row.get(1).map_err(|e| CvError::Storage(e.to_string()))?;
        let body = serde_json::from_str(&body)
            .map_err(|e| CvError::Storage(format!("corrupt document {id}: {e}")))?;
        results.push(Document { id, body });
    }
    Ok(results)
}
