//! Versioned store operations.
//!
//! A store is a named container of GET responses scoped to one deployment
//! version. Entries have no expiry; they live until overwritten or until
//! their store is deleted.

use std::collections::BTreeSet;

use super::connection::CacheDb;
use crate::{Error, Method, RequestKey, Response};
use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Entry counts for one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub version: String,
    pub entries: u64,
    pub created_at: String,
}

/// Handle scoped to a single store version.
///
/// Holding a handle keeps nothing alive: if the store is deleted, reads
/// miss and writes fail with a storage error.
#[derive(Clone, Debug)]
pub struct StoreHandle {
    db: CacheDb,
    version: String,
}

impl CacheDb {
    /// Open the store for `version`, creating it when absent.
    pub async fn open_store(&self, version: &str) -> Result<StoreHandle, Error> {
        let v = version.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (version, created_at) VALUES (?1, ?2)",
                    params![v, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(self.store(version))
    }

    /// Handle to `version` without creating it.
    pub fn store(&self, version: &str) -> StoreHandle {
        StoreHandle { db: self.clone(), version: version.to_string() }
    }

    /// Create `version` and write every entry in one transaction.
    ///
    /// Either the store exists afterwards with all entries, or nothing changed.
    pub async fn populate_store(
        &self, version: &str, entries: Vec<(RequestKey, Response)>,
    ) -> Result<StoreHandle, Error> {
        for (key, response) in &entries {
            check_cacheable(key, response)?;
        }

        let v = version.to_string();
        let rows = entries
            .into_iter()
            .map(|(key, response)| EntryRow::encode(&key, &response))
            .collect::<Result<Vec<_>, _>>()?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let now = chrono::Utc::now().to_rfc3339();
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO stores (version, created_at) VALUES (?1, ?2)",
                    params![v, now],
                )?;
                for row in &rows {
                    row.upsert(&tx, &v, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(self.store(version))
    }

    /// Every store version currently on disk.
    pub async fn list_versions(&self) -> Result<BTreeSet<String>, Error> {
        self.conn
            .call(|conn| -> Result<BTreeSet<String>, Error> {
                let mut stmt = conn.prepare("SELECT version FROM stores")?;
                let versions = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<BTreeSet<_>, _>>()?;
                Ok(versions)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and all of its entries. Returns false if it did not exist.
    pub async fn delete_store(&self, version: &str) -> Result<bool, Error> {
        let v = version.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM stores WHERE version = ?1", params![v])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Entry counts per store, oldest store first.
    pub async fn store_summaries(&self) -> Result<Vec<StoreSummary>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<StoreSummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT s.version, s.created_at, COUNT(e.key_hash)
                     FROM stores s LEFT JOIN entries e ON e.version = s.version
                     GROUP BY s.version
                     ORDER BY s.created_at, s.version",
                )?;
                let summaries = stmt
                    .query_map([], |row| {
                        Ok(StoreSummary {
                            version: row.get(0)?,
                            created_at: row.get(1)?,
                            entries: row.get::<_, i64>(2)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(summaries)
            })
            .await
            .map_err(Error::from)
    }
}

impl StoreHandle {
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Look up a stored response. No side effects.
    pub async fn get(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        let v = self.version.clone();
        let hash = key.hash();
        let row = self
            .db
            .conn
            .call(move |conn| -> Result<Option<(u16, String, Vec<u8>)>, Error> {
                let result = conn.query_row(
                    "SELECT status, headers_json, body FROM entries WHERE version = ?1 AND key_hash = ?2",
                    params![v, hash],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(|(status, headers_json, body)| {
            let headers: Vec<(String, String)> =
                serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
            Ok(Response { status, headers, body: Bytes::from(body) })
        })
        .transpose()
    }

    /// Store `response` under `key`, replacing any previous entry.
    ///
    /// Only GET keys with 2xx responses are accepted. The store must exist.
    pub async fn put(&self, key: &RequestKey, response: &Response) -> Result<(), Error> {
        check_cacheable(key, response)?;
        let row = EntryRow::encode(key, response)?;
        let v = self.version.clone();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let now = chrono::Utc::now().to_rfc3339();
                row.upsert(conn, &v, &now)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Stored request keys, in URL order.
    pub async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        let v = self.version.clone();
        let rows = self
            .db
            .conn
            .call(move |conn| -> Result<Vec<(String, String)>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE version = ?1 ORDER BY url")?;
                let rows = stmt
                    .query_map(params![v], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(method, url)| Ok(RequestKey { method: method.parse::<Method>()?, url }))
            .collect()
    }
}

fn check_cacheable(key: &RequestKey, response: &Response) -> Result<(), Error> {
    if !key.method.is_idempotent_read() {
        return Err(Error::NotCacheable(format!("{key}: only GET responses are stored")));
    }
    if !response.is_success() {
        return Err(Error::NotCacheable(format!("{key}: status {}", response.status)));
    }
    Ok(())
}

/// Column values for one entry, encoded outside the connection thread.
struct EntryRow {
    key_hash: String,
    url: String,
    method: &'static str,
    status: u16,
    headers_json: String,
    body: Bytes,
}

impl EntryRow {
    fn encode(key: &RequestKey, response: &Response) -> Result<Self, Error> {
        Ok(Self {
            key_hash: key.hash(),
            url: key.url.clone(),
            method: key.method.as_str(),
            status: response.status,
            headers_json: serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?,
            body: response.body.clone(),
        })
    }

    fn upsert(&self, conn: &rusqlite::Connection, version: &str, now: &str) -> Result<(), rusqlite::Error> {
        conn.execute(
            "INSERT INTO entries (version, key_hash, url, method, status, headers_json, body, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(version, key_hash) DO UPDATE SET
                url = excluded.url,
                method = excluded.method,
                status = excluded.status,
                headers_json = excluded.headers_json,
                body = excluded.body,
                stored_at = excluded.stored_at",
            params![
                version,
                &self.key_hash,
                &self.url,
                self.method,
                self.status,
                &self.headers_json,
                &self.body[..],
                now,
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::new(Method::Get, &Url::parse("https://shop.test").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_open_store_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("v1").await.unwrap();
        db.open_store("v1").await.unwrap();

        let versions = db.list_versions().await.unwrap();
        assert_eq!(versions.into_iter().collect::<Vec<_>>(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        let response = Response::new(200, "<html></html>").with_header("content-type", "text/html");

        store.put(&key("/"), &response).await.unwrap();

        let stored = store.get(&key("/")).await.unwrap().unwrap();
        assert_eq!(stored, response);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        assert!(store.get(&key("/missing.png")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();

        store.put(&key("/logo.png"), &Response::new(200, "old")).await.unwrap();
        store.put(&key("/logo.png"), &Response::new(200, "new")).await.unwrap();

        let stored = store.get(&key("/logo.png")).await.unwrap().unwrap();
        assert_eq!(stored.body, "new");
        assert_eq!(store.keys().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_rejects_non_get_and_failures() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        let url = Url::parse("https://shop.test/api/reviews").unwrap();

        let post = RequestKey::new(Method::Post, &url);
        let result = store.put(&post, &Response::new(201, "{}")).await;
        assert!(matches!(result, Err(Error::NotCacheable(_))));

        let result = store.put(&key("/gone"), &Response::new(404, "")).await;
        assert!(matches!(result, Err(Error::NotCacheable(_))));

        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let v1 = db.open_store("v1").await.unwrap();
        let v2 = db.open_store("v2").await.unwrap();

        v1.put(&key("/"), &Response::new(200, "one")).await.unwrap();

        assert!(v2.get(&key("/")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_store_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let v1 = db.open_store("v1").await.unwrap();
        v1.put(&key("/"), &Response::new(200, "one")).await.unwrap();

        assert!(db.delete_store("v1").await.unwrap());
        assert!(!db.delete_store("v1").await.unwrap());
        assert!(v1.get(&key("/")).await.unwrap().is_none());
        assert!(db.list_versions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_into_deleted_store_fails() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let v1 = db.open_store("v1").await.unwrap();
        db.delete_store("v1").await.unwrap();

        let result = v1.put(&key("/"), &Response::new(200, "late")).await;
        assert!(matches!(result, Err(Error::Database(_))));
        assert!(db.list_versions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_populate_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![
            (key("/"), Response::new(200, "shell")),
            (key("/shell.js"), Response::new(200, "js")),
        ];

        let store = db.populate_store("v2", entries).await.unwrap();

        assert_eq!(store.keys().await.unwrap().len(), 2);
        let summaries = db.store_summaries().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].version, "v2");
        assert_eq!(summaries[0].entries, 2);
    }

    #[tokio::test]
    async fn test_populate_store_rejects_failed_entry_atomically() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![
            (key("/"), Response::new(200, "shell")),
            (key("/missing.js"), Response::new(404, "")),
        ];

        let result = db.populate_store("v2", entries).await;

        assert!(matches!(result, Err(Error::NotCacheable(_))));
        assert!(db.list_versions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keys_round_trip_method() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        store.put(&key("/b.css"), &Response::new(200, "b")).await.unwrap();
        store.put(&key("/a.css"), &Response::new(200, "a")).await.unwrap();

        let keys = store.keys().await.unwrap();
        assert_eq!(keys, vec![key("/a.css"), key("/b.css")]);
    }
}
