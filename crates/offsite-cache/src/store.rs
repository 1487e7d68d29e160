use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database operation failed: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Header serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A captured HTTP response, exactly as it will be replayed later
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: DateTime<Utc>,
}

const UPSERT_ENTRY: &str = "INSERT INTO entries
        (store_id, method, url, status, status_text, headers, body, stored_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
     ON CONFLICT(store_id, method, url) DO UPDATE SET
        status = excluded.status,
        status_text = excluded.status_text,
        headers = excluded.headers,
        body = excluded.body,
        stored_at = excluded.stored_at";

/// All cache stores in one SQLite database
///
/// SQLite was chosen because:
/// - Zero-config embedded database
/// - A transaction gives us all-or-nothing precaching for free
/// - Battle-tested and reliable
/// - Doesn't require a separate process
#[derive(Clone)]
pub struct CacheStorage {
    conn: Arc<Mutex<Connection>>,
}

impl CacheStorage {
    pub fn new(db_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Throwaway database that lives and dies with the process
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        // Cascade is what makes deleting a store atomic: one row gone,
        // every entry gone with it
        conn.pragma_update(None, "foreign_keys", true)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS stores (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY,
                store_id INTEGER NOT NULL REFERENCES stores(id) ON DELETE CASCADE,
                method TEXT NOT NULL,
                url TEXT NOT NULL,
                status INTEGER NOT NULL,
                status_text TEXT NOT NULL,
                headers TEXT NOT NULL,
                body BLOB NOT NULL,
                stored_at INTEGER NOT NULL,
                UNIQUE(store_id, method, url)
            )",
            [],
        )?;

        Ok(())
    }

    /// Open a named store, creating it on first use
    pub fn open(&self, name: &str) -> Result<CacheStore> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
            params![name, Utc::now().timestamp()],
        )?;
        let store_id: i64 = conn.query_row(
            "SELECT id FROM stores WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        drop(conn);

        Ok(CacheStore {
            conn: Arc::clone(&self.conn),
            store_id,
            name: name.to_string(),
        })
    }

    /// Every store name currently on disk
    pub fn store_names(&self) -> Result<Vec<String>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    pub fn has(&self, name: &str) -> Result<bool> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM stores WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Delete a store and everything in it. Returns whether it existed.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let conn = self.lock();
        let deleted = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
        if deleted > 0 {
            debug!("Deleted store {}", name);
        }
        Ok(deleted > 0)
    }

    /// Delete every store except `keep`, returning the names removed
    pub fn delete_except(&self, keep: &str) -> Result<Vec<String>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT name FROM stores WHERE name != ?1")?;
        let stale = stmt
            .query_map(params![keep], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for name in &stale {
            conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
        }
        Ok(stale)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock only means some thread panicked mid-query; the
        // connection itself is still usable
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Handle on one named store; cheap to clone, safe to share
#[derive(Clone)]
pub struct CacheStore {
    conn: Arc<Mutex<Connection>>,
    store_id: i64,
    name: String,
}

impl CacheStore {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or overwrite one entry. Whoever writes last wins.
    pub fn put(&self, method: &str, url: &str, response: &StoredResponse) -> Result<()> {
        let headers = serde_json::to_string(&response.headers)?;
        let conn = self.lock();
        conn.execute(
            UPSERT_ENTRY,
            params![
                self.store_id,
                method,
                url,
                response.status,
                response.status_text,
                headers,
                response.body,
                response.stored_at.timestamp()
            ],
        )?;
        Ok(())
    }

    /// Store a whole batch of GET responses in one transaction.
    /// Either every entry lands or none of them do.
    pub fn put_all(&self, entries: &[(String, StoredResponse)]) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        for (url, response) in entries {
            let headers = serde_json::to_string(&response.headers)?;
            tx.execute(
                UPSERT_ENTRY,
                params![
                    self.store_id,
                    "GET",
                    url,
                    response.status,
                    response.status_text,
                    headers,
                    response.body,
                    response.stored_at.timestamp()
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Find the stored response for a request, if any
    pub fn lookup(&self, method: &str, url: &str) -> Result<Option<StoredResponse>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT status, status_text, headers, body, stored_at
             FROM entries WHERE store_id = ?1 AND method = ?2 AND url = ?3",
        )?;
        let row = stmt
            .query_row(params![self.store_id, method, url], |row| {
                Ok((
                    row.get::<_, u16>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })
            .optional()?;

        match row {
            Some((status, status_text, headers, body, stored_at)) => {
                let headers: Vec<(String, String)> = serde_json::from_str(&headers)?;
                Ok(Some(StoredResponse {
                    status,
                    status_text,
                    headers,
                    body,
                    stored_at: DateTime::from_timestamp(stored_at, 0).unwrap_or_default(),
                }))
            }
            None => Ok(None),
        }
    }

    pub fn len(&self) -> Result<usize> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE store_id = ?1",
            params![self.store_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> StoredResponse {
        StoredResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: vec![("content-type".to_string(), "text/css".to_string())],
            body: body.as_bytes().to_vec(),
            stored_at: Utc::now(),
        }
    }

    #[test]
    fn test_put_and_lookup() {
        let storage = CacheStorage::in_memory().unwrap();
        let store = storage.open("site-v1.0.0").unwrap();

        store
            .put("GET", "https://example.com/css/style.css", &response("body{}"))
            .unwrap();

        let found = store
            .lookup("GET", "https://example.com/css/style.css")
            .unwrap()
            .unwrap();
        assert_eq!(found.status, 200);
        assert_eq!(found.status_text, "OK");
        assert_eq!(found.body, b"body{}");
        assert_eq!(found.headers[0].0, "content-type");
    }

    #[test]
    fn test_lookup_misses_on_unknown_url() {
        let storage = CacheStorage::in_memory().unwrap();
        let store = storage.open("site-v1.0.0").unwrap();

        let found = store.lookup("GET", "https://example.com/nope").unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_put_overwrites_previous_entry() {
        let storage = CacheStorage::in_memory().unwrap();
        let store = storage.open("site-v1.0.0").unwrap();
        let url = "https://example.com/js/main.js";

        store.put("GET", url, &response("old")).unwrap();
        store.put("GET", url, &response("new")).unwrap();

        let found = store.lookup("GET", url).unwrap().unwrap();
        assert_eq!(found.body, b"new");
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_method_is_part_of_the_key() {
        let storage = CacheStorage::in_memory().unwrap();
        let store = storage.open("site-v1.0.0").unwrap();
        let url = "https://example.com/search";

        store.put("GET", url, &response("get")).unwrap();
        store.put("POST", url, &response("post")).unwrap();

        assert_eq!(store.lookup("GET", url).unwrap().unwrap().body, b"get");
        assert_eq!(store.lookup("POST", url).unwrap().unwrap().body, b"post");
    }

    #[test]
    fn test_put_all_stores_every_entry() {
        let storage = CacheStorage::in_memory().unwrap();
        let store = storage.open("site-v1.0.0").unwrap();

        let entries = vec![
            ("https://example.com/".to_string(), response("index")),
            ("https://example.com/css/style.css".to_string(), response("css")),
            ("https://example.com/offline.html".to_string(), response("offline")),
        ];
        store.put_all(&entries).unwrap();

        assert_eq!(store.len().unwrap(), 3);
        let found = store
            .lookup("GET", "https://example.com/offline.html")
            .unwrap()
            .unwrap();
        assert_eq!(found.body, b"offline");
    }

    #[test]
    fn test_put_all_fails_once_store_is_gone() {
        let storage = CacheStorage::in_memory().unwrap();
        let store = storage.open("site-v1.0.0").unwrap();
        storage.delete("site-v1.0.0").unwrap();

        let entries = vec![("https://example.com/".to_string(), response("index"))];
        assert!(store.put_all(&entries).is_err());
    }

    #[test]
    fn test_delete_cascades_to_entries() {
        let storage = CacheStorage::in_memory().unwrap();
        let store = storage.open("site-v1.0.0").unwrap();
        store
            .put("GET", "https://example.com/", &response("index"))
            .unwrap();

        assert!(storage.delete("site-v1.0.0").unwrap());
        assert!(!storage.has("site-v1.0.0").unwrap());

        // Reopening the name starts from scratch
        let fresh = storage.open("site-v1.0.0").unwrap();
        assert_eq!(fresh.len().unwrap(), 0);
    }

    #[test]
    fn test_delete_except_keeps_only_the_current_store() {
        let storage = CacheStorage::in_memory().unwrap();
        storage.open("site-v0.9.0").unwrap();
        storage.open("site-v1.0.0").unwrap();
        storage.open("site-v1.1.0").unwrap();

        let mut deleted = storage.delete_except("site-v1.1.0").unwrap();
        deleted.sort();

        assert_eq!(deleted, vec!["site-v0.9.0", "site-v1.0.0"]);
        assert_eq!(storage.store_names().unwrap(), vec!["site-v1.1.0"]);
    }

    #[test]
    fn test_stores_are_isolated() {
        let storage = CacheStorage::in_memory().unwrap();
        let old = storage.open("site-v1.0.0").unwrap();
        let new = storage.open("site-v2.0.0").unwrap();
        let url = "https://example.com/";

        old.put("GET", url, &response("old index")).unwrap();
        new.put("GET", url, &response("new index")).unwrap();

        assert_eq!(old.lookup("GET", url).unwrap().unwrap().body, b"old index");
        assert_eq!(new.lookup("GET", url).unwrap().unwrap().body, b"new index");
    }
}
