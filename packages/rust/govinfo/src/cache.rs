//! File-backed, gzip-compressed caches.
//!
//! [`ResponseCache`] stores raw API responses keyed by a SHA-256 of the
//! request. [`BillCache`] stores fully processed bills keyed by package id.
//! Writers always replace whole files at deterministic paths.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use billscope_shared::{Bill, BillscopeError, Result};

/// Hex SHA-256 over the concatenation of `parts`.
pub fn cache_key(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    format!("{:x}", hasher.finalize())
}

fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .and_then(|_| encoder.finish())
        .map_err(|e| BillscopeError::Cache(format!("gzip encode failed: {e}")))
}

fn gunzip(path: &Path, bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|e| BillscopeError::Cache(format!("gzip decode failed for {}: {e}", path.display())))?;
    Ok(out)
}

fn read_entry(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => gunzip(path, &bytes).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BillscopeError::io(path, e)),
    }
}

fn write_entry(path: &Path, bytes: &[u8]) -> Result<()> {
    let compressed = gzip(bytes)?;
    std::fs::write(path, compressed).map_err(|e| BillscopeError::io(path, e))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| BillscopeError::io(dir, e))
}

// ---------------------------------------------------------------------------
// ResponseCache
// ---------------------------------------------------------------------------

/// Raw response bodies, one gzip file per request hash.
///
/// Entries never expire. A search page cached for a day still being
/// published stays stale until [`ResponseCache::clear`] runs.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    /// Open (creating if needed) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let hit = read_entry(&self.path_for(key))?;
        if hit.is_some() {
            debug!(key, "response cache hit");
        }
        Ok(hit)
    }

    pub fn put(&self, key: &str, body: &[u8]) -> Result<()> {
        debug!(key, bytes = body.len(), "caching response");
        write_entry(&self.path_for(key), body)
    }

    /// Delete every cached response. Returns how many files were removed.
    pub fn clear(&self) -> Result<usize> {
        clear_dir(&self.dir)
    }
}

// ---------------------------------------------------------------------------
// BillCache
// ---------------------------------------------------------------------------

/// Processed bills as gzip'd JSON, one file per package id.
#[derive(Debug, Clone)]
pub struct BillCache {
    dir: PathBuf,
}

impl BillCache {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, package_id: &str) -> PathBuf {
        self.dir.join(cache_key(&[package_id.as_bytes()]))
    }

    pub fn contains(&self, package_id: &str) -> bool {
        self.path_for(package_id).exists()
    }

    pub fn get(&self, package_id: &str) -> Result<Option<Bill>> {
        let path = self.path_for(package_id);
        let Some(bytes) = read_entry(&path)? else {
            return Ok(None);
        };
        let bill = serde_json::from_slice(&bytes).map_err(|e| {
            BillscopeError::Cache(format!("corrupt bill cache entry {}: {e}", path.display()))
        })?;
        debug!(package_id, "bill cache hit");
        Ok(Some(bill))
    }

    /// Store `bill` under its `package_id`.
    pub fn put(&self, bill: &Bill) -> Result<()> {
        let package_id = bill
            .package_id
            .as_deref()
            .ok_or_else(|| BillscopeError::validation("cannot cache a bill without package_id"))?;
        let json = serde_json::to_vec(bill)
            .map_err(|e| BillscopeError::Cache(format!("failed to serialize bill: {e}")))?;
        write_entry(&self.path_for(package_id), &json)
    }

    /// Load every readable bill. Unreadable entries are logged and skipped.
    pub fn load_all(&self) -> Result<Vec<Bill>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)
            .map_err(|e| BillscopeError::io(&self.dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        let mut bills = Vec::with_capacity(paths.len());
        for path in paths {
            let parsed = read_entry(&path).and_then(|bytes| {
                let bytes = bytes.unwrap_or_default();
                serde_json::from_slice::<Bill>(&bytes)
                    .map_err(|e| BillscopeError::Cache(format!("{}: {e}", path.display())))
            });
            match parsed {
                Ok(bill) => bills.push(bill),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable bill cache entry"),
            }
        }
        Ok(bills)
    }

    pub fn clear(&self) -> Result<usize> {
        clear_dir(&self.dir)
    }
}

fn clear_dir(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir).map_err(|e| BillscopeError::io(dir, e))? {
        let path = entry.map_err(|e| BillscopeError::io(dir, e))?.path();
        if path.is_file() {
            std::fs::remove_file(&path).map_err(|e| BillscopeError::io(&path, e))?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_sha256_hex() {
        assert_eq!(
            cache_key(&[b"abc"]),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(cache_key(&[b"a", b"bc"]), cache_key(&[b"abc"]));
    }

    #[test]
    fn response_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::open(dir.path().join("govinfo")).unwrap();
        let key = cache_key(&[b"https://api.govinfo.gov/x"]);

        assert_eq!(cache.get(&key).unwrap(), None);
        cache.put(&key, b"<bill/>").unwrap();
        assert_eq!(cache.get(&key).unwrap().as_deref(), Some(&b"<bill/>"[..]));

        // Stored compressed, not verbatim.
        let raw = std::fs::read(cache.path_for(&key)).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn bill_cache_round_trip_and_load_all() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BillCache::open(dir.path()).unwrap();

        let bill = Bill {
            title: "Clean Water Infrastructure Act".into(),
            package_id: Some("BILLS-118hr1234ih".into()),
            num_sections: 0,
            ..Default::default()
        };
        assert!(!cache.contains("BILLS-118hr1234ih"));
        cache.put(&bill).unwrap();
        assert!(cache.contains("BILLS-118hr1234ih"));
        assert_eq!(cache.get("BILLS-118hr1234ih").unwrap(), Some(bill.clone()));

        std::fs::write(dir.path().join("garbage"), b"not gzip").unwrap();
        let all = cache.load_all().unwrap();
        assert_eq!(all, vec![bill]);
    }

    #[test]
    fn bill_without_package_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BillCache::open(dir.path()).unwrap();
        assert!(cache.put(&Bill::default()).is_err());
    }

    #[test]
    fn clear_removes_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::open(dir.path()).unwrap();
        cache.put("a", b"1").unwrap();
        cache.put("b", b"2").unwrap();
        assert_eq!(cache.clear().unwrap(), 2);
        assert_eq!(cache.get("a").unwrap(), None);
    }
}
