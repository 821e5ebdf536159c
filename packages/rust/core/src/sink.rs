//! Persistence hand-off for finished bills.

use std::path::{Path, PathBuf};

use tracing::debug;

use billscope_shared::{Bill, BillscopeError, Result};

/// Receives every fully enriched bill. Ingestion never reads back from it.
pub trait BillSink: Send + Sync {
    fn store(&self, bill: &Bill) -> Result<()>;
}

/// Writes each bill as pretty JSON to `<dir>/<slug>.json`, replacing any
/// previous file for the same slug.
#[derive(Debug, Clone)]
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| BillscopeError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, bill: &Bill) -> PathBuf {
        self.dir.join(format!("{}.json", bill.slug()))
    }
}

impl BillSink for JsonDirSink {
    fn store(&self, bill: &Bill) -> Result<()> {
        if bill.slug().is_empty() {
            return Err(BillscopeError::validation(format!(
                "bill {} has no slug",
                bill.package_id.as_deref().unwrap_or("<unknown>")
            )));
        }
        let path = self.path_for(bill);
        let json = serde_json::to_string_pretty(bill)
            .map_err(|e| BillscopeError::validation(format!("failed to serialize bill: {e}")))?;
        std::fs::write(&path, json).map_err(|e| BillscopeError::io(&path, e))?;
        debug!(path = %path.display(), "bill written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_slug_named_json() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path().join("out")).unwrap();
        let bill = Bill {
            legis_num: "S. 42".into(),
            title: "Clean Water Act".into(),
            bill_version: "is".into(),
            ..Default::default()
        };

        sink.store(&bill).unwrap();
        let path = dir.path().join("out/s-42-clean-water-act-is.json");
        let back: Bill = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, bill);
    }

    #[test]
    fn rejects_bill_without_slug() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonDirSink::new(dir.path()).unwrap();
        assert!(sink.store(&Bill::default()).is_err());
    }
}
