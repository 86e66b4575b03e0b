use std::{
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::Local;

use crate::{errors::PersistenceError, ledger::Transaction, utils::paths};

use super::{Result, TransactionStore, TRANSACTIONS_KEY};

const STORE_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";
const QUARANTINE_SUFFIX: &str = "corrupt";
const QUARANTINE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";

/// File-backed key-value store: each key is a JSON document in `root`.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
    key: String,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_key(root, TRANSACTIONS_KEY)
    }

    pub fn with_key(root: impl Into<PathBuf>, key: &str) -> Result<Self> {
        let root = root.into();
        ensure_dir(&root)?;
        Ok(Self {
            root,
            key: canonical_name(key),
        })
    }

    /// Store rooted at the application data directory.
    pub fn new_default() -> Result<Self> {
        Self::new(paths::data_dir())
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(format!("{}.{}", self.key, STORE_EXTENSION))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Renames the stored document to `<key>.json.corrupt-<timestamp>` so the
    /// next save cannot overwrite data that failed to load. Returns the new
    /// location, or `None` when nothing was stored.
    pub fn quarantine(&self) -> Result<Option<PathBuf>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let stamp = Local::now().format(QUARANTINE_TIMESTAMP_FORMAT);
        let mut name = path.clone().into_os_string();
        name.push(format!(".{QUARANTINE_SUFFIX}-{stamp}"));
        let target = PathBuf::from(name);
        fs::rename(&path, &target).map_err(|err| PersistenceError::io(&target, err))?;
        tracing::warn!(
            from = %path.display(),
            to = %target.display(),
            "moved unreadable transactions aside"
        );
        Ok(Some(target))
    }
}

impl TransactionStore for JsonStore {
    fn load(&self) -> Result<Vec<Transaction>> {
        let path = self.path();
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(PersistenceError::io(path, err)),
        };
        serde_json::from_str(&data).map_err(|err| PersistenceError::serde(path, err))
    }

    fn save(&self, transactions: &[Transaction]) -> Result<()> {
        let path = self.path();
        let json = serde_json::to_string_pretty(transactions)
            .map_err(|err| PersistenceError::serde(&path, err))?;
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &path).map_err(|err| PersistenceError::io(&path, err))?;
        tracing::debug!(path = %path.display(), count = transactions.len(), "saved transactions");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(PersistenceError::io(path, err)),
        }
    }

    fn contains(&self) -> Result<bool> {
        Ok(self.path().is_file())
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|err| PersistenceError::io(path, err))
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        TRANSACTIONS_KEY.into()
    } else {
        sanitized
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path).map_err(|err| PersistenceError::io(path, err))?;
    file.write_all(data.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|err| PersistenceError::io(path, err))?;
    Ok(())
}
