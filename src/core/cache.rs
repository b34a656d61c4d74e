use crate::domain::model::CacheKey;
use crate::utils::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Key -> price-per-unit mapping, optionally mirrored to a JSON file.
///
/// Every `put` rewrites the whole file. The entry map and the file write are
/// guarded by separate locks so lookups never wait on disk I/O.
#[derive(Debug)]
pub struct PriceCache {
    entries: Mutex<BTreeMap<String, f64>>,
    backing: Option<CacheFile>,
}

#[derive(Debug)]
struct CacheFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl PriceCache {
    /// 載入快取檔案；讀取或解析失敗時回傳空快取
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(Some(mut entries)) => {
                // 檔案可能被手動修改，非正數的價格不可信任
                entries.retain(|key, price| {
                    let keep = price.is_finite() && *price > 0.0;
                    if !keep {
                        tracing::warn!("Dropping cached price {} for {}", price, key);
                    }
                    keep
                });
                tracing::debug!("Loaded {} cached prices from {}", entries.len(), path.display());
                entries
            }
            Ok(None) => {
                tracing::debug!("No price cache at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                tracing::error!("Error loading price cache from {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self {
            entries: Mutex::new(entries),
            backing: Some(CacheFile {
                path,
                write_lock: Mutex::new(()),
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            backing: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.backing.as_ref().map(|b| b.path.as_path())
    }

    pub fn get(&self, key: &CacheKey) -> Option<f64> {
        self.entries().get(key.as_str()).copied()
    }

    /// Inserts and persists. A failed write is logged; the in-memory entry stays.
    pub fn put(&self, key: CacheKey, price: f64) {
        self.entries().insert(key.into(), price);

        if let Err(e) = self.persist() {
            tracing::error!("Error saving price cache: {}", e);
        }
    }

    /// Replaces the backing file with the full current mapping.
    pub fn persist(&self) -> Result<()> {
        let Some(backing) = &self.backing else {
            return Ok(());
        };

        // 先取得寫入鎖再取快照，最後寫入者必定持有最新內容
        let _write = backing.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.snapshot();
        write_entries(&backing.path, &snapshot)?;

        tracing::info!("Price cache saved to {}", backing.path.display());
        Ok(())
    }

    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.entries().clone()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, f64>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_entries(path: &Path) -> Result<Option<BTreeMap<String, f64>>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

fn write_entries(path: &Path, entries: &BTreeMap<String, f64>) -> Result<()> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    entries.serialize(&mut serializer)?;
    buffer.push(b'\n');

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    // 寫入暫存檔後再改名，避免留下寫到一半的檔案
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    if let Err(e) = fs::write(&tmp, &buffer).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
