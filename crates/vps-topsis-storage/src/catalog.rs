use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{StorageError, load_or_init, now_ms, write_json};

/// One VPS plan with its resolved criterion values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub no: u32,
    pub vendor: String,
    pub plan: String,
    pub cpu: f64,
    pub ram: f64,
    pub disk_io: f64,
    pub price: f64,
    #[serde(default)]
    pub updated_ms: u64,
}

impl CatalogEntry {
    /// Criterion values in CPU, RAM, Disk I/O, Price order.
    pub fn values(&self) -> Vec<f64> {
        vec![self.cpu, self.ram, self.disk_io, self.price]
    }

    pub fn label(&self) -> String {
        if self.plan.is_empty() {
            self.vendor.clone()
        } else {
            format!("{} {}", self.vendor, self.plan)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCatalogEntry {
    pub vendor: String,
    pub plan: String,
    pub cpu: f64,
    pub ram: f64,
    pub disk_io: f64,
    pub price: f64,
}

impl NewCatalogEntry {
    fn validate(&self) -> Result<(), StorageError> {
        if self.vendor.trim().is_empty() {
            return Err(StorageError::InvalidInput(
                "vendor cannot be empty".to_string(),
            ));
        }
        let fields = [
            ("cpu", self.cpu),
            ("ram", self.ram),
            ("disk_io", self.disk_io),
            ("price", self.price),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(StorageError::InvalidInput(format!(
                "{name} must be a finite non-negative number, got {value}"
            )));
        }
        Ok(())
    }

    fn into_entry(self, no: u32) -> CatalogEntry {
        CatalogEntry {
            no,
            vendor: self.vendor.trim().to_string(),
            plan: self.plan.trim().to_string(),
            cpu: self.cpu,
            ram: self.ram,
            disk_io: self.disk_io,
            price: self.price,
            updated_ms: now_ms(),
        }
    }
}

pub trait CatalogBackend: Send {
    fn list(&self) -> Vec<CatalogEntry>;
    fn get(&self, no: u32) -> Option<CatalogEntry>;
    fn add(&mut self, new_entry: NewCatalogEntry) -> Result<CatalogEntry, StorageError>;
    fn update(
        &mut self,
        no: u32,
        new_entry: NewCatalogEntry,
    ) -> Result<Option<CatalogEntry>, StorageError>;
    fn remove(&mut self, no: u32) -> Result<bool, StorageError>;
    fn stats(&self) -> serde_json::Value;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedCatalog {
    entries: Vec<CatalogEntry>,
}

pub struct CatalogStore {
    path: PathBuf,
    entries: Vec<CatalogEntry>,
}

impl CatalogStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let persisted: PersistedCatalog = load_or_init(&path)?;
        let mut entries = persisted.entries;
        entries.sort_by_key(|e| e.no);
        tracing::debug!(path = %path.display(), count = entries.len(), "catalog opened");
        Ok(Self { path, entries })
    }

    pub fn list(&self) -> Vec<CatalogEntry> {
        self.entries.clone()
    }

    pub fn get(&self, no: u32) -> Option<CatalogEntry> {
        self.entries.iter().find(|e| e.no == no).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> serde_json::Value {
        serde_json::json!({
            "count": self.entries.len(),
            "path": self.path,
        })
    }

    pub fn add(&mut self, new_entry: NewCatalogEntry) -> Result<CatalogEntry, StorageError> {
        new_entry.validate()?;
        let no = self.entries.iter().map(|e| e.no).max().unwrap_or(0) + 1;
        let entry = new_entry.into_entry(no);
        self.entries.push(entry.clone());
        self.persist()?;
        tracing::debug!(no, vendor = %entry.vendor, "catalog entry added");
        Ok(entry)
    }

    pub fn update(
        &mut self,
        no: u32,
        new_entry: NewCatalogEntry,
    ) -> Result<Option<CatalogEntry>, StorageError> {
        new_entry.validate()?;
        let Some(slot) = self.entries.iter_mut().find(|e| e.no == no) else {
            return Ok(None);
        };
        *slot = new_entry.into_entry(no);
        let updated = slot.clone();
        self.persist()?;
        tracing::debug!(no, "catalog entry updated");
        Ok(Some(updated))
    }

    /// Removes an entry and renumbers the rest `1..=n` in their current order.
    pub fn remove(&mut self, no: u32) -> Result<bool, StorageError> {
        let before = self.entries.len();
        self.entries.retain(|e| e.no != no);
        if self.entries.len() == before {
            return Ok(false);
        }
        for (next, entry) in (1_u32..).zip(self.entries.iter_mut()) {
            entry.no = next;
        }
        self.persist()?;
        tracing::debug!(no, remaining = self.entries.len(), "catalog entry removed");
        Ok(true)
    }

    fn persist(&self) -> Result<(), StorageError> {
        let persisted = PersistedCatalog {
            entries: self.entries.clone(),
        };
        write_json(&self.path, &persisted)
    }
}

impl CatalogBackend for CatalogStore {
    fn list(&self) -> Vec<CatalogEntry> {
        Self::list(self)
    }

    fn get(&self, no: u32) -> Option<CatalogEntry> {
        Self::get(self, no)
    }

    fn add(&mut self, new_entry: NewCatalogEntry) -> Result<CatalogEntry, StorageError> {
        Self::add(self, new_entry)
    }

    fn update(
        &mut self,
        no: u32,
        new_entry: NewCatalogEntry,
    ) -> Result<Option<CatalogEntry>, StorageError> {
        Self::update(self, no, new_entry)
    }

    fn remove(&mut self, no: u32) -> Result<bool, StorageError> {
        Self::remove(self, no)
    }

    fn stats(&self) -> serde_json::Value {
        Self::stats(self)
    }
}
