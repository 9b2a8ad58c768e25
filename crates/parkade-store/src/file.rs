use crate::layout::StoreLayout;
use crate::lock::StoreLock;
use crate::{fsync_dir, FacilityDocument, FacilityStore, StoreError};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// File-backed facility store.
///
/// The whole facility is one JSON document written by atomic rename, so
/// readers never observe a partial write. Writers serialize on the store's
/// advisory lock for the duration of each read-modify-write.
pub struct FileStore {
    layout: StoreLayout,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: StoreLayout::new(root),
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    fn load(&self) -> Result<FacilityDocument, StoreError> {
        if self.layout.version_file().exists() {
            self.layout.verify_version()?;
        }
        let path = self.layout.facility_file();
        if !path.exists() {
            return Ok(FacilityDocument::default());
        }
        let content = fs::read_to_string(&path)?;
        let doc: FacilityDocument = serde_json::from_str(&content)?;
        doc.verify_checksum()?;
        Ok(doc)
    }

    fn save(&self, doc: &FacilityDocument) -> Result<(), StoreError> {
        let mut sealed = doc.clone();
        sealed.checksum = Some(sealed.compute_checksum()?);
        let content = serde_json::to_string_pretty(&sealed)?;

        let dir = self.layout.store_dir();
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.layout.facility_file())
            .map_err(|e| StoreError::Io(e.error))?;
        fsync_dir(&dir)?;
        Ok(())
    }
}

impl FacilityStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    fn read_document(&self) -> Result<FacilityDocument, StoreError> {
        self.load()
    }

    fn update_document(
        &self,
        apply: &mut dyn FnMut(&mut FacilityDocument) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        self.layout.initialize()?;
        let _lock = StoreLock::acquire(&self.layout.lock_file())?;

        let mut doc = self.load()?;
        apply(&mut doc)?;
        self.save(&doc)?;
        tracing::debug!(
            "facility document written: {} levels, {} vehicles",
            doc.levels.len(),
            doc.vehicles.len()
        );
        Ok(())
    }
}
