//! Directory backed storage
//!
//! ```text
//! <root>/groups/<id>.json
//! <root>/profiles/<id>.json
//! <root>/ignition/<name>
//! <root>/cloud/<name>
//! <root>/generic/<name>
//! ```

use super::{Result, Store, StoreError};
use bootcfg_model::{Group, Profile, TemplateNamespace};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const GROUPS_DIR: &str = "groups";
const PROFILES_DIR: &str = "profiles";

/// Storage rooted at a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

/// Names that stay inside their directory
fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}

impl FileStore {
    /// Open a store at an existing data directory, creating the entity
    /// subdirectories if needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("data directory {} does not exist", root.display()),
            )));
        }

        fs::create_dir_all(root.join(GROUPS_DIR))?;
        fs::create_dir_all(root.join(PROFILES_DIR))?;
        for namespace in TemplateNamespace::ALL {
            fs::create_dir_all(root.join(namespace.as_str()))?;
        }

        debug!(path = %root.display(), "opened file store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, dir: &str, id: &str) -> Option<PathBuf> {
        is_safe_name(id).then(|| self.root.join(dir).join(format!("{}.json", id)))
    }

    fn write_record<T: Serialize>(&self, dir: &str, id: &str, record: &T) -> Result<()> {
        let path = self.record_path(dir, id).ok_or_else(|| {
            StoreError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid record id: {:?}", id),
            ))
        })?;
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&path, json.as_bytes())
    }

    /// Read a record, or `Ok(None)` if it does not exist
    fn read_record<T: DeserializeOwned>(&self, dir: &str, id: &str) -> Result<Option<T>> {
        let Some(path) = self.record_path(dir, id) else {
            return Ok(None);
        };
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| StoreError::Serialization(format!("{}: {}", path.display(), e)))
    }

    fn list_records<T: DeserializeOwned>(&self, dir: &str) -> Result<Vec<T>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(self.root.join(dir))? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            let contents = fs::read_to_string(&path)?;
            let record = serde_json::from_str(&contents).map_err(|e| {
                warn!(path = %path.display(), error = %e, "unparsable record");
                StoreError::Serialization(format!("{}: {}", path.display(), e))
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".partial");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl Store for FileStore {
    fn group_put(&self, group: &Group) -> Result<()> {
        self.write_record(GROUPS_DIR, &group.id, group)
    }

    fn group_get(&self, id: &str) -> Result<Group> {
        self.read_record(GROUPS_DIR, id)?
            .ok_or_else(|| StoreError::GroupNotFound(id.to_string()))
    }

    fn group_list(&self) -> Result<Vec<Group>> {
        self.list_records(GROUPS_DIR)
    }

    fn profile_put(&self, profile: &Profile) -> Result<()> {
        self.write_record(PROFILES_DIR, &profile.id, profile)
    }

    fn profile_get(&self, id: &str) -> Result<Profile> {
        self.read_record(PROFILES_DIR, id)?
            .ok_or_else(|| StoreError::ProfileNotFound(id.to_string()))
    }

    fn profile_list(&self) -> Result<Vec<Profile>> {
        self.list_records(PROFILES_DIR)
    }

    fn template_put(&self, namespace: TemplateNamespace, name: &str, contents: &str) -> Result<()> {
        if !is_safe_name(name) {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid template name: {:?}", name),
            )));
        }
        write_atomic(
            &self.root.join(namespace.as_str()).join(name),
            contents.as_bytes(),
        )
    }

    fn template_get(&self, namespace: TemplateNamespace, name: &str) -> Result<String> {
        let not_found = || StoreError::TemplateNotFound {
            namespace,
            name: name.to_string(),
        };
        if !is_safe_name(name) {
            return Err(not_found());
        }
        match fs::read_to_string(self.root.join(namespace.as_str()).join(name)) {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }
}
