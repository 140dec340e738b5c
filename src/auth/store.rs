//! On-disk persistence for the credential record.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::credential::{Credential, CREDENTIAL_SCHEMA_VERSION};
use crate::error::StorageError;

/// Result of reading the credential file.
#[derive(Debug)]
pub enum LoadOutcome {
    Missing,
    /// File exists but cannot be used as a credential.
    Corrupt(String),
    Loaded(Credential),
}

#[derive(Deserialize)]
struct VersionProbe {
    version: Option<u32>,
}

/// JSON file holding exactly one [`Credential`].
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<LoadOutcome, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(LoadOutcome::Missing),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let probe: VersionProbe = match serde_json::from_slice(&bytes) {
            Ok(probe) => probe,
            Err(err) => return Ok(LoadOutcome::Corrupt(format!("not valid JSON: {}", err))),
        };
        match probe.version {
            Some(CREDENTIAL_SCHEMA_VERSION) => {}
            Some(other) => {
                return Ok(LoadOutcome::Corrupt(format!(
                    "schema version {} is not supported (expected {})",
                    other, CREDENTIAL_SCHEMA_VERSION
                )))
            }
            None => return Ok(LoadOutcome::Corrupt("schema version is missing".to_string())),
        }

        match serde_json::from_slice::<Credential>(&bytes) {
            Ok(credential) => Ok(LoadOutcome::Loaded(credential)),
            Err(err) => Ok(LoadOutcome::Corrupt(err.to_string())),
        }
    }

    /// Replace the file atomically. The temporary file is created owner-only,
    /// so the credential is never world-readable, even briefly.
    pub fn save(&self, credential: &Credential) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(credential).map_err(StorageError::Encode)?;
        let write_err = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(write_err)?;

        let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
        file.write_all(&json).map_err(write_err)?;
        file.as_file().sync_all().map_err(write_err)?;
        file.persist(&self.path).map_err(|err| write_err(err.error))?;

        log::debug!("Credential persisted to {}", self.path.display());
        Ok(())
    }
}
