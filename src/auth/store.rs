//! JSON-document-backed user table.
//!
//! Document layout (one file, rewritten in full on every mutation):
//! - `users`: ordered list of user records
//!
//! All reads are served from an in-memory mirror. Every mutation runs under
//! one document-wide lock and persists before the lock is released; a failed
//! write restores the mirror to its prior state.

use super::error::{AccountError, StorageError};
use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A registered user as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    #[serde(alias = "password")]
    pub password_hash: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(
        rename = "profileURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub profile_url: Option<String>,
}

/// Older documents hold contact fields as numbers or null; read any scalar as text.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    use serde_json::Value;
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

/// Fields to merge into an existing record. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub profile_url: Option<String>,
}

impl UserChanges {
    fn apply(self, record: &mut UserRecord) {
        if let Some(username) = self.username {
            record.username = username;
        }
        if let Some(hash) = self.password_hash {
            record.password_hash = hash;
        }
        if let Some(email) = self.email {
            record.email = email;
        }
        if let Some(phone) = self.phone_number {
            record.phone_number = phone;
        }
        if let Some(address) = self.address {
            record.address = address;
        }
        if let Some(url) = self.profile_url {
            record.profile_url = Some(url);
        }
    }
}

/// The persisted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

pub struct UserStore {
    path: PathBuf,
    document: Mutex<UserDocument>,
}

impl UserStore {
    /// Open the store at `path`, loading whatever is there.
    ///
    /// Fails if the file exists but cannot be read; starting empty would let
    /// the next write replace every stored account.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let document = Self::load(&path)?;
        tracing::debug!(path = %path.display(), users = document.users.len(), "User store loaded");
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    /// Read the document at `path`.
    ///
    /// A missing or empty file yields an empty user list. A file that does not
    /// parse is renamed to `<path>.corrupt` and an empty list is returned, so
    /// the original bytes survive the next write.
    pub fn load(path: &Path) -> Result<UserDocument, StorageError> {
        let io_err = |source: std::io::Error| StorageError::Io {
            path: path.display().to_string(),
            source,
        };

        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(UserDocument::default())
            }
            Err(e) => return Err(io_err(e)),
        };

        if contents.trim().is_empty() {
            return Ok(UserDocument::default());
        }

        match serde_json::from_str::<UserDocument>(&contents) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                let aside = corrupt_path(path);
                std::fs::rename(path, &aside).map_err(io_err)?;
                tracing::warn!(
                    path = %path.display(),
                    moved_to = %aside.display(),
                    "User store is not a valid document, starting empty: {e}"
                );
                Ok(UserDocument::default())
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Lookups ─────────────────────────────────────────────────────

    /// Exact, case-sensitive username match.
    pub fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        let doc = self.document.lock();
        doc.users.iter().find(|u| u.username == username).cloned()
    }

    pub fn find_by_id(&self, id: &str) -> Option<UserRecord> {
        let doc = self.document.lock();
        doc.users.iter().find(|u| u.id == id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.document.lock().users.len()
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Append a new record and persist.
    ///
    /// The username check and the append happen under the same lock, so two
    /// concurrent signups for one name cannot both succeed.
    pub fn insert(&self, record: UserRecord) -> Result<(), AccountError> {
        let mut doc = self.document.lock();
        if doc.users.iter().any(|u| u.username == record.username) {
            return Err(AccountError::Conflict(record.username));
        }

        let username = record.username.clone();
        doc.users.push(record);
        if let Err(e) = write_document(&self.path, &doc) {
            doc.users.pop();
            return Err(e.into());
        }

        tracing::info!(username = %username, "User registered");
        Ok(())
    }

    /// Merge `changes` into the record with `id` and persist.
    /// Returns the record as stored after the merge.
    pub fn update(&self, id: &str, changes: UserChanges) -> Result<UserRecord, AccountError> {
        let mut doc = self.document.lock();
        let index = doc
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or(AccountError::NotFound)?;

        let previous = doc.users[index].clone();
        changes.apply(&mut doc.users[index]);
        let updated = doc.users[index].clone();

        if let Err(e) = write_document(&self.path, &doc) {
            doc.users[index] = previous;
            return Err(e.into());
        }

        Ok(updated)
    }

    /// Write the current in-memory document to disk.
    pub fn persist(&self) -> Result<(), StorageError> {
        let doc = self.document.lock();
        write_document(&self.path, &doc)
    }
}

/// Where an unparsable document is moved: `db.json` -> `db.json.corrupt`.
fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}

/// Serialize `doc` and atomically replace the file at `path`.
fn write_document(path: &Path, doc: &UserDocument) -> Result<(), StorageError> {
    let io_err = |source: std::io::Error| StorageError::Io {
        path: path.display().to_string(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let json = serde_json::to_vec_pretty(doc)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(&json).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|source| StorageError::Persist {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────
