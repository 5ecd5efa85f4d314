//! Secure key-value storage for small secrets
//!
//! Session tokens and identifiers are kept out of the state snapshot and
//! stored here instead, behind one of several backends:
//!
//! - `SecureStore` trait: common get/set/delete interface keyed by string
//! - `KeyringStore`: OS-native secure storage (primary)
//! - `EncryptedFileStore`: age passphrase-encrypted files (fallback)
//! - `MemoryStore`: process-local map (tests, ephemeral sessions)
//! - `SecureStorage`: facade that picks backends and manages fallback
//!
//! # Example
//!
//! ```no_run
//! use libbizlink::secure_store::{SecureStorage, SecureStoreConfig, StorageBackend};
//!
//! # fn example() -> libbizlink::Result<()> {
//! let config = SecureStoreConfig {
//!     storage: StorageBackend::Keyring,
//!     ..SecureStoreConfig::default()
//! };
//!
//! let storage = SecureStorage::new(config)?;
//! storage.set("authToken", "t1")?;
//! assert_eq!(storage.get("authToken")?.as_deref(), Some("t1"));
//! storage.delete("authToken")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SecureStoreError};

/// Namespace used for keyring entries and encrypted file names
pub const SERVICE_NAME: &str = "bizlink";

/// Keys mirrored from the session slice
pub mod keys {
    pub const AUTH_TOKEN: &str = "authToken";
    pub const USER_ID: &str = "userId";
    pub const EMAIL: &str = "email";
    pub const IS_AUTHENTICATED: &str = "isAuthenticated";

    pub const SESSION: [&str; 4] = [AUTH_TOKEN, USER_ID, EMAIL, IS_AUTHENTICATED];
}

/// Trait for secure storage backends
///
/// Reading a missing key yields `Ok(None)`; deleting a missing key is not an
/// error.
pub trait SecureStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Remove `key`
    fn delete(&self, key: &str) -> Result<()>;

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Backend identifier for logging ("keyring", "encrypted_file", "memory")
    fn backend_name(&self) -> &str;
}

/// OS-native keyring storage backend
///
/// - **macOS**: Keychain
/// - **Windows**: Credential Manager
/// - **Linux**: Secret Service (GNOME Keyring/KWallet) via D-Bus
///
/// Headless systems and containers frequently lack a keyring; construction
/// then fails with `SecureStoreError::KeyringUnavailable`.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: &str) -> Result<Self> {
        match keyring::Entry::new(service, "availability_check") {
            Ok(_) => Ok(Self {
                service: service.to_string(),
            }),
            Err(e) => Err(SecureStoreError::KeyringUnavailable(format!(
                "OS keyring not accessible: {}",
                e
            ))
            .into()),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, key)
            .map_err(|e| SecureStoreError::KeyringUnavailable(e.to_string()).into())
    }
}

impl SecureStore for KeyringStore {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| SecureStoreError::Keyring(e.to_string()))?;

        tracing::debug!("Stored {}.{} in OS keyring", self.service, key);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SecureStoreError::Keyring(e.to_string()).into()),
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_password() {
            Ok(_) => {
                tracing::debug!("Deleted {}.{} from OS keyring", self.service, key);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SecureStoreError::Keyring(e.to_string()).into()),
        }
    }

    fn backend_name(&self) -> &str {
        "keyring"
    }
}

/// Refuse to read secrets through a symbolic link
pub fn validate_not_symlink(path: &Path) -> Result<()> {
    let metadata = std::fs::symlink_metadata(path).map_err(SecureStoreError::Io)?;

    if metadata.is_symlink() {
        return Err(SecureStoreError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "Secure storage file '{}' is a symbolic link; refusing to read it",
                path.display()
            ),
        ))
        .into());
    }

    Ok(())
}

/// Encrypted file storage backend
///
/// Each key lives in its own `{service}.{key}.age` file under `base_path`,
/// encrypted with the master password (age passphrase mode). Files are
/// created with mode 600 on Unix.
pub struct EncryptedFileStore {
    base_path: PathBuf,
    service: String,
    master_password: RwLock<Option<SecretString>>,
}

impl EncryptedFileStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            service: SERVICE_NAME.to_string(),
            master_password: RwLock::new(None),
        }
    }

    /// Set the master password for encryption/decryption
    ///
    /// # Errors
    ///
    /// Returns `SecureStoreError::WeakPassword` if the password is shorter
    /// than 8 characters.
    pub fn set_master_password(&self, password: SecretString) -> Result<()> {
        if password.expose_secret().chars().count() < 8 {
            return Err(SecureStoreError::WeakPassword.into());
        }

        *self
            .master_password
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(password);
        tracing::debug!("Master password set for encrypted file store");
        Ok(())
    }

    fn passphrase(&self) -> Result<age::secrecy::Secret<String>> {
        let guard = self
            .master_password
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let password = guard
            .as_ref()
            .ok_or(SecureStoreError::MasterPasswordNotSet)?;
        Ok(age::secrecy::Secret::new(
            password.expose_secret().to_string(),
        ))
    }

    fn encrypt(&self, data: &str) -> Result<Vec<u8>> {
        let encryptor = age::Encryptor::with_user_passphrase(self.passphrase()?);

        let mut encrypted = vec![];
        let mut writer = encryptor
            .wrap_output(&mut encrypted)
            .map_err(|e| SecureStoreError::Encryption(e.to_string()))?;

        writer
            .write_all(data.as_bytes())
            .map_err(|e| SecureStoreError::Encryption(e.to_string()))?;

        writer
            .finish()
            .map_err(|e| SecureStoreError::Encryption(e.to_string()))?;

        Ok(encrypted)
    }

    fn decrypt(&self, data: &[u8]) -> Result<String> {
        let passphrase = self.passphrase()?;

        let decryptor = match age::Decryptor::new(data) {
            Ok(age::Decryptor::Passphrase(d)) => d,
            Ok(_) => {
                return Err(SecureStoreError::Encryption(
                    "Invalid encryption format (expected passphrase)".to_string(),
                )
                .into())
            }
            Err(e) => return Err(SecureStoreError::Encryption(e.to_string()).into()),
        };

        let mut decrypted = vec![];
        let mut reader = decryptor.decrypt(&passphrase, None).map_err(|e| {
            if e.to_string().contains("decryption") || e.to_string().contains("MAC") {
                SecureStoreError::DecryptionFailed
            } else {
                SecureStoreError::Encryption(e.to_string())
            }
        })?;

        reader
            .read_to_end(&mut decrypted)
            .map_err(|e| SecureStoreError::Encryption(e.to_string()))?;

        String::from_utf8(decrypted)
            .map_err(|e| SecureStoreError::Encryption(format!("Invalid UTF-8: {}", e)).into())
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.{}.age", self.service, key))
    }
}

impl SecureStore for EncryptedFileStore {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let encrypted = self.encrypt(value)?;
        let file_path = self.file_path(key);

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).map_err(SecureStoreError::Io)?;
        }

        std::fs::write(&file_path, encrypted).map_err(SecureStoreError::Io)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&file_path, perms).map_err(SecureStoreError::Io)?;
        }

        tracing::debug!("Stored encrypted {} at {:?}", key, file_path);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let file_path = self.file_path(key);

        if std::fs::symlink_metadata(&file_path).is_err() {
            return Ok(None);
        }

        validate_not_symlink(&file_path)?;

        let encrypted = std::fs::read(&file_path).map_err(SecureStoreError::Io)?;
        self.decrypt(&encrypted).map(Some)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let file_path = self.file_path(key);

        if file_path.exists() {
            std::fs::remove_file(&file_path).map_err(SecureStoreError::Io)?;
            tracing::debug!("Deleted encrypted {} at {:?}", key, file_path);
        }

        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.file_path(key).exists())
    }

    fn backend_name(&self) -> &str {
        "encrypted_file"
    }
}

/// In-process backend; contents vanish with the process
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SecureStore for MemoryStore {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

/// Storage backend type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// OS-native keyring
    #[default]
    Keyring,
    /// Encrypted files with master password
    Encrypted,
    /// Process memory only
    Memory,
}

/// Secure storage configuration (`[credentials]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecureStoreConfig {
    #[serde(default)]
    pub storage: StorageBackend,

    /// Directory for encrypted files (keyring doesn't use files)
    #[serde(default = "default_secure_store_path")]
    pub path: String,

    /// Master password for encrypted storage (never serialized)
    #[serde(skip)]
    pub master_password: Option<SecretString>,
}

fn default_secure_store_path() -> String {
    "~/.config/bizlink/secure".to_string()
}

impl Default for SecureStoreConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Keyring,
            path: default_secure_store_path(),
            master_password: None,
        }
    }
}

impl SecureStoreConfig {
    /// Load master password from `BIZLINK_MASTER_PASSWORD` if set
    pub fn load_master_password_from_env(&mut self) {
        if let Ok(password) = std::env::var("BIZLINK_MASTER_PASSWORD") {
            if !password.is_empty() {
                self.master_password = Some(SecretString::from(password));
                tracing::debug!("Loaded master password from BIZLINK_MASTER_PASSWORD");
            }
        }
    }

    /// Expand `~` in the encrypted-file path
    pub fn expand_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).to_string())
    }
}

/// Secure storage facade
///
/// Builds a priority list of backends from configuration:
///
/// 1. `KeyringStore` (if configured and available)
/// 2. `EncryptedFileStore` (if configured, or as keyring fallback when a
///    master password is available)
/// 3. `MemoryStore` (only when explicitly configured)
///
/// Writes go to the primary backend, reads return the first hit, deletes
/// hit every backend.
pub struct SecureStorage {
    stores: Vec<Box<dyn SecureStore>>,
}

impl SecureStorage {
    pub fn new(config: SecureStoreConfig) -> Result<Self> {
        let mut stores: Vec<Box<dyn SecureStore>> = vec![];

        match config.storage {
            StorageBackend::Memory => {
                tracing::info!("Using in-memory secure storage; session will not survive restart");
                stores.push(Box::new(MemoryStore::new()));
            }
            StorageBackend::Keyring => match KeyringStore::new(SERVICE_NAME) {
                Ok(store) => {
                    tracing::info!("Using OS keyring for secure storage");
                    stores.push(Box::new(store));
                }
                Err(e) => {
                    tracing::warn!("{}. Falling back to encrypted files.", e);
                }
            },
            StorageBackend::Encrypted => {}
        }

        if config.storage == StorageBackend::Encrypted
            || (config.storage == StorageBackend::Keyring && stores.is_empty())
        {
            let encrypted_store = EncryptedFileStore::new(config.expand_path());

            match Self::master_password(&config) {
                Some(password) => {
                    encrypted_store.set_master_password(password)?;
                    tracing::info!("Using encrypted file storage for secrets");
                    stores.push(Box::new(encrypted_store));
                }
                None => {
                    tracing::error!(
                        "Master password not set and no TTY available. No secure storage available."
                    );
                }
            }
        }

        if stores.is_empty() {
            return Err(SecureStoreError::NoStoreAvailable.into());
        }

        Ok(Self { stores })
    }

    /// Build a facade over explicit backends, in priority order
    pub fn from_stores(stores: Vec<Box<dyn SecureStore>>) -> Result<Self> {
        if stores.is_empty() {
            return Err(SecureStoreError::NoStoreAvailable.into());
        }
        Ok(Self { stores })
    }

    /// Single in-memory backend
    pub fn in_memory() -> Self {
        Self {
            stores: vec![Box::new(MemoryStore::new())],
        }
    }

    fn master_password(config: &SecureStoreConfig) -> Option<SecretString> {
        if let Some(password) = &config.master_password {
            return Some(password.clone());
        }

        if !atty::is(atty::Stream::Stdin) {
            return None;
        }

        match rpassword::prompt_password("Enter master password for secure storage: ") {
            Ok(password) if !password.is_empty() => Some(SecretString::from(password)),
            Ok(_) => {
                tracing::error!("Empty master password provided");
                None
            }
            Err(e) => {
                tracing::error!("Failed to prompt for master password: {}", e);
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let store = self
            .stores
            .first()
            .ok_or(SecureStoreError::NoStoreAvailable)?;
        store.set(key, value)?;
        tracing::debug!("Stored {} using {} backend", key, store.backend_name());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        for store in &self.stores {
            if let Some(value) = store.get(key)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        for store in &self.stores {
            store.delete(key)?;
        }
        Ok(())
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        for store in &self.stores {
            if store.exists(key)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn backends(&self) -> Vec<&str> {
        self.stores.iter().map(|s| s.backend_name()).collect()
    }

    pub fn primary_backend(&self) -> Option<&str> {
        self.stores.first().map(|s| s.backend_name())
    }
}
