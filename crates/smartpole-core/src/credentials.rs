// ── Collaborator seams ──
//
// The settings store and the password cipher sit outside the core. The
// core only sees these traits; `smartpole-config` supplies the file-backed
// and AEAD implementations.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use secrecy::SecretString;

use crate::config::SyncConfig;
use crate::error::CoreError;

/// Reversible protection for the stored console password.
pub trait PasswordCipher: Send + Sync {
    /// Encrypt a plaintext password into its stored (text) form.
    fn encrypt(&self, plaintext: &SecretString) -> Result<String, CoreError>;

    /// Recover the plaintext from its stored form.
    fn decrypt(&self, ciphertext: &str) -> Result<SecretString, CoreError>;
}

/// Source of truth for connection settings and the asset/device tree.
///
/// The core reads a full snapshot with [`get`](Self::get) and writes a full
/// snapshot back with [`persist`](Self::persist); it never edits storage
/// in place.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Result<SyncConfig, CoreError>;

    fn persist(&self, config: &SyncConfig) -> Result<(), CoreError>;
}

/// Process-local store. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    config: RwLock<SyncConfig>,
}

impl MemoryStore {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self) -> Result<SyncConfig, CoreError> {
        self.config
            .read()
            .map(|c| c.clone())
            .map_err(|_| CoreError::Persistence {
                message: "configuration lock poisoned".into(),
            })
    }

    fn persist(&self, config: &SyncConfig) -> Result<(), CoreError> {
        let mut guard = self.config.write().map_err(|_| CoreError::Persistence {
            message: "configuration lock poisoned".into(),
        })?;
        *guard = config.clone();
        Ok(())
    }
}

/// Serializes read-modify-write cycles on a [`CredentialStore`].
///
/// Every core writer goes through [`modify`](Self::modify), so two
/// concurrent edits (a sync and a toggle, say) never read the same snapshot
/// and overwrite each other. Plain reads stay lock-free.
pub struct ConfigWriter {
    store: Arc<dyn CredentialStore>,
    lock: Mutex<()>,
}

impl ConfigWriter {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    pub fn get(&self) -> Result<SyncConfig, CoreError> {
        self.store.get()
    }

    /// Load the stored snapshot, apply `edit`, and persist the result.
    ///
    /// Nothing is written when `edit` fails.
    pub fn modify<T>(
        &self,
        edit: impl FnOnce(&mut SyncConfig) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        // The guarded value is `()`: a panicking writer leaves nothing torn.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut config = self.store.get()?;
        let out = edit(&mut config)?;
        self.store.persist(&config)?;
        Ok(out)
    }
}

impl std::fmt::Debug for ConfigWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWriter").finish_non_exhaustive()
    }
}
