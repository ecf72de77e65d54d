//! Extension Registry
//!
//! Holds the active expression provider. Installation normally happens
//! once while the host starts up; every template evaluation afterwards only
//! reads. A provider can also be registered for one exact expression
//! version, in which case it wins over the active provider for that version.

use crate::ExpressionProvider;
use stencil_core::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Registry of expression providers
pub struct ExtensionRegistry {
    active: RwLock<Option<Arc<dyn ExpressionProvider>>>,
    versioned: RwLock<HashMap<String, Arc<dyn ExpressionProvider>>>,
}

static GLOBAL: OnceLock<Arc<ExtensionRegistry>> = OnceLock::new();

// Poisoned locks are recovered: the slots only ever hold complete `Arc`s.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self {
            active: RwLock::new(None),
            versioned: RwLock::new(HashMap::new()),
        }
    }

    /// Process-wide registry for hosts that do not pass one around.
    pub fn global() -> Arc<ExtensionRegistry> {
        GLOBAL.get_or_init(|| Arc::new(ExtensionRegistry::new())).clone()
    }

    pub fn with_provider<P: ExpressionProvider + 'static>(self, provider: P) -> Self {
        self.install(provider);
        self
    }

    pub fn with_versioned_provider<P: ExpressionProvider + 'static>(
        self,
        version: impl Into<String>,
        provider: P,
    ) -> Self {
        self.install_for_version(version, provider);
        self
    }

    /// Replace the active provider. Returns the previous one.
    pub fn install<P: ExpressionProvider + 'static>(
        &self,
        provider: P,
    ) -> Option<Arc<dyn ExpressionProvider>> {
        self.install_shared(Arc::new(provider))
    }

    /// Replace the active provider with one the caller keeps a handle to.
    pub fn install_shared(
        &self,
        provider: Arc<dyn ExpressionProvider>,
    ) -> Option<Arc<dyn ExpressionProvider>> {
        debug!(provider = provider.meta().name, "installing expression provider");
        write(&self.active).replace(provider)
    }

    /// Clear the active provider. Returns the previous one.
    pub fn uninstall(&self) -> Option<Arc<dyn ExpressionProvider>> {
        let previous = write(&self.active).take();
        if let Some(p) = &previous {
            debug!(provider = p.meta().name, "uninstalled expression provider");
        }
        previous
    }

    pub fn install_for_version<P: ExpressionProvider + 'static>(
        &self,
        version: impl Into<String>,
        provider: P,
    ) -> Option<Arc<dyn ExpressionProvider>> {
        self.install_shared_for_version(version, Arc::new(provider))
    }

    pub fn install_shared_for_version(
        &self,
        version: impl Into<String>,
        provider: Arc<dyn ExpressionProvider>,
    ) -> Option<Arc<dyn ExpressionProvider>> {
        let version = version.into();
        debug!(provider = provider.meta().name, version = %version, "installing versioned expression provider");
        write(&self.versioned).insert(version, provider)
    }

    pub fn uninstall_version(&self, version: &str) -> Option<Arc<dyn ExpressionProvider>> {
        write(&self.versioned).remove(version)
    }

    /// The active provider, if any.
    pub fn active_provider(&self) -> Option<Arc<dyn ExpressionProvider>> {
        read(&self.active).clone()
    }

    /// Provider responsible for `version`: the one registered for exactly
    /// that version, otherwise the active provider.
    pub fn provider_for(&self, version: Option<&str>) -> Option<Arc<dyn ExpressionProvider>> {
        if let Some(v) = version {
            if let Some(p) = read(&self.versioned).get(v) {
                return Some(p.clone());
            }
        }
        self.active_provider()
    }

    pub fn has_provider(&self) -> bool {
        read(&self.active).is_some() || !read(&self.versioned).is_empty()
    }

    /// Versions that have a dedicated provider, sorted.
    pub fn versions(&self) -> Vec<String> {
        let mut versions: Vec<String> = read(&self.versioned).keys().cloned().collect();
        versions.sort();
        versions
    }

    /// Summary of what is installed.
    pub fn describe(&self) -> Value {
        let mut info = BTreeMap::new();

        info.insert(
            "active".to_string(),
            self.active_provider()
                .map_or(Value::Null, |p| Value::Text(p.meta().name.to_string())),
        );

        let versioned: BTreeMap<String, Value> = read(&self.versioned)
            .iter()
            .map(|(v, p)| (v.clone(), Value::Text(p.meta().name.to_string())))
            .collect();
        info.insert("versions".to_string(), Value::Object(versioned));

        Value::Object(info)
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("active", &self.active_provider().map(|p| p.meta().name))
            .field("versions", &self.versions())
            .finish()
    }
}
