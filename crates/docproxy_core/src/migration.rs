//! Schema migration support.
//!
//! Migrations are:
//! - **Forward-only**: a stored version newer than the current one is
//!   rejected, there is no downgrade path
//! - **Single-call**: the read pipeline calls [`DocumentSchema::migrate`]
//!   exactly once per read, which must bring the document all the way to
//!   the current version
//! - **Staged**: migration runs on the freshly decoded copy, never on the
//!   authoritative in-memory document
//!
//! Schemas that evolve one version at a time can build their `migrate` from
//! a [`MigrationChain`].
//!
//! ## Usage
//!
//! ```
//! use docproxy_core::{MigrationChain, VerifyResult};
//! use serde_json::json;
//!
//! let chain = MigrationChain::new(3)
//!     .step(1, |doc| {
//!         doc["theme"] = json!("dark");
//!         VerifyResult::good()
//!     })
//!     .step(2, |doc| {
//!         doc["language"] = json!("en");
//!         VerifyResult::good()
//!     });
//!
//! let mut doc = json!({ "version": 1 });
//! assert!(chain.run(&mut doc).is_good());
//! assert_eq!(doc, json!({ "version": 3, "theme": "dark", "language": "en" }));
//! ```

use crate::error::{ProxyError, ProxyResult};
use crate::schema::{document_version, DocumentSchema, VERSION_FIELD};
use crate::verify::VerifyResult;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Version number of a document schema.
pub type SchemaVersion = u64;

/// How the stored version was reconciled with the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionResolution {
    /// The stored document was already at the current version.
    Current,
    /// The stored document was migrated from an older version.
    Migrated {
        /// Version found in storage.
        from: SchemaVersion,
    },
}

/// Reconciles a staged document's version with the schema's current one.
///
/// Older documents are passed to [`DocumentSchema::migrate`] exactly once.
/// The caller must have checked the basic structure already.
///
/// # Errors
///
/// - [`ProxyError::StructuralInvalid`] if `staged` has no valid version
/// - [`ProxyError::VersionTooNew`] if the stored version is newer
/// - [`ProxyError::MigrationFailure`] if the migration reports failure
pub fn resolve_version<S: DocumentSchema + ?Sized>(
    schema: &S,
    staged: &mut Value,
) -> ProxyResult<VersionResolution> {
    let stored = document_version(staged)
        .ok_or_else(|| ProxyError::structural("Data has no valid version"))?;
    let current = schema.current_version();

    if stored > current {
        return Err(ProxyError::VersionTooNew { stored, current });
    }
    if stored == current {
        return Ok(VersionResolution::Current);
    }

    tracing::info!(from = stored, to = current, "migrating document");
    schema
        .migrate(staged)
        .into_result(|reason| ProxyError::MigrationFailure {
            from: stored,
            reason,
        })?;
    Ok(VersionResolution::Migrated { from: stored })
}

type MigrationStep = Box<dyn Fn(&mut Value) -> VerifyResult + Send + Sync>;

/// Composes single-version upgrade steps into one migration.
///
/// A step registered for version `n` upgrades a document from `n` to
/// `n + 1`; the chain stamps the new version after each step, so steps only
/// touch the fields they change.
pub struct MigrationChain {
    target: SchemaVersion,
    steps: BTreeMap<SchemaVersion, MigrationStep>,
}

impl MigrationChain {
    /// Creates an empty chain upgrading to `target`.
    #[must_use]
    pub fn new(target: SchemaVersion) -> Self {
        Self {
            target,
            steps: BTreeMap::new(),
        }
    }

    /// Adds the step upgrading from `from` to `from + 1`, replacing any
    /// step already registered for `from`.
    #[must_use]
    pub fn step(
        mut self,
        from: SchemaVersion,
        step: impl Fn(&mut Value) -> VerifyResult + Send + Sync + 'static,
    ) -> Self {
        self.steps.insert(from, Box::new(step));
        self
    }

    /// Registers the step upgrading from `from` to `from + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::MigrationFailure`] if a step for `from` is
    /// already registered or `from` is not below the target.
    pub fn register(
        &mut self,
        from: SchemaVersion,
        step: impl Fn(&mut Value) -> VerifyResult + Send + Sync + 'static,
    ) -> ProxyResult<()> {
        if from >= self.target {
            return Err(ProxyError::MigrationFailure {
                from,
                reason: format!("step starts at or above target version {}", self.target),
            });
        }
        if self.steps.contains_key(&from) {
            return Err(ProxyError::MigrationFailure {
                from,
                reason: "step already registered".to_string(),
            });
        }
        self.steps.insert(from, Box::new(step));
        Ok(())
    }

    /// The version this chain upgrades to.
    #[must_use]
    pub fn target(&self) -> SchemaVersion {
        self.target
    }

    /// Checks that every version from `oldest` up to the target has a step.
    pub fn validate(&self, oldest: SchemaVersion) -> VerifyResult {
        match (oldest..self.target).find(|v| !self.steps.contains_key(v)) {
            Some(gap) => VerifyResult::bad(format!("no migration step from version {gap}")),
            None => VerifyResult::good(),
        }
    }

    /// Runs every step from the document's version up to the target.
    ///
    /// Stops at the first failing step. The document may be partially
    /// upgraded afterwards, so run this on a staged copy.
    pub fn run(&self, document: &mut Value) -> VerifyResult {
        let Some(mut version) = document_version(document) else {
            return VerifyResult::bad("document has no valid version");
        };
        if version > self.target {
            return VerifyResult::bad(format!(
                "document version {version} is newer than target {}",
                self.target
            ));
        }
        while version < self.target {
            let Some(step) = self.steps.get(&version) else {
                return VerifyResult::bad(format!("no migration step from version {version}"));
            };
            if let VerifyResult::Bad(reason) = step(document) {
                return VerifyResult::bad(format!(
                    "step {version} -> {}: {reason}",
                    version + 1
                ));
            }
            version += 1;
            match document.as_object_mut() {
                Some(map) => {
                    map.insert(VERSION_FIELD.to_string(), Value::from(version));
                }
                None => return VerifyResult::bad("migration step replaced the document object"),
            }
            tracing::debug!(version, "migration step applied");
        }
        VerifyResult::good()
    }
}

impl fmt::Debug for MigrationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationChain")
            .field("target", &self.target)
            .field("steps", &self.steps.keys().collect::<Vec<_>>())
            .finish()
    }
}
