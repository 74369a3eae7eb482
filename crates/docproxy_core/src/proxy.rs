//! The document proxy: one named, versioned document backed by storage.

use crate::config::ProxyConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::read::{ReadOutcome, ReadPipeline, ReadStage};
use crate::scheduler::WriteScheduler;
use crate::schema::DocumentSchema;
use crate::verify::{gate, verify_entry};
use docproxy_codec::FrameCodec;
use docproxy_storage::StorageBackend;
use parking_lot::RwLock;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reads and writes one document through a storage backend.
///
/// The proxy owns the authoritative in-memory copy of the document. The
/// application mutates it with [`update`](Self::update) and asks for it to
/// be stored with [`persist`](Self::persist); [`read`](Self::read) replaces
/// it with the stored copy, upgraded to the current schema version.
///
/// Cloning the proxy is cheap and yields a handle on the same document.
///
/// # Concurrency
///
/// The proxy does not arbitrate between a read and a pending write on the
/// same document: a read that completes while a flush is pending replaces
/// the document that flush will write. Owners serialize their own
/// read/mutate/persist sequences.
///
/// # Example
///
/// ```
/// use docproxy_codec::{FrameCodec, Salt};
/// use docproxy_core::{DocumentProxy, DocumentSchema, ProxyConfig, VerifyResult};
/// use docproxy_storage::InMemoryBackend;
/// use serde_json::{json, Value};
///
/// struct Counter;
///
/// impl DocumentSchema for Counter {
///     fn current_version(&self) -> u64 { 1 }
///     fn default_data(&self) -> Value { json!({ "version": 1, "count": 0 }) }
///     fn verify(&self, doc: &Value) -> VerifyResult {
///         if doc["count"].is_u64() { VerifyResult::good() } else { VerifyResult::bad("count") }
///     }
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let proxy = DocumentProxy::new(
///     "counter.bin",
///     Counter,
///     InMemoryBackend::new(),
///     FrameCodec::new(Salt::new("salt")),
///     ProxyConfig::default(),
/// )
/// .unwrap();
///
/// proxy.read().await.unwrap();
/// proxy.update(|doc| doc["count"] = json!(1));
/// proxy.persist().await.unwrap();
/// # });
/// ```
pub struct DocumentProxy<S, B> {
    inner: Arc<Inner<S, B>>,
}

struct Inner<S, B> {
    name: String,
    schema: S,
    backend: B,
    codec: FrameCodec,
    config: ProxyConfig,
    document: RwLock<Value>,
    scheduler: WriteScheduler,
}

impl<S, B> Clone for DocumentProxy<S, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, B> DocumentProxy<S, B>
where
    S: DocumentSchema,
    B: StorageBackend + 'static,
{
    /// Creates a proxy for the document stored under `name`.
    ///
    /// The in-memory document starts as the schema's default data; call
    /// [`read`](Self::read) to restore the stored copy.
    ///
    /// # Errors
    ///
    /// In debug mode, returns [`ProxyError::SemanticInvalid`] if the
    /// schema's default data does not pass its own verification.
    pub fn new(
        name: impl Into<String>,
        schema: S,
        backend: B,
        codec: FrameCodec,
        config: ProxyConfig,
    ) -> ProxyResult<Self> {
        let name = name.into();
        let defaults = schema.default_data();

        if config.debug {
            if let Some(reason) = verify_entry(&schema, &defaults).reason() {
                error!(name = %name, reason, "default data failed self-test");
                return Err(ProxyError::semantic(format!(
                    "verify() failed for default data: {reason}"
                )));
            }
        }

        let scheduler = WriteScheduler::new(config.coalesce_window);
        Ok(Self {
            inner: Arc::new(Inner {
                name,
                schema,
                backend,
                codec,
                config,
                document: RwLock::new(defaults),
                scheduler,
            }),
        })
    }

    /// Returns the storage name of the document.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &S {
        &self.inner.schema
    }

    /// Returns the storage backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Returns the frame codec.
    #[must_use]
    pub fn codec(&self) -> &FrameCodec {
        &self.inner.codec
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ProxyConfig {
        &self.inner.config
    }

    /// Returns the write scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &WriteScheduler {
        &self.inner.scheduler
    }

    /// Returns a copy of the in-memory document.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        self.inner.document.read().clone()
    }

    /// Mutates the in-memory document in place.
    pub fn update<R>(&self, mutate: impl FnOnce(&mut Value) -> R) -> R {
        mutate(&mut self.inner.document.write())
    }

    /// Replaces the in-memory document, returning the previous one.
    pub fn replace(&self, document: Value) -> Value {
        std::mem::replace(&mut *self.inner.document.write(), document)
    }

    /// Checks the in-memory document against the verification gate.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::StructuralInvalid`] or
    /// [`ProxyError::SemanticInvalid`] describing the failure.
    pub fn verify_current(&self) -> ProxyResult<()> {
        self.inner.verify_current()
    }

    /// Restores the document from storage.
    ///
    /// On success the stored document (upgraded to the current version if
    /// needed) becomes the in-memory document. If nothing is stored, the
    /// schema's default data does. On failure the in-memory document is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// Returns the error of the first read stage that rejected.
    pub async fn read(&self) -> ProxyResult<ReadOutcome> {
        let inner = &self.inner;
        let pipeline = ReadPipeline::new(
            &inner.name,
            &inner.schema,
            &inner.backend,
            &inner.codec,
            inner.config.debug,
        );
        let outcome = match pipeline.run().await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(name = %inner.name, error = %err, "failed to read document");
                return Err(err);
            }
        };

        *inner.document.write() = outcome.document.clone();
        debug!(name = %inner.name, stage = %ReadStage::Committed, "read stage");
        info!(
            name = %inner.name,
            version = outcome.version(),
            origin = ?outcome.origin,
            migrated_from = outcome.migrated_from(),
            "read document"
        );
        Ok(outcome)
    }

    /// Requests that the in-memory document be written to storage.
    ///
    /// The document is verified immediately; an invalid document is
    /// rejected without touching the backend. Otherwise the write joins the
    /// open coalescing window, restarting it, or opens one. The returned future
    /// resolves with the outcome of the flush that window produces. The
    /// flush writes the document as it is when the window closes.
    ///
    /// Verification and scheduling happen when this method is called, not
    /// when the returned future is first polled.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn persist(&self) -> impl Future<Output = ProxyResult<()>> + Send + 'static {
        let ticket = self.inner.verify_current().map(|()| {
            let inner = Arc::clone(&self.inner);
            self.inner
                .scheduler
                .schedule(move || async move { inner.flush().await })
        });
        async move { ticket?.wait().await }
    }

    /// Writes the in-memory document now, bypassing the coalescing window.
    ///
    /// # Errors
    ///
    /// Returns a verification error if the document is invalid, an
    /// encoding error, or [`ProxyError::BackendFailure`] if the write
    /// failed. Nothing is retried.
    pub async fn flush(&self) -> ProxyResult<()> {
        self.inner.flush().await
    }

    /// Deletes the stored document. The in-memory document is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::BackendFailure`] if the backend delete fails,
    /// including when nothing was stored.
    pub async fn delete(&self) -> ProxyResult<()> {
        let inner = &self.inner;
        inner
            .backend
            .delete(&inner.name)
            .await
            .map_err(|err| ProxyError::backend(inner.name.as_str(), err))?;
        info!(name = %inner.name, "deleted document");
        Ok(())
    }

    /// Replaces the in-memory document with default data and persists it.
    pub fn reset(&self) -> impl Future<Output = ProxyResult<()>> + Send + 'static {
        warn!(name = %self.inner.name, "reset data to default");
        self.replace(self.inner.schema.default_data());
        self.persist()
    }

    /// Waits until the most recently scheduled flush has settled.
    ///
    /// # Errors
    ///
    /// Returns the outcome of that flush if it failed.
    pub async fn settled(&self) -> ProxyResult<()> {
        self.inner.scheduler.settled().await
    }
}

impl<S, B> Inner<S, B>
where
    S: DocumentSchema,
    B: StorageBackend + 'static,
{
    fn verify_current(&self) -> ProxyResult<()> {
        let document = self.document.read();
        gate(&self.schema, &document).inspect_err(|err| {
            error!(name = %self.name, reason = %err, "tried to write invalid data");
        })
    }

    async fn flush(&self) -> ProxyResult<()> {
        let document = self.document.read().clone();
        // Mutations since `persist` may have invalidated the document.
        gate(&self.schema, &document).inspect_err(|err| {
            error!(name = %self.name, reason = %err, "document became invalid before flush");
        })?;

        let frame = if self.config.offload_compression {
            let codec = self.codec.clone();
            tokio::task::spawn_blocking(move || codec.encode(&document))
                .await
                .map_err(|_| ProxyError::FlushAborted)??
        } else {
            self.codec.encode(&document)?
        };

        if let Err(err) = self.backend.write(&self.name, &frame).await {
            error!(name = %self.name, error = %err, "failed to write document");
            return Err(ProxyError::backend(self.name.as_str(), err));
        }
        info!(name = %self.name, bytes = frame.len(), "wrote document");
        Ok(())
    }
}

impl<S, B> std::fmt::Debug for DocumentProxy<S, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentProxy")
            .field("name", &self.inner.name)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
