//! Resolves a tenant's deployed handler source, for the engine to evaluate.

use crate::error::Result;

/// A resolved handler source, ready to hand to [`crate::engine::ScriptHost::eval`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    /// The handler module's source text.
    pub source: String,
    /// Opaque version/content identifier, for cache invalidation.
    pub version: String,
}

/// Resolves `(tenant-id, deploy-key)` pairs to a handler source. Module
/// loading and bundling live entirely outside the core; this is the single
/// seam it needs.
pub trait SourceLoader: Send + Sync {
    /// Resolves `tenant_id`'s source for `deploy_key`.
    ///
    /// # Errors
    /// Returns a not-found error if no such deployment exists, or a runtime
    /// error if the loader itself fails.
    fn resolve(&self, tenant_id: &str, deploy_key: &str) -> Result<ResolvedSource>;
}
