//! Proxy configuration.

use std::time::Duration;

/// Default window in which `persist` calls are coalesced into one write.
pub const DEFAULT_COALESCE_WINDOW: Duration = Duration::from_millis(50);

/// Configuration for a [`crate::DocumentProxy`].
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// How long a flush waits for further `persist` calls before writing.
    pub coalesce_window: Duration,

    /// Development mode.
    ///
    /// Accepts uncompressed raw JSON on read and self-tests the schema's
    /// default data at construction. Never enable in production.
    pub debug: bool,

    /// Whether to run frame encoding on the blocking thread pool.
    pub offload_compression: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            coalesce_window: DEFAULT_COALESCE_WINDOW,
            debug: false,
            offload_compression: false,
        }
    }
}

impl ProxyConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration with development mode following the build
    /// profile (on for debug builds).
    #[must_use]
    pub fn for_build() -> Self {
        Self::default().debug(cfg!(debug_assertions))
    }

    /// Sets the coalescing window.
    #[must_use]
    pub const fn coalesce_window(mut self, window: Duration) -> Self {
        self.coalesce_window = window;
        self
    }

    /// Sets development mode.
    #[must_use]
    pub const fn debug(mut self, value: bool) -> Self {
        self.debug = value;
        self
    }

    /// Sets whether frame encoding runs on the blocking thread pool.
    #[must_use]
    pub const fn offload_compression(mut self, value: bool) -> Self {
        self.offload_compression = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ProxyConfig::default();
        assert_eq!(config.coalesce_window, Duration::from_millis(50));
        assert!(!config.debug);
        assert!(!config.offload_compression);
    }

    #[test]
    fn builder_pattern() {
        let config = ProxyConfig::new()
            .coalesce_window(Duration::from_millis(5))
            .debug(true)
            .offload_compression(true);

        assert_eq!(config.coalesce_window, Duration::from_millis(5));
        assert!(config.debug);
        assert!(config.offload_compression);
    }

    #[test]
    fn for_build_follows_profile() {
        assert_eq!(ProxyConfig::for_build().debug, cfg!(debug_assertions));
    }
}
