use {
    crate::{Error, Result},
    byte_unit::Byte,
    serde::Deserialize,
    std::time::Duration,
};

/// Configuration of the response optimizer.
///
/// The optimizer is only installed when this section is present.
///
/// ```toml
/// [http.optimizer]
/// minify = true
/// compress = true
/// default_cache_timeout = "24h"
/// max_buffer_size = "8MiB"
///
/// [http.optimizer.cache]
/// redis_url = "{{ REDIS_URL }}"
/// namespace = "ResponseOptimizer_Caching"
/// sweep_interval = "10m"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HttpOptimizerConfig {
    /// Minify HTML responses. Defaults to true.
    #[serde(default = "HttpOptimizerConfig::default_true")]
    pub minify: bool,

    /// Gzip responses for clients that accept it. Defaults to true.
    #[serde(default = "HttpOptimizerConfig::default_true")]
    pub compress: bool,

    /// Cache lifetime used by `Optimize::cache()` when no explicit duration
    /// is given. Defaults to 24 hours.
    #[serde(
        default = "HttpOptimizerConfig::default_cache_timeout",
        with = "humantime_serde"
    )]
    pub default_cache_timeout: Duration,

    /// Largest response body the optimizer will buffer. Bigger or unsized
    /// bodies are streamed through untouched. Defaults to 8MiB.
    #[serde(default = "HttpOptimizerConfig::default_max_buffer_size")]
    pub max_buffer_size: Byte,

    #[serde(default)]
    pub cache: OptimizerCacheConfig,
}

impl HttpOptimizerConfig {
    fn default_true() -> bool {
        true
    }

    fn default_cache_timeout() -> Duration {
        Duration::from_secs(24 * 60 * 60)
    }

    fn default_max_buffer_size() -> Byte {
        Byte::from_u64(8 * 1024 * 1024)
    }

    pub fn with_minify(mut self, enable: bool) -> Self {
        self.minify = enable;
        self
    }

    pub fn with_compress(mut self, enable: bool) -> Self {
        self.compress = enable;
        self
    }

    pub fn with_default_cache_timeout(mut self, timeout: Duration) -> Self {
        self.default_cache_timeout = timeout;
        self
    }

    pub fn with_max_buffer_size(mut self, size: u64) -> Self {
        self.max_buffer_size = Byte::from_u64(size);
        self
    }

    pub fn with_cache(mut self, cache: OptimizerCacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_buffer_size.as_u64() == 0 {
            return Err(Error::invalid_input(
                "[http.optimizer] max_buffer_size must be > 0, e.g. max_buffer_size = \"8MiB\"",
            ));
        }
        self.cache.validate()
    }
}

impl Default for HttpOptimizerConfig {
    fn default() -> Self {
        Self {
            minify: true,
            compress: true,
            default_cache_timeout: Self::default_cache_timeout(),
            max_buffer_size: Self::default_max_buffer_size(),
            cache: OptimizerCacheConfig::default(),
        }
    }
}

/// Cache backend selection for the optimizer.
///
/// Without a `redis_url` (or with an empty one, which is what an unset
/// `{{ REDIS_URL }}` expands to) the in-process store is used.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerCacheConfig {
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Redis hash holding the cached responses.
    #[serde(default = "OptimizerCacheConfig::default_namespace")]
    pub namespace: String,

    /// Interval of the optional expired-entry sweeper. Expired entries are
    /// otherwise only dropped when they are read or overwritten.
    #[serde(default, with = "humantime_serde")]
    pub sweep_interval: Option<Duration>,
}

impl OptimizerCacheConfig {
    fn default_namespace() -> String {
        "ResponseOptimizer_Caching".into()
    }

    /// The configured Redis URL, ignoring blank values.
    pub fn redis_url(&self) -> Option<&str> {
        self.redis_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(Error::invalid_input(
                "[http.optimizer.cache] namespace must not be empty",
            ));
        }
        if self.sweep_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(Error::invalid_input(
                "[http.optimizer.cache] sweep_interval must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Default for OptimizerCacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            namespace: Self::default_namespace(),
            sweep_interval: None,
        }
    }
}
