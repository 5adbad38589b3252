//! Bounded cache of compiled path patterns.
//!
//! Keys are `(end, strict, sensitive, template)`; two lookups with identical
//! inputs return the same `Arc<CompiledPattern>` while the entry is resident.
//! When the cache is full the least recently used entry is evicted.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use lru::LruCache;
use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::{debug, trace};

use super::compile::{path_to_regex, CompiledPattern, PatternSource, RegexOptions};
use super::matcher::{match_compiled, MatchResult, RoutePattern};
use crate::error::PatternError;
use crate::lock::{read_lock, write_lock};

/// Default number of compiled patterns kept resident.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// The structural matching flags that select a compiled form of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MatchFlags {
    pub end: bool,
    pub strict: bool,
    pub sensitive: bool,
}

impl MatchFlags {
    fn regex_options(self) -> RegexOptions {
        RegexOptions {
            end: self.end,
            strict: self.strict,
            sensitive: self.sensitive,
            ..RegexOptions::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    flags: MatchFlags,
    template: Arc<str>,
}

/// Counters exposed for observability and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub capacity: usize,
}

/// Thread-safe LRU cache of compiled templates.
pub struct PatternCache {
    // Hits peek under the read lock; only misses and recency updates write
    entries: RwLock<LruCache<CacheKey, Arc<CompiledPattern>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for PatternCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternCache")
            .field("stats", &self.stats())
            .finish()
    }
}

static SHARED: Lazy<PatternCache> = Lazy::new(PatternCache::default);

impl PatternCache {
    /// Create a cache holding at most `capacity` patterns (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Process-wide cache used by [`crate::pattern::match_path`].
    #[must_use]
    pub fn shared() -> &'static PatternCache {
        &SHARED
    }

    /// Return the cached compiled form of `template`, compiling it on a miss.
    pub fn compile(
        &self,
        template: &str,
        flags: MatchFlags,
    ) -> Result<Arc<CompiledPattern>, PatternError> {
        let key = CacheKey {
            flags,
            template: Arc::from(template),
        };

        let cached = read_lock(&self.entries).peek(&key).map(Arc::clone);
        if let Some(found) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            // Recency is best effort; skip it while another caller holds the lock
            if let Ok(mut entries) = self.entries.try_write() {
                entries.promote(&key);
            }
            trace!(template = %template, "Pattern cache hit");
            return Ok(found);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        // Compile outside the lock; another caller may race us to the insert
        let compiled = Arc::new(path_to_regex(
            &PatternSource::Path(template.to_string()),
            &flags.regex_options(),
        )?);

        let mut entries = write_lock(&self.entries);
        if let Some(existing) = entries.get(&key) {
            return Ok(Arc::clone(existing));
        }
        if let Some((evicted, _)) = entries.push(key, Arc::clone(&compiled)) {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(
                evicted = %evicted.template,
                capacity = entries.cap().get(),
                "Pattern cache full, evicted least recently used entry"
            );
        }
        debug!(
            template = %template,
            end = flags.end,
            strict = flags.strict,
            sensitive = flags.sensitive,
            regex = %compiled.as_str(),
            "Pattern cache miss, compiled template"
        );
        Ok(compiled)
    }

    /// Match `uri` against `pattern`, compiling through this cache.
    pub fn match_path(
        &self,
        uri: &str,
        pattern: &RoutePattern,
    ) -> Result<Option<MatchResult>, PatternError> {
        let flags = pattern.flags();
        for template in &pattern.paths {
            let compiled = self.compile(template, flags)?;
            if let Some(found) = match_compiled(uri, template, &compiled, pattern.exact)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let entries = read_lock(&self.entries);
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            size: entries.len(),
            capacity: entries.cap().get(),
        }
    }

    /// Drop every cached pattern. Counters are kept.
    pub fn clear(&self) {
        write_lock(&self.entries).clear();
    }
}
