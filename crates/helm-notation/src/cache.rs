use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ahash::{HashMap, HashMapExt};
use derive_more::Display;

use crate::parsers::cache_key::key_tokens;

pub const DEFAULT_CACHE_SIZE: usize = 10;
pub const MAXIMUM_CACHE_SIZE: usize = 50;

/// The normalized form of a notation that cache lookups are keyed on
///
/// The polymer fragments (`RNA1{...}` and friends, which also covers annotations) are kept verbatim, and the text
/// between them (connection tuples) loses its whitespace. Tokens are kept in the order they're written, while section
/// boundaries and `|` separators are dropped, so notations that differ only cosmetically share a key.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct CacheKey(String);

impl CacheKey {
    #[must_use]
    pub fn new(notation: &str) -> Self {
        let tokens = key_tokens(notation).map(|(_, tokens)| tokens).unwrap_or_default();
        Self(tokens.join("|"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A bounded, thread-safe cache of values derived from notations, keyed on their [`CacheKey`]
///
/// When full, the entry with the lowest usage count is evicted to make room, breaking ties in favour of evicting the
/// shortest (then lexicographically smallest) key. Reading an entry with [`NotationCache::get`] bumps its usage.
#[derive(Debug)]
pub struct NotationCache<V> {
    capacity: usize,
    state: Mutex<CacheState<V>>,
}

#[derive(Debug)]
struct CacheState<V> {
    values: HashMap<CacheKey, Arc<V>>,
    usage: HashMap<CacheKey, usize>,
}

impl<V> NotationCache<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_SIZE)
    }

    /// Creates a cache holding up to `capacity` entries, clamped between 1 and [`MAXIMUM_CACHE_SIZE`]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = clamp_capacity(capacity);
        Self {
            capacity,
            state: Mutex::new(CacheState {
                values: HashMap::with_capacity(capacity),
                usage: HashMap::with_capacity(capacity),
            }),
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks for an entry without counting it as a use
    #[must_use]
    pub fn contains(&self, notation: &str) -> bool {
        self.lock().values.contains_key(&CacheKey::new(notation))
    }

    /// Looks up the entry for `notation`, incrementing its usage count
    pub fn get(&self, notation: &str) -> Option<Arc<V>> {
        self.lock().hit(&CacheKey::new(notation))
    }

    #[must_use]
    pub fn usage(&self, notation: &str) -> Option<usize> {
        self.lock().usage.get(&CacheKey::new(notation)).copied()
    }

    /// Adds an entry for `notation`, unless one already exists for its key
    ///
    /// Returns `true` if the value was inserted.
    pub fn insert(&self, notation: &str, value: V) -> bool {
        let key = CacheKey::new(notation);
        let mut state = self.lock();
        if state.values.contains_key(&key) {
            return false;
        }
        state.insert(key, Arc::new(value), self.capacity);
        true
    }

    /// Returns the cached entry for `notation`, or computes, caches, and returns a new one
    ///
    /// The cache isn't locked while `compute` runs. If it fails, the error is returned and nothing is cached.
    pub fn get_or_compute<E>(
        &self,
        notation: &str,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        let key = CacheKey::new(notation);
        if let Some(value) = self.lock().hit(&key) {
            log::debug!("cache hit for {key}");
            return Ok(value);
        }
        log::debug!("cache miss for {key}");
        let value = Arc::new(compute()?);
        Ok(self.lock().insert(key, value, self.capacity))
    }

    /// Empties the cache, forgetting every usage count along with the entries
    pub fn clear(&self) {
        let mut state = self.lock();
        state.values.clear();
        state.usage.clear();
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V>> {
        // NOTE: Every update leaves the maps consistent, so a panic elsewhere can't have left them half-written
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> Default for NotationCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheState<V> {
    fn hit(&mut self, key: &CacheKey) -> Option<Arc<V>> {
        let value = self.values.get(key).cloned()?;
        *self.usage.entry(key.clone()).or_default() += 1;
        Some(value)
    }

    // Returns the entry now stored under `key`, which is an existing one if another thread got there first
    fn insert(&mut self, key: CacheKey, value: Arc<V>, capacity: usize) -> Arc<V> {
        if let Some(existing) = self.values.get(&key) {
            return Arc::clone(existing);
        }
        while self.values.len() >= capacity {
            let Some(evicted) = self.eviction_candidate() else {
                break;
            };
            log::debug!("evicting {evicted} from the cache");
            self.values.remove(&evicted);
            self.usage.remove(&evicted);
        }
        self.values.insert(key.clone(), Arc::clone(&value));
        self.usage.insert(key, 0);
        value
    }

    fn eviction_candidate(&self) -> Option<CacheKey> {
        self.values
            .keys()
            .min_by_key(|key| {
                let usage = self.usage.get(*key).copied().unwrap_or_default();
                (usage, key.as_str().len(), *key)
            })
            .cloned()
    }
}

pub(crate) fn clamp_capacity(requested: usize) -> usize {
    if requested > MAXIMUM_CACHE_SIZE {
        log::warn!("a cache capacity of {requested} exceeds the maximum, using {MAXIMUM_CACHE_SIZE} instead");
        MAXIMUM_CACHE_SIZE
    } else if requested == 0 {
        log::warn!("a cache capacity of 0 would never hold anything, using 1 instead");
        1
    } else {
        requested
    }
}

static_assertions::assert_impl_all!(NotationCache<String>: Send, Sync);

#[cfg(test)]
mod tests {
    use std::{convert::Infallible, thread};

    use super::*;

    fn ok(value: &str) -> impl FnOnce() -> Result<String, Infallible> + '_ {
        move || Ok(value.to_owned())
    }

    #[test]
    fn keys_ignore_cosmetic_differences() {
        let key = CacheKey::new("RNA1{R(A)P.R(C)}|RNA2{R(G)}$RNA1,RNA2,5:R2-1:R1$$$");
        assert_eq!(
            key.as_str(),
            "RNA1{R(A)P.R(C)}|RNA2{R(G)}|RNA1,RNA2,5:R2-1:R1"
        );
        assert_eq!(
            CacheKey::new(" RNA1{R(A)P.R(C)} | RNA2{R(G)} $ RNA1,RNA2,5:R2-1:R1 $ $ $ "),
            key
        );
        // A base pair keys the same whichever connection section it's written in
        assert_eq!(
            CacheKey::new("RNA1{R(A)}|RNA2{R(U)}$RNA1,RNA2,2:pair-2:pair$$$"),
            CacheKey::new("RNA1{R(A)}|RNA2{R(U)}$$RNA1,RNA2,2:pair-2:pair$$")
        );
        assert_ne!(
            CacheKey::new("RNA1{R(A)}$$$$"),
            CacheKey::new("RNA1{R(U)}$$$$")
        );
    }

    #[test]
    fn keys_respect_brackets() {
        // Separators and whitespace inside brackets belong to the monomer
        let smiles = "CHEM1{[[*]OCCO[*] |$_R1;;;_R2$|]}$$$$";
        assert_eq!(CacheKey::new(smiles).as_str(), "CHEM1{[[*]OCCO[*] |$_R1;;;_R2$|]}");
        assert_ne!(
            CacheKey::new(smiles),
            CacheKey::new("CHEM1{[[*]OCCO[*]|$_R1;;;_R2$|]}$$$$")
        );
    }

    #[test]
    fn keys_keep_annotation_text() {
        let unbalanced = CacheKey::new("RNA1{R}$$$RNA1{x[}$");
        assert_eq!(unbalanced.as_str(), "RNA1{R}|RNA1{x[}");
        assert_ne!(unbalanced, CacheKey::new("RNA1{R}$$$RNA1{y[}$"));
        assert_ne!(unbalanced, CacheKey::new("RNA1{R}$$$$"));

        let nested = CacheKey::new("RNA1{R}$$$RNA1{a{b}$");
        assert_eq!(nested.as_str(), "RNA1{R}|RNA1{a{b}");
        assert_ne!(nested, CacheKey::new("RNA1{R}$$$RNA1{a{c}$"));
        assert_eq!(nested, CacheKey::new("RNA1{R} $ $ $ RNA1{a{b} $"));
    }

    #[test]
    fn keys_keep_stray_text() {
        assert_eq!(CacheKey::new("RNA10{R}$$$$").as_str(), "RNA10{R}");
        assert_eq!(CacheKey::new("RNA1{R}$$$$V2.0").as_str(), "RNA1{R}|V2.0");
        assert_ne!(CacheKey::new("RNA1{R}$$$$V2.0"), CacheKey::new("RNA1{R}$$$$"));
        assert_eq!(CacheKey::new("").as_str(), "");
    }

    #[test]
    fn capacity_is_clamped() {
        assert_eq!(NotationCache::<String>::new().capacity(), DEFAULT_CACHE_SIZE);
        assert_eq!(NotationCache::<String>::with_capacity(20).capacity(), 20);
        assert_eq!(
            NotationCache::<String>::with_capacity(1000).capacity(),
            MAXIMUM_CACHE_SIZE
        );
        assert_eq!(NotationCache::<String>::with_capacity(0).capacity(), 1);

        let cache = NotationCache::with_capacity(1000);
        for i in 1..=200 {
            cache.insert(&format!("RNA{i}{{R}}$$$$"), i);
            assert!(cache.len() <= MAXIMUM_CACHE_SIZE);
        }
        assert_eq!(cache.len(), MAXIMUM_CACHE_SIZE);
    }

    #[test]
    fn insertion_is_a_no_op_for_existing_keys() {
        let cache = NotationCache::new();
        assert!(cache.is_empty());
        assert!(cache.insert("RNA1{R(A)}$$$$", "first"));
        assert!(!cache.insert("RNA1{R(A)} $ $$$", "second"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("RNA1{R(A)}$$$$").as_deref(), Some(&"first"));
    }

    #[test]
    fn get_counts_usage() {
        let cache = NotationCache::new();
        cache.insert("RNA1{R(A)}$$$$", 1);
        assert_eq!(cache.usage("RNA1{R(A)}$$$$"), Some(0));
        assert!(cache.contains("RNA1{R(A)}$$$$"));
        assert_eq!(cache.usage("RNA1{R(A)}$$$$"), Some(0));
        cache.get("RNA1{R(A)}$$$$");
        cache.get("RNA1{R(A)}$$$$");
        assert_eq!(cache.usage("RNA1{R(A)}$$$$"), Some(2));
        assert_eq!(cache.get("RNA2{R(A)}$$$$"), None);
        assert_eq!(cache.usage("RNA2{R(A)}$$$$"), None);
    }

    #[test]
    fn least_used_entries_are_evicted() {
        let cache = NotationCache::with_capacity(3);
        cache.insert("RNA1{R(A)P.R(C)}$$$$", "long");
        cache.insert("RNA1{R(G)}$$$$", "g");
        cache.insert("RNA1{R(U)}$$$$", "u");
        cache.get("RNA1{R(G)}$$$$");
        cache.get("RNA1{R(A)P.R(C)}$$$$");

        // `u` is the only entry never read
        cache.insert("PEPTIDE1{G}$$$$", "g2");
        assert!(!cache.contains("RNA1{R(U)}$$$$"));
        assert_eq!(cache.len(), 3);

        // All tied on one use after this, so the shortest key goes first
        cache.get("PEPTIDE1{G}$$$$");
        cache.insert("CHEM1{SMCC}$$$$", "smcc");
        assert!(!cache.contains("RNA1{R(G)}$$$$"));
        assert!(cache.contains("PEPTIDE1{G}$$$$"));
        assert!(cache.contains("RNA1{R(A)P.R(C)}$$$$"));
    }

    #[test]
    fn ties_break_lexicographically() {
        let cache = NotationCache::with_capacity(2);
        cache.insert("RNA1{R(U)}$$$$", 'u');
        cache.insert("RNA1{R(A)}$$$$", 'a');
        cache.insert("RNA1{R(G)}$$$$", 'g');
        assert!(!cache.contains("RNA1{R(A)}$$$$"));
        assert!(cache.contains("RNA1{R(U)}$$$$"));
        assert!(cache.contains("RNA1{R(G)}$$$$"));
    }

    #[test]
    fn compute_on_miss() {
        let cache = NotationCache::new();
        let first = cache.get_or_compute("RNA1{R(A)}$$$$", ok("computed")).unwrap();
        let second = cache
            .get_or_compute("RNA1{R(A)} $$$$", || -> Result<String, Infallible> {
                panic!("a cached value should not be recomputed")
            })
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.usage("RNA1{R(A)}$$$$"), Some(1));
    }

    #[test]
    fn failures_are_not_cached() {
        let cache: NotationCache<String> = NotationCache::new();
        let result = cache.get_or_compute("RNA1{R(A)}$$$$", || Err("no graph"));
        assert_eq!(result, Err("no graph"));
        assert!(!cache.contains("RNA1{R(A)}$$$$"));
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_forgets_everything() {
        let cache = NotationCache::new();
        cache.insert("RNA1{R(A)}$$$$", ());
        cache.get("RNA1{R(A)}$$$$");
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.usage("RNA1{R(A)}$$$$"), None);
    }

    #[test]
    fn shared_between_threads() {
        let cache = NotationCache::with_capacity(MAXIMUM_CACHE_SIZE);
        thread::scope(|s| {
            for t in 0..4 {
                let cache = &cache;
                s.spawn(move || {
                    for i in 1..=25 {
                        let notation = format!("RNA{i}{{R}}$$$$");
                        let value = cache.get_or_compute(&notation, || Ok::<_, Infallible>(i)).unwrap();
                        assert_eq!(*value, i, "thread {t} saw the wrong value");
                    }
                });
            }
        });
        assert_eq!(cache.len(), 25);
    }
}
