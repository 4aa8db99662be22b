//! Query-store contract over the URL query string, plus in-memory and throttled adapters.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::Rc,
};

use thiserror::Error;

use crate::config::HistoryMode;
use crate::timing::{earliest, Clock, ThrottleGate};

/// Shortest delay before a rejected flush is retried.
const MIN_RETRY_MS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// Ordered batch of query writes. `None` removes the key.
///
/// A batch is applied atomically by stores, so related keys (for example a page reset and the
/// filter values that caused it) never become observable separately.
pub struct QueryWrite {
    entries: Vec<(String, Option<String>)>,
}

impl QueryWrite {
    /// Empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or clears a key, replacing any earlier entry for the same key in place.
    pub fn set(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder form of [`QueryWrite::set`].
    pub fn with(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Folds a later batch into this one; later values win.
    pub fn merge(&mut self, later: QueryWrite) {
        for (key, value) in later.entries {
            self.set(key, value);
        }
    }

    /// Pending value for a key: `Some(None)` means the key is being removed.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_deref())
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Per-write options forwarded to the underlying store.
pub struct WriteOptions {
    /// History mode for URL-backed stores.
    pub history: HistoryMode,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors reported by query-store writes.
pub enum QueryStoreError {
    /// The backing resource (for example `window.history`) is missing.
    #[error("query store unavailable: {0}")]
    Unavailable(String),
    /// The backing resource rejected the write.
    #[error("query store write failed: {0}")]
    Write(String),
}

/// Flat string-keyed query storage; the URL query string in browsers.
pub trait QueryStore {
    /// Reads the raw value of a key.
    fn get(&self, key: &str) -> Option<String>;

    /// Applies a batch of writes atomically.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing resource rejects the write.
    fn set(&self, write: &QueryWrite, options: &WriteOptions) -> Result<(), QueryStoreError>;
}

impl<S: QueryStore + ?Sized> QueryStore for Rc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, write: &QueryWrite, options: &WriteOptions) -> Result<(), QueryStoreError> {
        (**self).set(write, options)
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Store that holds nothing and accepts every write.
pub struct NoopQueryStore;

impl QueryStore for NoopQueryStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _write: &QueryWrite, _options: &WriteOptions) -> Result<(), QueryStoreError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory query store. Clones share the same map, which lets tests observe writes.
pub struct MemoryQueryStore {
    inner: Rc<RefCell<BTreeMap<String, String>>>,
    flushes: Rc<Cell<usize>>,
    last_options: Rc<Cell<Option<WriteOptions>>>,
}

impl MemoryQueryStore {
    /// Creates a store pre-populated with `pairs`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::default();
        store.inner.borrow_mut().extend(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into())),
        );
        store
    }

    /// Writes a key directly, bypassing write accounting (simulates external URL edits).
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.borrow_mut().insert(key.into(), value.into());
    }

    /// Removes a key directly.
    pub fn remove(&self, key: &str) {
        self.inner.borrow_mut().remove(key);
    }

    /// Copy of the current contents.
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.inner.borrow().clone()
    }

    /// Number of batches applied through [`QueryStore::set`].
    pub fn flush_count(&self) -> usize {
        self.flushes.get()
    }

    /// Options of the most recent batch.
    pub fn last_options(&self) -> Option<WriteOptions> {
        self.last_options.get()
    }

    /// Renders the contents as `key=value` pairs joined by `&`, in key order, without escaping.
    pub fn query_string(&self) -> String {
        self.inner
            .borrow()
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl QueryStore for MemoryQueryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.borrow().get(key).cloned()
    }

    fn set(&self, write: &QueryWrite, options: &WriteOptions) -> Result<(), QueryStoreError> {
        let mut inner = self.inner.borrow_mut();
        for (key, value) in write.iter() {
            match value {
                Some(value) => {
                    inner.insert(key.to_string(), value.to_string());
                }
                None => {
                    inner.remove(key);
                }
            }
        }
        self.flushes.set(self.flushes.get() + 1);
        self.last_options.set(Some(*options));
        Ok(())
    }
}

/// Wraps a store so writes reach it at most once per throttle window.
///
/// Pending writes overlay the inner store, so reads always observe the latest logical state even
/// while the inner store lags behind. Every pending write keeps a deadline: writes the gate
/// swallows without a trailing edge are flushed when the window closes, and a batch the inner
/// store rejects stays pending and is retried.
pub struct ThrottledQueryStore<S> {
    inner: S,
    clock: Rc<dyn Clock>,
    gate: RefCell<ThrottleGate>,
    pending: RefCell<QueryWrite>,
    options: Cell<WriteOptions>,
    catch_up: Cell<Option<u64>>,
}

impl<S: QueryStore> ThrottledQueryStore<S> {
    /// Wraps `inner` with a throttle gate.
    pub fn new(inner: S, clock: Rc<dyn Clock>, gate: ThrottleGate) -> Self {
        Self {
            inner,
            clock,
            gate: RefCell::new(gate),
            pending: RefCell::new(QueryWrite::new()),
            options: Cell::new(WriteOptions::default()),
            catch_up: Cell::new(None),
        }
    }

    /// Underlying store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Whether writes are waiting for the next flush.
    pub fn has_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    /// Time at which the next flush of pending writes is due.
    pub fn deadline(&self) -> Option<u64> {
        if self.has_pending() {
            earliest(self.gate.borrow().deadline(), self.catch_up.get())
        } else {
            None
        }
    }

    /// Flushes pending writes when the trailing edge, a window close, or a retry is due.
    ///
    /// # Errors
    ///
    /// Returns the inner store's error when the flush is rejected.
    pub fn poll(&self) -> Result<(), QueryStoreError> {
        let now = self.clock.now_ms();
        let trailing = self.gate.borrow_mut().poll(now);
        let catch_up = self.catch_up.get().is_some_and(|due| due <= now);
        if catch_up && !trailing {
            self.gate.borrow_mut().record_fire(now);
        }
        if trailing || catch_up {
            self.flush_now()?;
        }
        Ok(())
    }

    /// Drops pending writes without flushing them, e.g. after the URL changed underneath.
    pub fn discard_pending(&self) {
        let dropped = std::mem::take(&mut *self.pending.borrow_mut());
        self.catch_up.set(None);
        if !dropped.is_empty() {
            tracing::debug!(keys = dropped.len(), "discarding pending query writes");
        }
    }

    /// Flushes pending writes immediately, ignoring the throttle window.
    ///
    /// A rejected batch goes back under any newer pending writes and is retried on a later poll.
    ///
    /// # Errors
    ///
    /// Returns the inner store's error when the flush is rejected.
    pub fn flush_now(&self) -> Result<(), QueryStoreError> {
        let write = std::mem::take(&mut *self.pending.borrow_mut());
        self.catch_up.set(None);
        if write.is_empty() {
            return Ok(());
        }
        tracing::debug!(keys = write.len(), "flushing query writes");
        if let Err(err) = self.inner.set(&write, &self.options.get()) {
            let mut restored = write;
            restored.merge(std::mem::take(&mut *self.pending.borrow_mut()));
            *self.pending.borrow_mut() = restored;
            let retry_in = self.gate.borrow().window_ms().max(MIN_RETRY_MS);
            self.catch_up
                .set(Some(self.clock.now_ms().saturating_add(retry_in)));
            return Err(err);
        }
        Ok(())
    }
}

impl<S: QueryStore> QueryStore for ThrottledQueryStore<S> {
    fn get(&self, key: &str) -> Option<String> {
        if let Some(pending) = self.pending.borrow().get(key) {
            return pending.map(str::to_string);
        }
        self.inner.get(key)
    }

    fn set(&self, write: &QueryWrite, options: &WriteOptions) -> Result<(), QueryStoreError> {
        self.pending.borrow_mut().merge(write.clone());
        self.options.set(*options);
        let now = self.clock.now_ms();
        let fire = self.gate.borrow_mut().on_input(now);
        if fire {
            return self.flush_now();
        }
        if self.gate.borrow().deadline().is_none() && self.catch_up.get().is_none() {
            self.catch_up.set(self.gate.borrow().window_end());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::timing::ManualClock;

    #[test]
    fn query_write_replaces_keys_in_place_and_merges() {
        let mut write = QueryWrite::new()
            .with("page", Some("1".into()))
            .with("role", Some("admin".into()));
        write.set("page", Some("2".into()));
        write.merge(QueryWrite::new().with("role", None));

        let entries: Vec<_> = write.iter().collect();
        assert_eq!(entries, vec![("page", Some("2")), ("role", None)]);
        assert_eq!(write.get("role"), Some(None));
        assert_eq!(write.get("missing"), None);
    }

    #[test]
    fn memory_store_applies_batches_and_counts_flushes() {
        let store = MemoryQueryStore::from_pairs([("page", "3"), ("role", "user")]);
        let write = QueryWrite::new()
            .with("page", Some("1".into()))
            .with("role", None);
        store
            .set(
                &write,
                &WriteOptions {
                    history: HistoryMode::Push,
                },
            )
            .expect("set");

        assert_eq!(store.query_string(), "page=1");
        assert_eq!(store.flush_count(), 1);
        assert_eq!(store.last_options().map(|o| o.history), Some(HistoryMode::Push));
    }

    #[test]
    fn throttled_store_overlays_pending_writes_and_flushes_on_trailing_edge() {
        let clock = ManualClock::starting_at(0);
        let inner = MemoryQueryStore::default();
        let store = ThrottledQueryStore::new(
            inner.clone(),
            Rc::new(clock.clone()),
            ThrottleGate::new(50, true, true),
        );
        let options = WriteOptions::default();

        store
            .set(&QueryWrite::new().with("page", Some("2".into())), &options)
            .expect("leading write");
        assert_eq!(inner.flush_count(), 1);

        clock.set(10);
        store
            .set(&QueryWrite::new().with("page", Some("3".into())), &options)
            .expect("throttled write");
        clock.set(20);
        store
            .set(&QueryWrite::new().with("perPage", Some("20".into())), &options)
            .expect("throttled write");

        assert_eq!(inner.flush_count(), 1);
        assert_eq!(inner.get("page").as_deref(), Some("2"));
        assert_eq!(store.get("page").as_deref(), Some("3"));
        assert_eq!(store.deadline(), Some(50));

        clock.set(50);
        store.poll().expect("trailing flush");
        assert_eq!(inner.flush_count(), 2);
        assert_eq!(inner.query_string(), "page=3&perPage=20");
        assert!(!store.has_pending());
    }

    #[test]
    fn pending_removal_hides_inner_value() {
        let clock = ManualClock::starting_at(0);
        let inner = MemoryQueryStore::from_pairs([("role", "admin")]);
        let store = ThrottledQueryStore::new(
            inner,
            Rc::new(clock),
            ThrottleGate::new(50, false, true),
        );
        store
            .set(&QueryWrite::new().with("role", None), &WriteOptions::default())
            .expect("set");
        assert_eq!(store.get("role"), None);
        assert_eq!(store.inner().get("role").as_deref(), Some("admin"));
    }

    #[derive(Clone, Default)]
    struct FlakyStore {
        inner: MemoryQueryStore,
        failures: Rc<Cell<u32>>,
    }

    impl QueryStore for FlakyStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, write: &QueryWrite, options: &WriteOptions) -> Result<(), QueryStoreError> {
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                return Err(QueryStoreError::Write("SecurityError".into()));
            }
            self.inner.set(write, options)
        }
    }

    #[test]
    fn rejected_flush_keeps_the_batch_and_retries() {
        let clock = ManualClock::starting_at(0);
        let backing = FlakyStore::default();
        backing.failures.set(1);
        let store = ThrottledQueryStore::new(
            backing.clone(),
            Rc::new(clock.clone()),
            ThrottleGate::new(50, true, true),
        );
        let options = WriteOptions::default();

        let err = store
            .set(&QueryWrite::new().with("role", Some("admin".into())), &options)
            .expect_err("first write is rejected");
        assert_eq!(err, QueryStoreError::Write("SecurityError".into()));
        assert_eq!(store.get("role").as_deref(), Some("admin"));
        assert_eq!(store.deadline(), Some(50));

        clock.set(20);
        store
            .set(&QueryWrite::new().with("page", Some("1".into())), &options)
            .expect("queued write");
        assert_eq!(backing.inner.flush_count(), 0);

        clock.set(50);
        store.poll().expect("retry succeeds");
        assert_eq!(backing.inner.query_string(), "page=1&role=admin");
        assert!(!store.has_pending());
        assert_eq!(store.deadline(), None);
    }

    #[test]
    fn leading_only_writes_inside_the_window_flush_when_it_closes() {
        let clock = ManualClock::starting_at(1_000);
        let inner = MemoryQueryStore::default();
        let store = ThrottledQueryStore::new(
            inner.clone(),
            Rc::new(clock.clone()),
            ThrottleGate::new(50, true, false),
        );
        let options = WriteOptions::default();

        store
            .set(&QueryWrite::new().with("role", Some("admin".into())), &options)
            .expect("leading write");
        clock.set(1_010);
        store
            .set(&QueryWrite::new().with("role", Some("user".into())), &options)
            .expect("swallowed write");
        assert_eq!(inner.get("role").as_deref(), Some("admin"));
        assert_eq!(store.deadline(), Some(1_050));

        clock.set(1_049);
        store.poll().expect("early poll");
        assert_eq!(inner.flush_count(), 1);

        clock.set(1_050);
        store.poll().expect("window close flush");
        assert_eq!(inner.get("role").as_deref(), Some("user"));
        assert_eq!(inner.flush_count(), 2);
        assert_eq!(store.deadline(), None);
    }
}
