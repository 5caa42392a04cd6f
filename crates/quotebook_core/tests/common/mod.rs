#![allow(dead_code)]

use quotebook_core::{KvRepository, Quote, QuoteStore, RandomSource, RepoError, RepoResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Key-value double whose contents stay observable after the store takes it.
#[derive(Clone, Default)]
pub struct ProbeKv {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl ProbeKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let probe = Self::new();
        probe
            .entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        probe
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl KvRepository for ProbeKv {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> RepoResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoError::InvalidData("write refused".to_string()));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Random source that always returns the same index.
pub struct FixedIndex(pub usize);

impl RandomSource for FixedIndex {
    fn pick_index(&mut self, _len: usize) -> usize {
        self.0
    }
}

pub fn quote(text: &str, category: &str) -> Quote {
    Quote::new(text, category).unwrap()
}

/// Store whose persisted snapshot is exactly `quotes`.
pub fn store_with(quotes: &[Quote]) -> (QuoteStore<ProbeKv>, ProbeKv) {
    let probe = ProbeKv::with_entry("quotes", &quotebook_core::export_document(quotes));
    let store = QuoteStore::open(probe.clone()).unwrap();
    (store, probe)
}
