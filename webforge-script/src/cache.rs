//! Compiled-chunk cache for script pipeline steps, keyed by a hash of the
//! script's source text (mirrors `webforge_transform::TransformCache`).
//!
//! §4.9 describes named scripts as "discovered at startup... compiled once
//! and installed as globals... recompilation is keyed by file modification
//! time". Inline script steps have no backing file, so this cache keys on
//! source-text hash instead (like the transform cache); named scripts
//! additionally carry a modification time so a file edited on disk without
//! a process restart is picked up (see [`NamedScriptCache`]).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

use webforge_core::index::fnv1a;

/// Lua bytecode dumped from a loaded chunk, so repeat executions skip
/// re-parsing the source (§4.9: "loads cached compiled bytecode").
#[derive(Clone)]
pub struct CompiledScript {
    pub bytecode: Vec<u8>,
}

#[derive(Default)]
pub struct ScriptCache {
    compiled: Mutex<HashMap<u64, CompiledScript>>,
}

impl ScriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source: &str) -> Option<CompiledScript> {
        self.compiled.lock().unwrap().get(&fnv1a(source.as_bytes())).cloned()
    }

    pub fn insert(&self, source: &str, compiled: CompiledScript) {
        self.compiled.lock().unwrap().insert(fnv1a(source.as_bytes()), compiled);
    }

    pub fn len(&self) -> usize {
        self.compiled.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Tracks per-named-script modification times so a `scripts/` directory
/// file edited on disk is recompiled without restarting the process
/// (§4.9: "Recompilation is keyed by file modification time").
#[derive(Default)]
pub struct NamedScriptCache {
    mtimes: Mutex<HashMap<String, SystemTime>>,
}

impl NamedScriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `name` has never been seen, or `mtime` is newer
    /// than the last recorded one — either way, the caller should
    /// (re)compile and then call [`Self::record`].
    pub fn is_stale(&self, name: &str, mtime: SystemTime) -> bool {
        match self.mtimes.lock().unwrap().get(name) {
            Some(seen) => mtime > *seen,
            None => true,
        }
    }

    pub fn record(&self, name: &str, mtime: SystemTime) {
        self.mtimes.lock().unwrap().insert(name.to_string(), mtime);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiling_the_same_source_is_reusable() {
        let cache = ScriptCache::new();
        assert!(cache.get("return 1").is_none());
        cache.insert("return 1", CompiledScript { bytecode: vec![1, 2, 3] });
        assert_eq!(cache.get("return 1").unwrap().bytecode, vec![1, 2, 3]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn named_script_is_stale_until_recorded() {
        let cache = NamedScriptCache::new();
        let t0 = SystemTime::UNIX_EPOCH;
        assert!(cache.is_stale("report", t0));
        cache.record("report", t0);
        assert!(!cache.is_stale("report", t0));
        let t1 = t0 + std::time::Duration::from_secs(1);
        assert!(cache.is_stale("report", t1));
    }
}
