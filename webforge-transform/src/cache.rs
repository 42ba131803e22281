//! Compiled-program cache, keyed by a hash of the transform's source text
//! (§4.8: "compiles the transform source (once, cached by source-text hash)").

use std::sync::Arc;

use dashmap::DashMap;
use webforge_core::index::fnv1a;

use crate::ast::Expr;
use crate::parser::parse;

#[derive(Default)]
pub struct TransformCache {
    programs: DashMap<u64, Arc<Expr>>,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `source` (or reuse a cached compilation keyed by its
    /// FNV-1a hash) and return the program. A hash collision between two
    /// distinct sources would silently reuse the wrong program; for the
    /// short, hand-authored transform bodies this DSL targets, 64-bit FNV
    /// collisions are not a practical concern.
    pub fn get_or_compile(&self, source: &str) -> Result<Arc<Expr>, String> {
        let key = fnv1a(source.as_bytes());
        if let Some(program) = self.programs.get(&key) {
            return Ok(program.clone());
        }
        let program = Arc::new(parse(source)?);
        self.programs.insert(key, program.clone());
        Ok(program)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiling_the_same_source_twice_reuses_the_cached_program() {
        let cache = TransformCache::new();
        let a = cache.get_or_compile(".user.name").unwrap();
        let b = cache.get_or_compile(".user.name").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_sources_compile_separately() {
        let cache = TransformCache::new();
        cache.get_or_compile(".a").unwrap();
        cache.get_or_compile(".b").unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalid_source_reports_an_error() {
        let cache = TransformCache::new();
        assert!(cache.get_or_compile("{ unterminated").is_err());
    }
}
