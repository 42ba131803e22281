//! Per-request scratch allocator.
//!
//! A thin, named wrapper over [`bumpalo::Bump`]. The persistent `Site` tree
//! (see [`crate::ast`]) is ordinary owned Rust data; this arena exists for
//! allocations whose lifetime is bound to a single HTTP transaction — the
//! request dispatcher creates one per request and drops it when the
//! transaction completes, taking every allocation made from it with it.

use bumpalo::Bump;

/// A bump-style scratch arena with a single, whole-region teardown.
///
/// Allocating never moves a previously returned reference; the only way to
/// reclaim memory is to drop the `ScratchArena` itself.
pub struct ScratchArena {
    bump: Bump,
}

impl ScratchArena {
    /// Create a new arena, pre-reserving `capacity` bytes in its first chunk.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bump: Bump::with_capacity(capacity),
        }
    }

    /// The default per-request capacity used by the dispatcher (1 MiB, §4.11).
    pub fn for_request() -> Self {
        Self::with_capacity(1 << 20)
    }

    /// Copy `s` into the arena and return a reference with the arena's lifetime.
    pub fn duplicate_str<'a>(&'a self, s: &str) -> &'a str {
        self.bump.alloc_str(s)
    }

    /// Allocate a value of `T` in the arena.
    pub fn allocate<'a, T>(&'a self, value: T) -> &'a mut T {
        self.bump.alloc(value)
    }

    /// Bytes currently reserved by the arena across all of its chunks.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Crate-internal escape hatch for types (e.g. [`crate::strbuf::StringAssembler`])
    /// that need to build `bumpalo`-collection types directly in this arena.
    pub(crate) fn bump_ref(&self) -> &Bump {
        &self.bump
    }
}

impl Default for ScratchArena {
    fn default() -> Self {
        Self::for_request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_str_survives_further_allocations() {
        let arena = ScratchArena::with_capacity(16);
        let a = arena.duplicate_str("hello");
        // Force growth past the small initial chunk.
        for i in 0..1000 {
            arena.duplicate_str(&format!("padding-{i}"));
        }
        assert_eq!(a, "hello");
    }

    #[test]
    fn allocate_returns_distinct_storage() {
        let arena = ScratchArena::with_capacity(64);
        let x = arena.allocate(41);
        *x += 1;
        assert_eq!(*x, 42);
    }
}
