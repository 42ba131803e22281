//! String assembler — a growable text buffer over a [`ScratchArena`].

use crate::arena::ScratchArena;
use std::fmt::Write as _;

/// Accumulates formatted text in an arena, growing as needed.
///
/// Doubling growth is handled internally by `bumpalo::collections::String`;
/// callers never see a reallocation, only a borrow of the current contents.
pub struct StringAssembler<'a> {
    inner: bumpalo::collections::String<'a>,
}

impl<'a> StringAssembler<'a> {
    pub fn new(arena: &'a ScratchArena) -> Self {
        Self {
            inner: bumpalo::collections::String::new_in(arena_bump(arena)),
        }
    }

    pub fn with_capacity(arena: &'a ScratchArena, capacity: usize) -> Self {
        Self {
            inner: bumpalo::collections::String::with_capacity_in(capacity, arena_bump(arena)),
        }
    }

    /// Append literal text.
    pub fn append(&mut self, text: &str) {
        self.inner.push_str(text);
    }

    /// Append the result of formatting `args` (use `format_args!(...)`).
    pub fn append_fmt(&mut self, args: std::fmt::Arguments<'_>) {
        // `write!` on a `bumpalo::collections::String` never fails.
        let _ = self.inner.write_fmt(args);
    }

    /// Current contents, borrowed from the arena.
    pub fn get(&self) -> &str {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Exposes the private `Bump` inside `ScratchArena` to this module only,
/// via a back-channel accessor rather than making the field public.
fn arena_bump(arena: &ScratchArena) -> &bumpalo::Bump {
    arena.bump_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_format() {
        let arena = ScratchArena::with_capacity(64);
        let mut asm = StringAssembler::new(&arena);
        asm.append("count: ");
        asm.append_fmt(format_args!("{}", 42));
        assert_eq!(asm.get(), "count: 42");
    }

    #[test]
    fn grows_past_initial_capacity() {
        let arena = ScratchArena::with_capacity(4);
        let mut asm = StringAssembler::new(&arena);
        for _ in 0..200 {
            asm.append("0123456789");
        }
        assert_eq!(asm.len(), 2000);
    }
}
