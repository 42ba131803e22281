//! Embedded Lua scripting for `script { ... }` / `executeScript "name"`
//! pipeline steps (§4.8, §4.9), via real Lua 5.4 (`mlua`, vendored).

pub mod cache;
pub mod context;
pub mod convert;
pub mod engine;
pub mod host;

pub use cache::{CompiledScript, NamedScriptCache, ScriptCache};
pub use context::ScriptContext;
pub use engine::ScriptEngine;
pub use host::{NullHost, ScriptHost};
