//! The per-request data seeded into a script's globals (§4.8).

use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct ScriptContext {
    pub request: Value,
    pub query: Value,
    pub body: Value,
    pub headers: Value,
    pub cookies: Value,
    pub params: Value,
}
