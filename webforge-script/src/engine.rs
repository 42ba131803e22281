//! Script step execution (§4.8, §4.9): loads the seeded globals, exposes
//! the library surface, and runs the embedded Lua chunk to completion.
//!
//! A fresh `mlua::Lua` is created per call — §5: "Script interpreter
//! states are not shared across requests; each step creates a fresh
//! state." `mlua`'s `async` + `send` features let the VM drive `fetch`'s
//! `reqwest` calls on the same Tokio runtime the dispatcher already runs
//! on, with no separate thread or blocking bridge needed.

use std::sync::Arc;

use mlua::{Lua, Table, Value as LuaValue};
use serde_json::Value as JsonValue;

use crate::cache::{CompiledScript, ScriptCache};
use crate::context::ScriptContext;
use crate::convert::{json_to_lua, lua_to_json};
use crate::host::ScriptHost;

pub struct ScriptEngine {
    cache: ScriptCache,
    http_client: reqwest::Client,
}

impl ScriptEngine {
    pub fn new() -> Self {
        Self {
            cache: ScriptCache::new(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Run `source` against `ctx`, using `host` to service `sqlQuery`,
    /// `findQuery`, `getStore`, and `setStore`. Returns the script's return
    /// value converted to JSON.
    pub async fn run(
        &self,
        source: &str,
        ctx: &ScriptContext,
        host: Arc<dyn ScriptHost>,
    ) -> Result<JsonValue, String> {
        let lua = Lua::new();
        install_globals(&lua, ctx).map_err(|e| e.to_string())?;
        install_library(&lua, self.http_client.clone(), host).map_err(|e| e.to_string())?;

        let result: LuaValue = if let Some(compiled) = self.cache.get(source) {
            lua.load(&compiled.bytecode[..])
                .set_name("pipeline-script")
                .eval_async()
                .await
                .map_err(|e| e.to_string())?
        } else {
            let function = lua
                .load(source)
                .set_name("pipeline-script")
                .into_function()
                .map_err(|e| e.to_string())?;
            self.cache.insert(source, CompiledScript { bytecode: function.dump(false) });
            function.call_async(()).await.map_err(|e| e.to_string())?
        };

        Ok(lua_to_json(&result))
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn install_globals(lua: &Lua, ctx: &ScriptContext) -> mlua::Result<()> {
    let globals = lua.globals();
    globals.set("request", json_to_lua(lua, &ctx.request)?)?;
    globals.set("query", json_to_lua(lua, &ctx.query)?)?;
    globals.set("body", json_to_lua(lua, &ctx.body)?)?;
    globals.set("headers", json_to_lua(lua, &ctx.headers)?)?;
    globals.set("cookies", json_to_lua(lua, &ctx.cookies)?)?;
    globals.set("params", json_to_lua(lua, &ctx.params)?)?;
    Ok(())
}

fn install_library(lua: &Lua, client: reqwest::Client, host: Arc<dyn ScriptHost>) -> mlua::Result<()> {
    let globals = lua.globals();

    let fetch = lua.create_async_function(move |lua, (url, opts): (String, Option<Table>)| {
        let client = client.clone();
        async move {
            let method_name = opts
                .as_ref()
                .and_then(|o| o.get::<String>("method").ok())
                .unwrap_or_else(|| "GET".to_string());
            let method = reqwest::Method::from_bytes(method_name.to_uppercase().as_bytes())
                .unwrap_or(reqwest::Method::GET);
            let mut builder = client.request(method, &url);

            if let Some(opts) = &opts {
                if let Ok(header_table) = opts.get::<Table>("headers") {
                    for pair in header_table.pairs::<String, String>() {
                        if let Ok((key, value)) = pair {
                            builder = builder.header(key, value);
                        }
                    }
                }
                if let Ok(body) = opts.get::<LuaValue>("body") {
                    match body {
                        LuaValue::String(s) => builder = builder.body(s.to_string_lossy().into_owned()),
                        LuaValue::Table(_) => builder = builder.json(&lua_to_json(&body)),
                        _ => {}
                    }
                }
            }

            let result = lua.create_table()?;
            match builder.send().await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let ok = resp.status().is_success();
                    let text = resp.text().await.unwrap_or_default();
                    let body_value: LuaValue = match serde_json::from_str::<JsonValue>(&text) {
                        Ok(parsed) => json_to_lua(&lua, &parsed)?,
                        Err(_) => LuaValue::String(lua.create_string(&text)?),
                    };
                    result.set("status", status)?;
                    result.set("ok", ok)?;
                    result.set("body", body_value)?;
                }
                Err(e) => {
                    result.set("status", 0)?;
                    result.set("ok", false)?;
                    result.set("body", lua.create_string(e.to_string())?)?;
                }
            }
            Ok(result)
        }
    })?;
    globals.set("fetch", fetch)?;

    let for_sql = host.clone();
    globals.set(
        "sqlQuery",
        lua.create_function(move |lua, (sql, params): (String, Option<Table>)| {
            let params_json = params.map(|t| table_to_json_array(&t)).unwrap_or_default();
            match for_sql.sql_query(&sql, &params_json) {
                Ok(value) => json_to_lua(lua, &value),
                Err(msg) => Err(mlua::Error::RuntimeError(msg)),
            }
        })?,
    )?;

    let for_find = host.clone();
    globals.set(
        "findQuery",
        lua.create_function(move |_, name: String| Ok(for_find.find_query(&name)))?,
    )?;

    let for_get = host.clone();
    globals.set(
        "getStore",
        lua.create_function(move |lua, key: String| match for_get.get_store(&key) {
            Some(value) => json_to_lua(lua, &value),
            None => Ok(LuaValue::Nil),
        })?,
    )?;

    let for_set = host;
    globals.set(
        "setStore",
        lua.create_function(move |_, (key, value): (String, LuaValue)| {
            Ok(for_set.set_store(&key, lua_to_json(&value)))
        })?,
    )?;

    Ok(())
}

fn table_to_json_array(table: &Table) -> Vec<JsonValue> {
    match lua_to_json(&LuaValue::Table(table.clone())) {
        JsonValue::Array(items) => items,
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHost;
    use serde_json::json;

    #[tokio::test]
    async fn runs_a_script_and_returns_its_result() {
        let engine = ScriptEngine::new();
        let ctx = ScriptContext {
            request: json!({"method": "GET"}),
            ..Default::default()
        };
        let result = engine
            .run("return { ok = true, method = request.method }", &ctx, Arc::new(NullHost))
            .await
            .unwrap();
        assert_eq!(result, json!({"ok": true, "method": "GET"}));
    }

    #[tokio::test]
    async fn repeat_runs_reuse_the_compiled_bytecode_cache() {
        let engine = ScriptEngine::new();
        let ctx = ScriptContext::default();
        engine.run("return 1", &ctx, Arc::new(NullHost)).await.unwrap();
        engine.run("return 1", &ctx, Arc::new(NullHost)).await.unwrap();
        assert_eq!(engine.cache_len(), 1);
    }

    #[tokio::test]
    async fn runtime_error_surfaces_as_err() {
        let engine = ScriptEngine::new();
        let ctx = ScriptContext::default();
        let err = engine.run("error('boom')", &ctx, Arc::new(NullHost)).await.unwrap_err();
        assert!(err.contains("boom"));
    }
}
