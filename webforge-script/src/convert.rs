//! JSON <-> Lua value conversion. Lua has no distinct integer/float-typed
//! JSON-null analogue, so conversion is necessarily lossy at the edges
//! (e.g. Lua `nil` table fields are indistinguishable from absent keys);
//! good enough for the request/response shapes this DSL passes around.

use mlua::{Lua, Value as LuaValue};
use serde_json::{Map, Value as JsonValue};

pub fn json_to_lua(lua: &Lua, value: &JsonValue) -> mlua::Result<LuaValue> {
    Ok(match value {
        JsonValue::Null => LuaValue::Nil,
        JsonValue::Bool(b) => LuaValue::Boolean(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                LuaValue::Integer(i)
            } else {
                LuaValue::Number(n.as_f64().unwrap_or(0.0))
            }
        }
        JsonValue::String(s) => LuaValue::String(lua.create_string(s)?),
        JsonValue::Array(items) => {
            let table = lua.create_table()?;
            for (i, item) in items.iter().enumerate() {
                table.set(i + 1, json_to_lua(lua, item)?)?;
            }
            LuaValue::Table(table)
        }
        JsonValue::Object(map) => {
            let table = lua.create_table()?;
            for (key, val) in map {
                table.set(key.as_str(), json_to_lua(lua, val)?)?;
            }
            LuaValue::Table(table)
        }
    })
}

pub fn lua_to_json(value: &LuaValue) -> JsonValue {
    match value {
        LuaValue::Nil => JsonValue::Null,
        LuaValue::Boolean(b) => JsonValue::Bool(*b),
        LuaValue::Integer(i) => JsonValue::Number((*i).into()),
        LuaValue::Number(n) => serde_json::Number::from_f64(*n).map(JsonValue::Number).unwrap_or(JsonValue::Null),
        LuaValue::String(s) => JsonValue::String(s.to_string_lossy()),
        LuaValue::Table(table) => {
            // A table with a contiguous 1.. integer key sequence (Lua's
            // notion of an array) becomes a JSON array; anything else
            // becomes an object.
            let len = table.raw_len();
            let is_array = len > 0
                && table
                    .clone()
                    .pairs::<LuaValue, LuaValue>()
                    .filter_map(Result::ok)
                    .all(|(k, _)| matches!(k, LuaValue::Integer(i) if i >= 1 && i as usize <= len));

            if is_array {
                let mut items = Vec::with_capacity(len);
                for i in 1..=len {
                    let v: LuaValue = table.get(i).unwrap_or(LuaValue::Nil);
                    items.push(lua_to_json(&v));
                }
                JsonValue::Array(items)
            } else {
                let mut map = Map::new();
                for pair in table.clone().pairs::<LuaValue, LuaValue>() {
                    let Ok((k, v)) = pair else { continue };
                    let key = match k {
                        LuaValue::String(s) => s.to_string_lossy(),
                        LuaValue::Integer(i) => i.to_string(),
                        LuaValue::Number(n) => n.to_string(),
                        _ => continue,
                    };
                    map.insert(key, lua_to_json(&v));
                }
                JsonValue::Object(map)
            }
        }
        _ => JsonValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_scalars_and_objects() {
        let lua = Lua::new();
        let input = json!({"name": "Ada", "age": 36, "active": true, "tags": ["a", "b"]});
        let lv = json_to_lua(&lua, &input).unwrap();
        let back = lua_to_json(&lv);
        assert_eq!(back, input);
    }

    #[test]
    fn empty_array_round_trips() {
        let lua = Lua::new();
        let input = json!([1, 2, 3]);
        let lv = json_to_lua(&lua, &input).unwrap();
        assert_eq!(lua_to_json(&lv), input);
    }
}
