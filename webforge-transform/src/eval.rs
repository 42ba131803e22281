//! Evaluates a compiled transform [`Expr`] tree against a JSON input value.

use serde_json::{Map, Value};

use crate::ast::Expr;

pub fn eval(expr: &Expr, input: &Value) -> Result<Value, String> {
    match expr {
        Expr::Identity => Ok(input.clone()),
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Field(base, name) => {
            let base_val = eval(base, input)?;
            match base_val {
                Value::Object(map) => Ok(map.get(name).cloned().unwrap_or(Value::Null)),
                Value::Null => Ok(Value::Null),
                other => Err(format!("cannot access field '{name}' on {}", type_name(&other))),
            }
        }
        Expr::Index(base, idx) => {
            let base_val = eval(base, input)?;
            match base_val {
                Value::Array(items) => {
                    let len = items.len() as i64;
                    let resolved = if *idx < 0 { len + idx } else { *idx };
                    if resolved < 0 || resolved >= len {
                        Ok(Value::Null)
                    } else {
                        Ok(items[resolved as usize].clone())
                    }
                }
                Value::Null => Ok(Value::Null),
                other => Err(format!("cannot index into {}", type_name(&other))),
            }
        }
        Expr::Object(pairs) => {
            let mut map = Map::new();
            for (key, value_expr) in pairs {
                map.insert(key.clone(), eval(value_expr, input)?);
            }
            Ok(Value::Object(map))
        }
        Expr::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(eval(item, input)?);
            }
            Ok(Value::Array(out))
        }
        Expr::Concat(a, b) => {
            let av = eval(a, input)?;
            let bv = eval(b, input)?;
            concat(av, bv)
        }
        Expr::Pipe(a, b) => {
            let av = eval(a, input)?;
            eval(b, &av)
        }
        Expr::Call(name, args) => call(name, args, input),
    }
}

fn concat(a: Value, b: Value) -> Result<Value, String> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let sum = x.as_f64().unwrap_or(0.0) + y.as_f64().unwrap_or(0.0);
            Ok(serde_json::Number::from_f64(sum).map(Value::Number).unwrap_or(Value::Null))
        }
        (Value::Array(mut x), Value::Array(y)) => {
            x.extend(y);
            Ok(Value::Array(x))
        }
        (x, y) => Ok(Value::String(format!("{}{}", stringify(&x), stringify(&y)))),
    }
}

fn stringify(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn call(name: &str, args: &[Expr], input: &Value) -> Result<Value, String> {
    match name {
        "length" => {
            let v = eval(arg(args, 0)?, input)?;
            let len = match &v {
                Value::String(s) => s.chars().count(),
                Value::Array(a) => a.len(),
                Value::Object(m) => m.len(),
                Value::Null => 0,
                other => return Err(format!("length() not defined for {}", type_name(other))),
            };
            Ok(Value::Number((len as i64).into()))
        }
        "upper" => Ok(Value::String(eval_string(arg(args, 0)?, input)?.to_uppercase())),
        "lower" => Ok(Value::String(eval_string(arg(args, 0)?, input)?.to_lowercase())),
        "default" => {
            let v = eval(arg(args, 0)?, input)?;
            if matches!(v, Value::Null) {
                eval(arg(args, 1)?, input)
            } else {
                Ok(v)
            }
        }
        "keys" => match eval(arg(args, 0)?, input)? {
            Value::Object(map) => {
                let mut ks: Vec<String> = map.keys().cloned().collect();
                ks.sort();
                Ok(Value::Array(ks.into_iter().map(Value::String).collect()))
            }
            other => Err(format!("keys() not defined for {}", type_name(&other))),
        },
        "values" => match eval(arg(args, 0)?, input)? {
            Value::Object(map) => Ok(Value::Array(map.values().cloned().collect())),
            Value::Array(items) => Ok(Value::Array(items)),
            other => Err(format!("values() not defined for {}", type_name(&other))),
        },
        "toString" => Ok(Value::String(stringify(&eval(arg(args, 0)?, input)?))),
        "toNumber" => {
            let v = eval(arg(args, 0)?, input)?;
            match v {
                Value::Number(n) => Ok(Value::Number(n)),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot parse '{s}' as a number")),
                other => Err(format!("toNumber() not defined for {}", type_name(&other))),
            }
        }
        other => Err(format!("unknown function '{other}'")),
    }
}

fn arg(args: &[Expr], index: usize) -> Result<&Expr, String> {
    args.get(index).ok_or_else(|| format!("missing argument {index}"))
}

fn eval_string(expr: &Expr, input: &Value) -> Result<String, String> {
    match eval(expr, input)? {
        Value::String(s) => Ok(s),
        other => Err(format!("expected string, found {}", type_name(&other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::json;

    fn run(src: &str, input: Value) -> Value {
        eval(&parse(src).unwrap(), &input).unwrap()
    }

    #[test]
    fn identity_returns_input() {
        let input = json!({"a": 1});
        assert_eq!(run(".", input.clone()), input);
    }

    #[test]
    fn field_access_chain() {
        let input = json!({"user": {"name": "Ada"}});
        assert_eq!(run(".user.name", input), json!("Ada"));
    }

    #[test]
    fn missing_field_yields_null() {
        let input = json!({"user": {}});
        assert_eq!(run(".user.missing", input), Value::Null);
    }

    #[test]
    fn array_index_and_negative_index() {
        let input = json!({"items": [10, 20, 30]});
        assert_eq!(run(".items[0]", input.clone()), json!(10));
        assert_eq!(run(".items[-1]", input), json!(30));
    }

    #[test]
    fn object_construction() {
        let input = json!({"id": 7, "name": "Ada"});
        assert_eq!(run(r#"{ id: .id, label: .name }"#, input), json!({"id": 7, "label": "Ada"}));
    }

    #[test]
    fn concat_numbers_and_strings() {
        let input = json!({"a": 2, "b": 3});
        assert_eq!(run(".a + .b", input.clone()), json!(5.0));
        let input2 = json!({"first": "Ada", "last": "Lovelace"});
        assert_eq!(run(r#".first + " " + .last"#, input2), json!("Ada Lovelace"));
    }

    #[test]
    fn length_of_array() {
        let input = json!({"items": [1, 2, 3]});
        assert_eq!(run("length(.items)", input), json!(3));
    }

    #[test]
    fn default_substitutes_for_null() {
        let input = json!({});
        assert_eq!(run("default(.missing, 42)", input), json!(42));
    }

    #[test]
    fn pipe_threads_result_into_next_stage() {
        let input = json!({"user": {"name": "ada"}});
        assert_eq!(run(".user | .name | upper(.)", input), json!("ADA"));
    }
}
