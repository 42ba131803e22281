//! The `Value` abstraction — a tagged literal with deferred resolution.
//!
//! DSL declarations like `database $DATABASE_URL` or `port 8080` parse to a
//! `Value` rather than a concrete string/integer, because environment
//! references (`$NAME`) are only resolved once the process environment is
//! available (startup, after `.env` has been loaded), not at parse time.

use std::env;

/// A literal as it appears in source, before environment resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Str(String),
    Num(i64),
    /// `$NAME` — resolved against the process environment at runtime.
    EnvRef(String),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn env_ref(name: impl Into<String>) -> Self {
        Value::EnvRef(name.into())
    }

    /// Resolve to a string. Missing environment variables resolve to `None`,
    /// matching §6: "missing variables resolve to null."
    pub fn resolve_string(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Str(s) => Some(s.clone()),
            Value::Num(n) => Some(n.to_string()),
            Value::EnvRef(name) => env::var(name).ok(),
        }
    }

    /// Resolve to an integer. Non-numeric strings and missing env vars
    /// resolve to `None`.
    pub fn resolve_int(&self) -> Option<i64> {
        match self {
            Value::Null => None,
            Value::Num(n) => Some(*n),
            Value::Str(s) => s.trim().parse().ok(),
            Value::EnvRef(name) => env::var(name).ok().and_then(|s| s.trim().parse().ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_value_resolves_to_itself() {
        assert_eq!(Value::str("hello").resolve_string(), Some("hello".into()));
    }

    #[test]
    fn num_value_resolves_to_decimal_string() {
        assert_eq!(Value::Num(42).resolve_string(), Some("42".into()));
        assert_eq!(Value::Num(42).resolve_int(), Some(42));
    }

    #[test]
    fn missing_env_ref_resolves_to_none() {
        // Extremely unlikely to collide with a real environment variable.
        let v = Value::env_ref("WEBFORGE_TEST_DOES_NOT_EXIST_XYZ");
        assert_eq!(v.resolve_string(), None);
        assert_eq!(v.resolve_int(), None);
    }

    #[test]
    fn present_env_ref_resolves() {
        // SAFETY: test-only, single-threaded mutation of the process env.
        unsafe {
            env::set_var("WEBFORGE_TEST_VALUE_XYZ", "99");
        }
        let v = Value::env_ref("WEBFORGE_TEST_VALUE_XYZ");
        assert_eq!(v.resolve_string(), Some("99".into()));
        assert_eq!(v.resolve_int(), Some(99));
        unsafe {
            env::remove_var("WEBFORGE_TEST_VALUE_XYZ");
        }
    }

    #[test]
    fn null_resolves_to_none() {
        assert_eq!(Value::Null.resolve_string(), None);
        assert_eq!(Value::Null.resolve_int(), None);
    }
}
