//! Loads a `Site` from disk and resolves its `Value`-typed fields
//! (`database`, `port`) against the process environment, then opens the
//! connection pool those resolved values describe.

use std::path::Path;
use std::sync::Arc;

use webforge_core::ast::Site;
use webforge_core::error::ParseError;
use webforge_data::error::DataError;
use webforge_data::pool::ConnectionPool;

pub struct LoadedSite {
    pub site: Site,
    pub port: u16,
    pub database_url: Option<String>,
    pub errors: Vec<ParseError>,
}

/// Default listen port when the DSL declares none and resolution fails,
/// matching `Site::default()`'s own port (§3: `port (value)`).
const DEFAULT_PORT: i64 = 3000;

pub fn load_site(path: &Path) -> LoadedSite {
    let (site, errors) = webforge_parser::parse_file(path);
    for err in &errors {
        tracing::error!(line = err.line, message = %err.message, "site parse error");
    }

    let port = site.port.resolve_int().unwrap_or(DEFAULT_PORT).clamp(1, 65535) as u16;
    let database_url = site.database.resolve_string();

    LoadedSite {
        site,
        port,
        database_url,
        errors,
    }
}

/// Open the connection pool described by `database_url`, or `None` if the
/// site declares no database at all — pipelines that hit a SQL step
/// without a pool simply return null (§4.8) rather than failing startup.
pub async fn open_pool(database_url: Option<&str>, initial_size: usize, max_size: usize) -> Result<Option<Arc<ConnectionPool>>, DataError> {
    match database_url {
        Some(url) => Ok(Some(ConnectionPool::connect(url, initial_size, max_size).await?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_minimal_site_and_resolves_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "website {{ name \"Test\" }}").unwrap();
        let loaded = load_site(file.path());
        assert_eq!(loaded.port, 3000);
        assert!(loaded.database_url.is_none());
        assert!(loaded.errors.is_empty());
    }

    #[test]
    fn resolves_an_explicit_port() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "website {{ name \"Test\" port 8080 }}").unwrap();
        let loaded = load_site(file.path());
        assert_eq!(loaded.port, 8080);
    }
}
