//! Run configuration, read once at startup from the environment and an
//! optional env file.
//!
//! Values already present in the process environment win over values from the
//! file. The file is read without modifying the process environment.

use crate::error::{DictError, Result};
use secrecy::SecretString;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Schemas documented when `DICTIONARY_SCHEMAS` is not set.
pub const DEFAULT_SCHEMAS: [&str; 2] = ["public", "outro_esquema"];

/// Default stem of the output file; the extension follows the format.
pub const DEFAULT_OUTPUT_STEM: &str = "data_dictionary";

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// SSH endpoint the tunnel is opened through.
#[derive(Debug)]
pub struct TunnelSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub private_key_path: PathBuf,
    pub private_key_passphrase: Option<SecretString>,
    /// Expected server key fingerprint (`SHA256:...`). Unchecked when `None`.
    pub host_key_fingerprint: Option<String>,
}

/// Database reached through the tunnel. `host` and `port` are resolved on the
/// SSH server side.
#[derive(Debug)]
pub struct DbSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: SecretString,
}

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Pdf,
    Markdown,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }

    /// Whether a file extension is usual for this format (case-insensitive).
    pub fn matches_extension(self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        match self {
            Self::Markdown => ext == "md" || ext == "markdown",
            _ => ext == self.extension(),
        }
    }
}

/// Everything one run needs.
#[derive(Debug)]
pub struct AppConfig {
    pub tunnel: TunnelSettings,
    pub database: DbSettings,
    /// Schemas to document, in order, without duplicates
    pub schemas: Vec<String>,
    pub format: OutputFormat,
    /// Explicit output path; `None` means `data_dictionary.<ext>`
    pub output: Option<PathBuf>,
    pub connect_timeout: Duration,
}

impl AppConfig {
    /// Load from the process environment, falling back to `env_file` (or
    /// `./.env` when `None`, if present).
    ///
    /// # Errors
    ///
    /// Returns `DictError::Config` for an unreadable env file, a missing
    /// required variable, or a malformed value.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        let file_vars = read_env_file(env_file)?;
        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| file_vars.get(key).cloned())
        })
    }

    /// Build and validate a configuration from a key lookup.
    ///
    /// # Errors
    ///
    /// Returns `DictError::Config` for a missing required key or a malformed
    /// value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let tunnel = TunnelSettings {
            host: vars.required("SSH_HOST")?,
            port: vars.port("SSH_PORT")?,
            username: vars.required("SSH_USERNAME")?,
            private_key_path: PathBuf::from(vars.required("SSH_PRIVATE_KEY_PATH")?),
            private_key_passphrase: vars
                .optional("SSH_PRIVATE_KEY_PASSPHRASE")
                .map(|p| SecretString::new(p.into())),
            host_key_fingerprint: vars.optional("SSH_HOST_KEY_FINGERPRINT"),
        };

        let database = DbSettings {
            host: vars.required("POSTGRES_HOST")?,
            port: vars.port("POSTGRES_PORT")?,
            database: vars.required("POSTGRES_DBNAME")?,
            user: vars.required("POSTGRES_USER")?,
            password: SecretString::new(vars.required_raw("POSTGRES_PASSWORD")?.into()),
        };

        let schemas = match vars.optional("DICTIONARY_SCHEMAS") {
            Some(list) => parse_schema_list(&list)?,
            None => DEFAULT_SCHEMAS.iter().map(|s| (*s).to_owned()).collect(),
        };

        let connect_timeout = match vars.optional("CONNECT_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    DictError::Config(format!("CONNECT_TIMEOUT_SECS must be a number of seconds, got '{raw}'"))
                })?;
                if secs == 0 {
                    return Err(DictError::Config(
                        "CONNECT_TIMEOUT_SECS must be greater than zero".to_owned(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self {
            tunnel,
            database,
            schemas,
            format: OutputFormat::default(),
            output: vars.optional("DICTIONARY_OUTPUT").map(PathBuf::from),
            connect_timeout,
        })
    }

    /// Replace the schema list, keeping first occurrences only.
    ///
    /// # Errors
    ///
    /// Returns `DictError::Config` if no non-empty schema name remains.
    pub fn set_schemas<I, S>(&mut self, schemas: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.schemas = dedup_schemas(schemas)?;
        Ok(())
    }

    /// Where the document is written.
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            PathBuf::from(format!("{DEFAULT_OUTPUT_STEM}.{}", self.format.extension()))
        })
    }

    /// The explicit output path, when its extension does not suit the format.
    ///
    /// The path is used as given either way; this only lets the caller warn.
    pub fn mismatched_output(&self) -> Option<&Path> {
        let output = self.output.as_deref()?;
        let matches = output
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.format.matches_extension(ext));
        (!matches).then_some(output)
    }
}

/// Parse a comma-separated schema list.
///
/// # Errors
///
/// Returns `DictError::Config` if the list names no schema.
pub fn parse_schema_list(list: &str) -> Result<Vec<String>> {
    dedup_schemas(list.split(','))
}

fn dedup_schemas<I, S>(schemas: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for schema in schemas {
        let schema = schema.as_ref().trim();
        if !schema.is_empty() && !out.iter().any(|s| s == schema) {
            out.push(schema.to_owned());
        }
    }
    if out.is_empty() {
        return Err(DictError::Config("at least one schema is required".to_owned()));
    }
    Ok(out)
}

fn read_env_file(path: Option<&Path>) -> Result<HashMap<String, String>> {
    let iter = match path {
        Some(p) => dotenvy::from_path_iter(p).map_err(|e| {
            DictError::Config(format!("Failed to read env file {}: {e}", p.display()))
        })?,
        None => match dotenvy::dotenv_iter() {
            Ok(iter) => iter,
            Err(e) if e.not_found() => return Ok(HashMap::new()),
            Err(e) => return Err(DictError::Config(format!("Failed to read .env: {e}"))),
        },
    };

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) =
            item.map_err(|e| DictError::Config(format!("Malformed env file entry: {e}")))?;
        vars.insert(key, value);
    }
    Ok(vars)
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .ok_or_else(|| DictError::Config(format!("{key} is not set")))
    }

    // Passwords are taken verbatim, surrounding whitespace included.
    fn required_raw(&self, key: &str) -> Result<String> {
        (self.0)(key).ok_or_else(|| DictError::Config(format!("{key} is not set")))
    }

    fn port(&self, key: &str) -> Result<u16> {
        let raw = self.required(key)?;
        match raw.parse::<u16>() {
            Ok(port) if port != 0 => Ok(port),
            _ => Err(DictError::Config(format!("{key} must be a port number, got '{raw}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret as _;

    fn base_vars() -> HashMap<String, String> {
        [
            ("SSH_HOST", "bastion.example.com"),
            ("SSH_PORT", "22"),
            ("SSH_USERNAME", "deploy"),
            ("SSH_PRIVATE_KEY_PATH", "/home/deploy/.ssh/id_ed25519"),
            ("POSTGRES_HOST", "10.0.0.5"),
            ("POSTGRES_PORT", "5432"),
            ("POSTGRES_DBNAME", "app"),
            ("POSTGRES_USER", "reader"),
            ("POSTGRES_PASSWORD", "s3cret"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
    }

    fn load(vars: &HashMap<String, String>) -> Result<AppConfig> {
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let config = load(&base_vars())?;
        assert_eq!(config.tunnel.host, "bastion.example.com");
        assert_eq!(config.tunnel.port, 22);
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.password.expose_secret(), "s3cret");
        assert_eq!(config.schemas, vec!["public", "outro_esquema"]);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.output_path(), PathBuf::from("data_dictionary.pdf"));
        assert!(config.tunnel.host_key_fingerprint.is_none());
        Ok(())
    }

    #[test]
    fn test_missing_required_key() {
        let mut vars = base_vars();
        vars.remove("POSTGRES_DBNAME");
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, DictError::Config(ref m) if m.contains("POSTGRES_DBNAME")));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("SSH_HOST".to_owned(), "   ".to_owned());
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = base_vars();
        vars.insert("SSH_PORT".to_owned(), "ssh".to_owned());
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("SSH_PORT"));

        vars.insert("SSH_PORT".to_owned(), "0".to_owned());
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_schema_list_is_deduplicated() -> Result<()> {
        let mut vars = base_vars();
        vars.insert("DICTIONARY_SCHEMAS".to_owned(), "sales, public,sales,,".to_owned());
        let config = load(&vars)?;
        assert_eq!(config.schemas, vec!["sales", "public"]);
        Ok(())
    }

    #[test]
    fn test_empty_schema_override_rejected() -> Result<()> {
        let mut config = load(&base_vars())?;
        assert!(config.set_schemas([" ", ""]).is_err());
        config.set_schemas(["audit"])?;
        assert_eq!(config.schemas, vec!["audit"]);
        Ok(())
    }

    #[test]
    fn test_output_path_follows_format() -> Result<()> {
        let mut config = load(&base_vars())?;
        config.format = OutputFormat::Markdown;
        assert_eq!(config.output_path(), PathBuf::from("data_dictionary.md"));

        config.output = Some(PathBuf::from("out/dict.pdf"));
        assert_eq!(config.output_path(), PathBuf::from("out/dict.pdf"));
        Ok(())
    }

    #[test]
    fn test_mismatched_output_extension() -> Result<()> {
        let mut config = load(&base_vars())?;
        assert_eq!(config.mismatched_output(), None);

        config.output = Some(PathBuf::from("out.pdf"));
        assert_eq!(config.mismatched_output(), None);

        config.format = OutputFormat::Markdown;
        assert_eq!(config.mismatched_output(), Some(Path::new("out.pdf")));

        config.output = Some(PathBuf::from("out.MD"));
        assert_eq!(config.mismatched_output(), None);

        config.format = OutputFormat::Json;
        config.output = Some(PathBuf::from("dictionary"));
        assert_eq!(config.mismatched_output(), Some(Path::new("dictionary")));
        Ok(())
    }

    #[test]
    fn test_timeout_must_be_positive() {
        let mut vars = base_vars();
        vars.insert("CONNECT_TIMEOUT_SECS".to_owned(), "0".to_owned());
        assert!(load(&vars).is_err());

        vars.insert("CONNECT_TIMEOUT_SECS".to_owned(), "30".to_owned());
        assert_eq!(
            load(&vars).map(|c| c.connect_timeout).ok(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_env_file_values_are_read() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("dictionary.env");
        std::fs::write(&path, "PGDICT_TEST_ONLY_KEY=from-file\n# comment\n")?;

        let vars = read_env_file(Some(path.as_path()))?;
        assert_eq!(vars.get("PGDICT_TEST_ONLY_KEY").map(String::as_str), Some("from-file"));
        Ok(())
    }

    #[test]
    fn test_missing_env_file_is_an_error() {
        let err = read_env_file(Some(Path::new("/nonexistent/pgdict.env"))).unwrap_err();
        assert!(matches!(err, DictError::Config(_)));
    }
}
