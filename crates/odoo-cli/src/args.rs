use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use odoo_client::config::{
    validate_timeout, ENV_DB, ENV_PASSWORD, ENV_TIMEOUT, ENV_URL, ENV_USERNAME,
};
use odoo_client::ClientConfig;
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(name = "odoo-cli", version, about = "Call an Odoo server over JSON-RPC")]
pub struct Args {
    /// Server base URL
    #[arg(long, env = ENV_URL, global = true)]
    pub url: Option<String>,

    #[arg(long, env = ENV_DB, global = true)]
    pub db: Option<String>,

    #[arg(long, env = ENV_USERNAME, global = true)]
    pub username: Option<String>,

    /// Password or API key
    #[arg(long, env = ENV_PASSWORD, hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// JSON config file. Without it, ~/.odoo-client/config.json is read when
    /// present and the flags/environment leave a required setting unset.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds (at least 1)
    #[arg(long, env = ENV_TIMEOUT, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print server version information
    Version,
    /// List databases on the server
    Databases,
    /// Authenticate and print the user id
    Login,
    /// Run execute_kw with raw JSON arguments
    Call {
        model: String,
        method: String,
        /// Positional arguments as a JSON array
        #[arg(long, default_value = "[]", value_parser = parse_json)]
        args: Value,
        /// Keyword arguments as a JSON object
        #[arg(long, default_value = "{}", value_parser = parse_json)]
        kwargs: Value,
    },
    /// Search and read records
    SearchRead {
        model: String,
        /// Search domain as a JSON array
        #[arg(long, default_value = "[]", value_parser = parse_json)]
        domain: Value,
        /// Comma separated field names
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long)]
        offset: Option<u64>,
        #[arg(long)]
        order: Option<String>,
    },
}

impl Command {
    fn needs_login(&self) -> bool {
        !matches!(self, Command::Version | Command::Databases)
    }
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {}", e))
}

impl Args {
    /// Flags and environment win over the config file.
    pub fn resolve_config(&self) -> anyhow::Result<ClientConfig> {
        self.resolve_with_default(ClientConfig::default_path().ok())
    }

    fn resolve_with_default(&self, default_path: Option<PathBuf>) -> anyhow::Result<ClientConfig> {
        let file = match (&self.config, default_path) {
            (Some(path), _) => Some(ClientConfig::load(path)?),
            (None, _) if self.flags_complete() => None,
            (None, Some(path)) if path.exists() => Some(
                ClientConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
            ),
            (None, _) => None,
        };
        self.merge(file)
    }

    /// Every setting the command needs came from flags or the environment.
    fn flags_complete(&self) -> bool {
        self.url.is_some()
            && (!self.command.needs_login()
                || (self.db.is_some() && self.username.is_some() && self.password.is_some()))
    }

    fn merge(&self, file: Option<ClientConfig>) -> anyhow::Result<ClientConfig> {
        let login = self.command.needs_login();
        let pick = |flag: &Option<String>, from_file: Option<&String>, name: &str, required: bool| {
            match flag.clone().or_else(|| from_file.cloned()) {
                Some(value) => Ok(value),
                None if required => anyhow::bail!(
                    "missing --{} (or set it in the environment or config file)",
                    name
                ),
                None => Ok(String::new()),
            }
        };
        let file = file.as_ref();

        let url = pick(&self.url, file.map(|f| &f.url), "url", true)?;
        let database = pick(&self.db, file.map(|f| &f.database), "db", login)?;
        let username = pick(&self.username, file.map(|f| &f.username), "username", login)?;
        let password = pick(&self.password, file.map(|f| &f.password), "password", login)?;

        let mut config = ClientConfig::new(url, database, username, password);
        if let Some(timeout) = self.timeout.or(file.map(|f| f.timeout_secs)) {
            config = config.with_timeout(validate_timeout(timeout)?);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_call() {
        let args = parse(&[
            "odoo-cli",
            "--url",
            "http://localhost:8069",
            "call",
            "res.partner",
            "search",
            "--args",
            r#"[[["is_company","=",true]]]"#,
        ]);

        assert_eq!(
            args.command,
            Command::Call {
                model: "res.partner".to_string(),
                method: "search".to_string(),
                args: json!([[["is_company", "=", true]]]),
                kwargs: json!({}),
            }
        );
    }

    #[test]
    fn test_parse_search_read_fields() {
        let args = parse(&[
            "odoo-cli",
            "search-read",
            "res.partner",
            "--fields",
            "name,email",
            "--limit",
            "5",
        ]);

        match args.command {
            Command::SearchRead { fields, limit, domain, .. } => {
                assert_eq!(fields, vec!["name", "email"]);
                assert_eq!(limit, Some(5));
                assert_eq!(domain, json!([]));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json_argument() {
        let argv = ["odoo-cli", "call", "res.partner", "read", "--args", "[1,"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let mut args = parse(&["odoo-cli", "login"]);
        args.url = None;
        args.db = Some("staging".to_string());
        args.username = None;
        args.password = None;
        args.timeout = None;

        let file = ClientConfig::new("http://file:8069", "prod", "admin", "secret").with_timeout(9);
        let config = args.merge(Some(file)).unwrap();

        assert_eq!(config.url, "http://file:8069");
        assert_eq!(config.database, "staging");
        assert_eq!(config.timeout_secs, 9);
    }

    #[test]
    fn test_login_requires_credentials() {
        let mut args = parse(&["odoo-cli", "login"]);
        args.url = Some("http://localhost:8069".to_string());
        args.db = None;
        args.username = None;
        args.password = None;

        assert!(args.merge(None).is_err());
    }

    fn malformed_default_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("odoo-cli-{}-{}.json", name, std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        path
    }

    #[test]
    fn test_complete_flags_skip_default_file() {
        let mut args = parse(&["odoo-cli", "databases"]);
        args.url = Some("http://localhost:8069".to_string());
        args.config = None;
        args.timeout = None;

        let path = malformed_default_file("skipped");
        let result = args.resolve_with_default(Some(path.clone()));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(result.unwrap().url, "http://localhost:8069");
    }

    #[test]
    fn test_incomplete_flags_read_default_file() {
        let mut args = parse(&["odoo-cli", "databases"]);
        args.url = None;
        args.config = None;

        let path = malformed_default_file("read");
        let result = args.resolve_with_default(Some(path.clone()));
        std::fs::remove_file(&path).unwrap();

        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut args = parse(&["odoo-cli", "version"]);
        args.url = Some("http://localhost:8069".to_string());
        args.timeout = Some(0);

        assert!(args.merge(None).is_err());
    }

    #[test]
    fn test_version_needs_only_url() {
        let mut args = parse(&["odoo-cli", "version"]);
        args.url = Some("http://localhost:8069".to_string());
        args.db = None;
        args.username = None;
        args.password = None;

        let config = args.merge(None).unwrap();
        assert_eq!(config.url, "http://localhost:8069");
        assert!(config.database.is_empty());
    }
}
