use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use digikey_supplier::connection::{self, DIGI_CLIENT_SECRET, RESPONSE};
use digikey_supplier::{DigikeyConfig, DigikeyPlugin, HostPorts, PLUGIN_SLUG};
use partlink_core::catalog::{CatalogSnapshot, CategoryId, MemoryCatalog};
use partlink_core::notify::{LogNotifier, UserId};
use partlink_core::routes::{RouteRequest, RouteResponse};
use partlink_core::secrets::SecretKind;
use partlink_core::settings::FileSettingsStore;
use partlink_core::tasks::InlineOffloader;
use partlink_core::{init_logging, AppDirs, Config, SupplierError, SupplierPlugin};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "partlink", version, about = "Supplier integrations for the parts catalog")]
struct Cli {
    /// Supplier connection to use
    #[arg(long, global = true, default_value = "default")]
    connection: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Digi-Key connection management
    #[command(subcommand)]
    Digikey(DigikeyCommand),
    /// Keyword search; prints the supplier's JSON
    Search {
        term: String,
    },
    /// Fetch a supplier part number and import it into the catalog
    Import {
        term: String,
        /// Host category id for a newly created part
        #[arg(long)]
        category: Option<u64>,
        /// User notified about the import
        #[arg(long, default_value = "admin")]
        user: String,
    },
}

#[derive(Debug, Subcommand)]
enum DigikeyCommand {
    /// Print the URL that starts the OAuth authorization
    AuthorizeUrl,
    /// Complete the OAuth flow with the code from the redirect
    Callback(CallbackCommand),
    /// Show whether the connection is authenticated
    Status,
    /// Forget the stored token
    Disconnect,
    /// Store a connection or plugin setting
    Set { key: String, value: String },
}

#[derive(Debug, Parser, Clone)]
struct CallbackCommand {
    /// Authorization code
    #[arg(long, conflicts_with = "url")]
    code: Option<String>,
    /// Full redirect URL as shown in the browser's address bar
    #[arg(long)]
    url: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
enum CliError {
    #[error("unknown setting {0}; expected one of: {keys}", keys = connection::ALL_KEYS.join(", "))]
    UnknownSetting(String),
    #[error("callback needs --code or --url")]
    MissingCallbackInput,
}

impl CallbackCommand {
    fn request(&self) -> Result<RouteRequest, CliError> {
        let request = RouteRequest::new(digikey_supplier::CALLBACK_PATH);
        match (&self.code, &self.url) {
            (Some(code), _) => Ok(request.with_query("code", code)),
            (None, Some(url)) => {
                let query = url.split_once('?').map(|(_, q)| q).unwrap_or_default();
                Ok(request.with_query_string(query))
            }
            (None, None) => Err(CliError::MissingCallbackInput),
        }
    }
}

fn validate_setting_key(key: &str) -> Result<&'static str, CliError> {
    connection::ALL_KEYS
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(key))
        .ok_or_else(|| CliError::UnknownSetting(key.to_string()))
}

fn load_catalog(path: &Path) -> Result<MemoryCatalog> {
    if !path.exists() {
        return Ok(MemoryCatalog::new());
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let snapshot: CatalogSnapshot = serde_json::from_str(&contents)
        .with_context(|| format!("parsing catalog {}", path.display()))?;
    Ok(MemoryCatalog::from_snapshot(snapshot))
}

fn save_catalog(path: &Path, catalog: &MemoryCatalog) -> Result<()> {
    let snapshot = catalog.snapshot()?;
    let encoded = serde_json::to_string_pretty(&snapshot)?;
    fs::write(path, encoded).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn build_plugin(
    config: &Config,
    dirs: &AppDirs,
    connection: &str,
    catalog: Arc<MemoryCatalog>,
) -> Result<DigikeyPlugin> {
    let settings = FileSettingsStore::new(dirs.settings_file(), PLUGIN_SLUG, connection)
        .with_secret(DIGI_CLIENT_SECRET, SecretKind::ClientSecret)
        .with_secret(RESPONSE, SecretKind::TokenResponse);
    let plugin = DigikeyPlugin::new(
        DigikeyConfig::from_settings(&config.digikey, config.host.clone()),
        HostPorts {
            settings: Arc::new(settings),
            catalog,
            notifier: Arc::new(LogNotifier),
            // The process exits after one command, so jobs must finish before returning.
            tasks: Arc::new(InlineOffloader::new()),
        },
    )?;
    Ok(plugin)
}

/// Adds a reconnect hint to authentication failures.
fn explain(err: SupplierError) -> anyhow::Error {
    if err.is_authentication_failure() {
        anyhow::Error::new(err)
            .context("Digi-Key connection is not usable; run `partlink digikey authorize-url`")
    } else {
        anyhow::Error::new(err)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = AppDirs::discover()?;
    dirs.ensure_exists()?;
    let config = Config::load_or_default(&dirs)?;
    let _logging = init_logging(&config.logging, &dirs)?;

    let catalog_path = dirs.catalog_file();
    let catalog = Arc::new(load_catalog(&catalog_path)?);
    let plugin = build_plugin(&config, &dirs, &cli.connection, catalog.clone())?;

    match cli.command {
        Command::Digikey(DigikeyCommand::AuthorizeUrl) => {
            println!("{}", plugin.authorization_url()?);
            println!("Redirect URI registered with Digi-Key must be: {}", plugin.redirect_uri());
        }
        Command::Digikey(DigikeyCommand::Callback(callback)) => {
            let request = callback.request()?;
            let RouteResponse::Redirect { location } = plugin.handle(&request).await?;
            let status = plugin.connection_status()?;
            if status.authenticated {
                println!("Digi-Key connection authenticated.");
            } else {
                println!("Token exchange did not succeed; check the log for details.");
            }
            tracing::debug!(%location, "callback redirect");
        }
        Command::Digikey(DigikeyCommand::Status) => {
            let status = plugin.connection_status()?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Digikey(DigikeyCommand::Disconnect) => {
            plugin.disconnect()?;
            println!("Digi-Key connection cleared.");
        }
        Command::Digikey(DigikeyCommand::Set { key, value }) => {
            let key = validate_setting_key(&key)?;
            plugin.settings().set(key, &value)?;
            tracing::info!(key, "setting stored");
        }
        Command::Search { term } => {
            let results = plugin.search(&term).await.map_err(explain)?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Import {
            term,
            category,
            user,
        } => {
            let part = plugin
                .import(&term, category.map(CategoryId), &UserId::new(user))
                .await
                .map_err(explain)?;
            save_catalog(&catalog_path, &catalog)?;
            println!("Imported part {} (id {})", part.name, part.id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_keys_are_case_insensitive() {
        assert_eq!(validate_setting_key("digi_client_id"), Ok("DIGI_CLIENT_ID"));
        assert!(matches!(
            validate_setting_key("API_KEY"),
            Err(CliError::UnknownSetting(_))
        ));
    }

    #[test]
    fn callback_code_from_redirect_url() {
        let callback = CallbackCommand {
            code: None,
            url: Some(
                "http://localhost:8000/plugin/digikey/digikey_callback/?code=Ab%2Bc&state=1".into(),
            ),
        };
        let request = callback.request().expect("request");
        assert_eq!(request.query_param("code"), Some("Ab+c"));
        assert_eq!(request.normalized_path(), "digikey_callback");
    }

    #[test]
    fn callback_requires_input() {
        let callback = CallbackCommand {
            code: None,
            url: None,
        };
        assert_eq!(callback.request(), Err(CliError::MissingCallbackInput));
    }

    #[test]
    fn cli_parses_import() {
        let cli = Cli::try_parse_from([
            "partlink",
            "import",
            "296-1411-5-ND",
            "--category",
            "4",
            "--connection",
            "lab",
        ])
        .expect("parse");
        assert_eq!(cli.connection, "lab");
        match cli.command {
            Command::Import { term, category, user } => {
                assert_eq!(term, "296-1411-5-ND");
                assert_eq!(category, Some(4));
                assert_eq!(user, "admin");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn catalog_file_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("catalog.json");
        let catalog = load_catalog(&path).unwrap();
        assert!(catalog.snapshot().unwrap().parts.is_empty());
        save_catalog(&path, &catalog).unwrap();
        assert!(load_catalog(&path).is_ok());
    }
}
