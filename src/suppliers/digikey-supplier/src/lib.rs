//! Digi-Key supplier integration.
//!
//! [`DigikeyPlugin`] connects a host catalog to the Digi-Key API: it runs the
//! OAuth2 authorization-code flow, searches products by keyword, and imports
//! a product's manufacturer part, supplier part and price breaks into the
//! host catalog. Every host facility it needs is injected through
//! [`HostPorts`].

mod auth;
mod client;
pub mod connection;
mod mapping;
pub mod models;

pub use auth::{ConnectionStatus, TokenExchange};
pub use client::{classify_response, is_token_expired, TOKEN_EXPIRED_MESSAGE};
pub use mapping::{manufacturer_name, IMPORT_EVENT, SUPPLIER_COMPANY};

use async_trait::async_trait;
use partlink_core::catalog::{CatalogStore, CategoryId, Part};
use partlink_core::notify::{Notifier, UserId};
use partlink_core::routes::{HttpMethod, Route, RouteAccess, RouteRequest, RouteResponse};
use partlink_core::settings::SettingsStore;
use partlink_core::tasks::TaskOffloader;
use partlink_core::{
    DigikeyApiConfig, HostConfig, SupplierCapabilities, SupplierError, SupplierPlugin,
    SupplierResult,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const PLUGIN_SLUG: &str = "digikey";
pub const PRODUCTION_BASE_URL: &str = "https://api.digikey.com";
pub const SANDBOX_BASE_URL: &str = "https://sandbox-api.digikey.com";

pub const CALLBACK_PATH: &str = "digikey_callback/";
pub const SETUP_PATH: &str = "setup/";

#[derive(Debug, Clone)]
pub struct DigikeyConfig {
    pub auth_base_url: String,
    pub api_base_url: String,
    pub host: HostConfig,
}

impl DigikeyConfig {
    pub fn production(host: HostConfig) -> Self {
        Self {
            auth_base_url: PRODUCTION_BASE_URL.into(),
            api_base_url: PRODUCTION_BASE_URL.into(),
            host,
        }
    }

    pub fn sandbox(host: HostConfig) -> Self {
        Self {
            auth_base_url: SANDBOX_BASE_URL.into(),
            api_base_url: SANDBOX_BASE_URL.into(),
            host,
        }
    }

    /// Picks production or sandbox, then applies any explicit base URL overrides.
    pub fn from_settings(api: &DigikeyApiConfig, host: HostConfig) -> Self {
        let mut config = if api.sandbox {
            Self::sandbox(host)
        } else {
            Self::production(host)
        };
        if let Some(url) = &api.auth_base_url {
            config.auth_base_url = url.clone();
        }
        if let Some(url) = &api.api_base_url {
            config.api_base_url = url.clone();
        }
        config
    }
}

/// Host facilities the plugin is composed over.
#[derive(Clone)]
pub struct HostPorts {
    pub settings: Arc<dyn SettingsStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub notifier: Arc<dyn Notifier>,
    pub tasks: Arc<dyn TaskOffloader>,
}

#[derive(Clone)]
pub struct DigikeyPlugin {
    id: String,
    name: String,
    client: Client,
    auth_base: Url,
    api_base: Url,
    host: HostConfig,
    settings: Arc<dyn SettingsStore>,
    catalog: Arc<dyn CatalogStore>,
    notifier: Arc<dyn Notifier>,
    tasks: Arc<dyn TaskOffloader>,
}

impl DigikeyPlugin {
    pub fn new(config: DigikeyConfig, ports: HostPorts) -> SupplierResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| SupplierError::Network {
                message: e.to_string(),
            })?;
        Ok(Self {
            id: PLUGIN_SLUG.into(),
            name: "Digikey Supplier Integration".into(),
            client,
            auth_base: parse_base_url(&config.auth_base_url)?,
            api_base: parse_base_url(&config.api_base_url)?,
            host: config.host,
            settings: ports.settings,
            catalog: ports.catalog,
            notifier: ports.notifier,
            tasks: ports.tasks,
        })
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    fn endpoint(base: &Url, path: &str) -> SupplierResult<Url> {
        base.join(path).map_err(|e| SupplierError::Validation {
            message: format!("invalid endpoint {path}: {e}"),
        })
    }
}

/// Parses a base URL and guarantees a trailing slash so `join` appends.
fn parse_base_url(raw: &str) -> SupplierResult<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).map_err(|e| SupplierError::Validation {
        message: format!("invalid base url {raw:?}: {e}"),
    })
}

#[async_trait]
impl SupplierPlugin for DigikeyPlugin {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> SupplierResult<SupplierCapabilities> {
        let settings = self.settings();
        Ok(SupplierCapabilities {
            search: connection::search_enabled(settings)?,
            order: connection::order_enabled(settings)?,
            related_vendor: connection::related_vendor(settings)?,
        })
    }

    fn routes(&self) -> Vec<Route> {
        vec![
            Route {
                method: HttpMethod::Get,
                path: CALLBACK_PATH,
                name: "digikey_callback",
                access: RouteAccess::Public,
            },
            Route {
                method: HttpMethod::Get,
                path: SETUP_PATH,
                name: "digikey_setup",
                access: RouteAccess::Authenticated,
            },
        ]
    }

    async fn handle(&self, request: &RouteRequest) -> SupplierResult<RouteResponse> {
        match request.normalized_path() {
            p if p == CALLBACK_PATH.trim_end_matches('/') => self.handle_callback(request).await,
            p if p == SETUP_PATH.trim_end_matches('/') => Ok(RouteResponse::Redirect {
                location: self.authorization_url()?.to_string(),
            }),
            other => Err(SupplierError::NotFound {
                entity: format!("route {other}"),
            }),
        }
    }

    async fn search(&self, term: &str) -> SupplierResult<serde_json::Value> {
        self.search_by_keyword(term).await
    }

    async fn import(
        &self,
        term: &str,
        category: Option<CategoryId>,
        user: &UserId,
    ) -> SupplierResult<Part> {
        let payload = self.fetch_part_detail(term).await?;
        self.import_part(&payload, category, user)
    }
}
