use crate::catalog::{CatalogError, CategoryId, CompanyId, Part};
use crate::notify::UserId;
use crate::routes::{Route, RouteRequest, RouteResponse};
use crate::settings::SettingsError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capability flags a supplier plugin advertises to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SupplierCapabilities {
    pub search: bool,
    pub order: bool,
    /// Host company record this supplier is linked to, if configured.
    pub related_vendor: Option<CompanyId>,
}

/// Failure categories surfaced to the host and, through it, to the user.
#[derive(Debug, Error)]
pub enum SupplierError {
    #[error("not found: {entity}")]
    NotFound { entity: String },
    #[error("authentication error: {message}")]
    AuthenticationError { message: String },
    #[error("authentication expired")]
    AuthenticationExpired,
    #[error("remote service returned {status}: {body}")]
    RemoteService { status: u16, body: String },
    #[error("validation error: {message}")]
    Validation { message: String },
    #[error("parse error: {message}")]
    Parse { message: String },
    #[error("network error: {message}")]
    Network { message: String },
    #[error("{feature} is disabled for this supplier")]
    Disabled { feature: String },
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl SupplierError {
    /// Expired tokens and missing authentication both mean "connect again".
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            SupplierError::AuthenticationError { .. } | SupplierError::AuthenticationExpired
        )
    }

    /// HTTP status the host should answer with when this error ends a request.
    pub fn http_status(&self) -> u16 {
        match self {
            SupplierError::NotFound { .. } => 404,
            SupplierError::AuthenticationError { .. } | SupplierError::AuthenticationExpired => 403,
            SupplierError::Validation { .. } | SupplierError::Disabled { .. } => 400,
            SupplierError::RemoteService { .. } | SupplierError::Network { .. } => 502,
            SupplierError::Parse { .. }
            | SupplierError::Settings(_)
            | SupplierError::Catalog(_) => 500,
        }
    }
}

pub type SupplierResult<T> = Result<T, SupplierError>;

/// Supplier integration as seen by the host.
///
/// Search results are the supplier's own JSON; the host renders them as-is.
#[async_trait]
pub trait SupplierPlugin: Send + Sync {
    /// Stable plugin slug (e.g., "digikey").
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn capabilities(&self) -> SupplierResult<SupplierCapabilities>;

    fn routes(&self) -> Vec<Route>;

    async fn handle(&self, request: &RouteRequest) -> SupplierResult<RouteResponse>;

    async fn search(&self, term: &str) -> SupplierResult<serde_json::Value>;

    /// Fetches one supplier part and upserts it into the host catalog.
    async fn import(
        &self,
        term: &str,
        category: Option<CategoryId>,
        user: &UserId,
    ) -> SupplierResult<Part>;
}
