//! OAuth2 authorization-code flow and token bookkeeping.

use crate::connection::{self, AUTHENTICATED, RESPONSE};
use crate::models::TokenResponse;
use crate::{DigikeyPlugin, CALLBACK_PATH};
use partlink_core::redact::redact_secrets;
use partlink_core::routes::{RouteRequest, RouteResponse};
use partlink_core::{SupplierError, SupplierResult};
use serde::Serialize;
use url::Url;

/// Result of one token exchange. Failures are reported here, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenExchange {
    Authenticated,
    /// The token endpoint answered without an `access_token`.
    Rejected { status: u16, body: String },
    /// The exchange could not be completed (transport or settings failure).
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub authenticated: bool,
    pub client_configured: bool,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
}

impl DigikeyPlugin {
    /// `{site_domain}/{plugin_base_path}/digikey_callback/`
    pub fn redirect_uri(&self) -> String {
        self.host.plugin_url(CALLBACK_PATH)
    }

    pub fn authorization_url(&self) -> SupplierResult<Url> {
        let client_id = connection::client_id(self.settings())?;
        let mut url = Self::endpoint(&self.auth_base, "v1/oauth2/authorize")?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &client_id)
            .append_pair("redirect_uri", &self.redirect_uri());
        Ok(url)
    }

    /// OAuth redirect target. Hands the exchange to the task offloader and
    /// sends the user back to the settings page without waiting for it.
    pub async fn handle_callback(&self, request: &RouteRequest) -> SupplierResult<RouteResponse> {
        let code = request
            .query_param("code")
            .filter(|code| !code.is_empty())
            .ok_or_else(|| SupplierError::NotFound {
                entity: "no code found".into(),
            })?
            .to_string();

        let plugin = self.clone();
        self.tasks
            .submit(
                "digikey.exchange_code",
                Box::pin(async move {
                    plugin.exchange_code_for_token(&code).await;
                }),
            )
            .await;

        Ok(RouteResponse::Redirect {
            location: self.host.settings_url(),
        })
    }

    pub async fn exchange_code_for_token(&self, code: &str) -> TokenExchange {
        match self.try_exchange(code).await {
            Ok(TokenExchange::Authenticated) => {
                tracing::info!("digikey connection authenticated");
                TokenExchange::Authenticated
            }
            Ok(rejected) => {
                if let TokenExchange::Rejected { status, body } = &rejected {
                    tracing::warn!(status, body = %redact_secrets(body), "token exchange rejected");
                }
                rejected
            }
            Err(e) => {
                tracing::warn!(error = %e, "token exchange failed");
                TokenExchange::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_exchange(&self, code: &str) -> SupplierResult<TokenExchange> {
        let settings = self.settings();
        let client_id = connection::client_id(settings)?;
        let client_secret = connection::client_secret(settings)?;
        let redirect_uri = self.redirect_uri();
        let url = Self::endpoint(&self.auth_base, "v1/oauth2/token")?;

        let resp = self
            .client
            .post(url)
            .form(&[
                ("code", code),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| SupplierError::Network {
                message: e.to_string(),
            })?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| SupplierError::Network {
            message: e.to_string(),
        })?;

        let parsed: Option<serde_json::Value> = serde_json::from_str(&body).ok();
        let has_token = parsed
            .clone()
            .and_then(|value| serde_json::from_value::<TokenResponse>(value).ok())
            .is_some_and(|token| !token.access_token.trim().is_empty());
        match parsed {
            Some(value) if has_token => {
                settings.set(RESPONSE, &value.to_string())?;
                settings.set_bool(AUTHENTICATED, true)?;
                Ok(TokenExchange::Authenticated)
            }
            _ => Ok(TokenExchange::Rejected { status, body }),
        }
    }

    pub fn ensure_authenticated(&self) -> SupplierResult<()> {
        match self.settings().get_bool(AUTHENTICATED)? {
            Some(true) => Ok(()),
            _ => Err(SupplierError::AuthenticationError {
                message: "Connection not authenticated".into(),
            }),
        }
    }

    pub fn current_access_token(&self) -> SupplierResult<String> {
        Ok(self.stored_token()?.access_token)
    }

    fn stored_token(&self) -> SupplierResult<TokenResponse> {
        let raw = self
            .settings()
            .get(RESPONSE)?
            .ok_or_else(|| SupplierError::Parse {
                message: "no stored token response".into(),
            })?;
        serde_json::from_str(&raw).map_err(|e| SupplierError::Parse {
            message: format!("stored token response is malformed: {e}"),
        })
    }

    pub fn connection_status(&self) -> SupplierResult<ConnectionStatus> {
        let settings = self.settings();
        let token = match self.stored_token() {
            Ok(token) => Some(token),
            Err(SupplierError::Parse { .. }) => None,
            Err(e) => return Err(e),
        };
        Ok(ConnectionStatus {
            authenticated: settings.get_bool(AUTHENTICATED)?.unwrap_or(false),
            client_configured: !connection::client_id(settings)?.is_empty()
                && !connection::client_secret(settings)?.is_empty(),
            token_type: token.as_ref().and_then(|t| t.token_type.clone()),
            expires_in: token.and_then(|t| t.expires_in),
        })
    }

    /// Forgets the stored token; the next call needs a fresh authorization.
    pub fn disconnect(&self) -> SupplierResult<()> {
        let settings = self.settings();
        settings.set_bool(AUTHENTICATED, false)?;
        settings.remove(RESPONSE)?;
        tracing::info!("digikey connection cleared");
        Ok(())
    }
}
