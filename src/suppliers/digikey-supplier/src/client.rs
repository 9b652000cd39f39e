use crate::connection;
use crate::models::{KeywordSearchRequest, VendorError};
use crate::DigikeyPlugin;
use partlink_core::redact::redact_secrets;
use partlink_core::{SupplierError, SupplierResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;

/// The API's wording for an expired bearer token, double space included.
pub const TOKEN_EXPIRED_MESSAGE: &str = "Bearer token  expired";

/// True when a 401 body is the API's expired-token error.
pub fn is_token_expired(body: &str) -> bool {
    serde_json::from_str::<VendorError>(body)
        .ok()
        .and_then(|err| err.error_message)
        .is_some_and(|message| message == TOKEN_EXPIRED_MESSAGE)
}

/// Maps an API response onto success, expired authentication, or a remote error.
pub fn classify_response(status: u16, body: &str) -> SupplierResult<Value> {
    match status {
        200 => serde_json::from_str(body).map_err(|e| SupplierError::Parse {
            message: format!("response body is not JSON: {e}"),
        }),
        401 if is_token_expired(body) => Err(SupplierError::AuthenticationExpired),
        _ => Err(SupplierError::RemoteService {
            status,
            body: body.to_string(),
        }),
    }
}

fn header_value(name: &str, value: &str) -> SupplierResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| SupplierError::Validation {
        message: format!("{name} contains characters not allowed in a header"),
    })
}

/// Rejects terms that a URL path segment would drop or collapse.
fn validate_part_number(term: &str) -> SupplierResult<()> {
    let trimmed = term.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        return Err(SupplierError::Validation {
            message: format!("{term:?} is not a part number"),
        });
    }
    Ok(())
}

impl DigikeyPlugin {
    pub fn build_headers(&self) -> SupplierResult<HeaderMap> {
        let settings = self.settings();
        let token = self.current_access_token()?;
        let locale = connection::locale(settings)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value("access token", &format!("Bearer {token}"))?,
        );
        let vendor_headers = [
            ("x-digikey-client-id", connection::client_id(settings)?),
            ("x-digikey-locale-site", locale.site.as_str().to_string()),
            ("x-digikey-locale-language", locale.language.as_str().to_string()),
            ("x-digikey-locale-currency", locale.currency.as_str().to_string()),
            ("x-digikey-customer-id", connection::customer_id(settings)?),
        ];
        for (name, value) in vendor_headers {
            headers.insert(HeaderName::from_static(name), header_value(name, &value)?);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Keyword search; the API's JSON is returned unchanged.
    pub async fn search_by_keyword(&self, term: &str) -> SupplierResult<Value> {
        self.ensure_authenticated()?;
        if !connection::search_enabled(self.settings())? {
            return Err(SupplierError::Disabled {
                feature: "search".into(),
            });
        }
        let mut url = Self::endpoint(&self.api_base, "Search/v3/Products/Keyword")?;
        url.query_pairs_mut().append_pair("includes", term);
        tracing::debug!(term, "digikey keyword search");

        let resp = self
            .client
            .post(url)
            .headers(self.build_headers()?)
            .json(&KeywordSearchRequest::new(term))
            .send()
            .await
            .map_err(|e| SupplierError::Network {
                message: e.to_string(),
            })?;
        Self::read_classified(resp).await
    }

    pub async fn fetch_part_detail(&self, term: &str) -> SupplierResult<Value> {
        self.ensure_authenticated()?;
        validate_part_number(term)?;
        let mut url = Self::endpoint(&self.api_base, "Search/v3/Products/")?;
        url.path_segments_mut()
            .map_err(|_| SupplierError::Validation {
                message: "api base url cannot carry a path".into(),
            })?
            .pop_if_empty()
            .push(term);
        tracing::debug!(term, "digikey part detail");

        let resp = self
            .client
            .get(url)
            .headers(self.build_headers()?)
            .send()
            .await
            .map_err(|e| SupplierError::Network {
                message: e.to_string(),
            })?;
        Self::read_classified(resp).await
    }

    async fn read_classified(resp: reqwest::Response) -> SupplierResult<Value> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| SupplierError::Network {
            message: e.to_string(),
        })?;
        if status != StatusCode::OK {
            tracing::debug!(
                status = status.as_u16(),
                body = %redact_secrets(&body),
                "digikey request failed"
            );
        }
        classify_response(status.as_u16(), &body)
    }
}
