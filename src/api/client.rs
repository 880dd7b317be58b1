//! ShopClient - catalog, wishlist and account endpoints of the storefront API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::validation::{validate_registration, RegistrationForm};

/// Default timeout for HTTP requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A catalog garment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClothingItem {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Account details returned on login.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// A logged-in session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginSession {
    #[serde(default)]
    pub message: Option<String>,
    pub user: UserProfile,
    pub token: String,
}

/// `{success, data, error}` wrapper used by the catalog and wishlist endpoints.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    user_id: u64,
}

#[derive(Debug, Serialize)]
struct WishlistRequest {
    clothing_item_id: u64,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    remember_me: bool,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    first_name: &'a str,
    last_name: &'a str,
}

/// Client for the storefront request/response endpoints.
pub struct ShopClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ShopClient {
    /// Create a client for the API at `base_url` with the default timeout.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one catalog item.
    ///
    /// # Errors
    ///
    /// `ApiError::Server` with the server's message (e.g. "Clothing item not
    /// found") on a non-success status or an unsuccessful envelope.
    pub async fn fetch_item(&self, item_id: u64) -> Result<ClothingItem, ApiError> {
        let url = format!("{}/api/clothing/{}", self.base_url, item_id);
        let response = self.http_client.get(&url).send().await?;
        let envelope: Envelope<ClothingItem> = read_json(response).await?;
        unwrap_envelope(envelope)
    }

    /// Fetch the featured catalog items.
    pub async fn fetch_featured(&self) -> Result<Vec<ClothingItem>, ApiError> {
        let url = format!("{}/api/clothing/featured", self.base_url);
        let response = self.http_client.get(&url).send().await?;
        let envelope: Envelope<Vec<ClothingItem>> = read_json(response).await?;
        unwrap_envelope(envelope)
    }

    /// Add a catalog item to the signed-in user's wishlist.
    pub async fn add_to_wishlist(&self, item_id: u64) -> Result<(), ApiError> {
        let url = format!("{}/api/wishlist", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&WishlistRequest {
                clothing_item_id: item_id,
            })
            .send()
            .await?;
        let envelope: Envelope<serde_json::Value> = read_json(response).await?;
        if !envelope.success {
            return Err(envelope_error(envelope.error));
        }
        log::info!("Added item {} to wishlist", item_id);
        Ok(())
    }

    /// Sign in with email and password.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<LoginSession, ApiError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let url = format!("{}/api/auth/login", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&LoginRequest {
                email,
                password,
                remember_me,
            })
            .send()
            .await?;
        read_json(response).await
    }

    /// Create an account. The form is validated before anything is sent.
    ///
    /// Returns the new user's id.
    pub async fn register(&self, form: &RegistrationForm) -> Result<u64, ApiError> {
        validate_registration(form)?;

        let url = format!("{}/api/auth/register", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .json(&RegisterRequest {
                email: form.email.trim(),
                password: &form.password,
                first_name: form.first_name.trim(),
                last_name: form.last_name.trim(),
            })
            .send()
            .await?;
        let registered: RegisterResponse = read_json(response).await?;
        Ok(registered.user_id)
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        log::warn!("API returned {}: {}", status, body.trim());
        return Err(ApiError::Server {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    Ok(response.json::<T>().await?)
}

/// The `error` field of a JSON error body, else the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "Unknown error".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T, ApiError> {
    match envelope {
        Envelope {
            success: true,
            data: Some(data),
            ..
        } => Ok(data),
        Envelope { success: true, .. } => Err(ApiError::EmptyResponse),
        Envelope { error, .. } => Err(envelope_error(error)),
    }
}

fn envelope_error(error: Option<String>) -> ApiError {
    ApiError::Server {
        status: 200,
        message: error.unwrap_or_else(|| "Request was not successful".to_string()),
    }
}

/// Errors from the storefront API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("API response carried no data")]
    EmptyResponse,
}

impl ApiError {
    /// Human-readable message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server { message, .. } => message.clone(),
            ApiError::Validation(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ShopClient::with_base_url("http://shop.local/").unwrap();
        assert_eq!(client.base_url(), "http://shop.local");
    }

    #[test]
    fn test_error_message_prefers_json_error_field() {
        assert_eq!(
            error_message(r#"{"error": "Invalid email or password"}"#),
            "Invalid email or password"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(""), "Unknown error");
    }

    #[test]
    fn test_unsuccessful_envelope_carries_error() {
        let envelope: Envelope<ClothingItem> =
            serde_json::from_str(r#"{"success": false, "error": "Clothing item not found"}"#)
                .unwrap();
        let err = unwrap_envelope(envelope).unwrap_err();
        assert_eq!(err.user_message(), "Clothing item not found");
    }

    #[test]
    fn test_successful_envelope_without_data() {
        let envelope: Envelope<ClothingItem> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(
            unwrap_envelope(envelope),
            Err(ApiError::EmptyResponse)
        ));
    }

    #[test]
    fn test_clothing_item_minimal_fields() {
        let item: ClothingItem =
            serde_json::from_str(r#"{"id": 4, "name": "Leather Jacket"}"#).unwrap();
        assert_eq!(item.id, 4);
        assert!(item.sizes.is_empty());
        assert!(item.description.is_none());
    }
}
