//! Users API: login, registration, logout.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smartsales_core::{Credential, UserRole};
use tracing::instrument;

use super::{ApiError, HttpClient};
use crate::session::SessionUser;

/// A successful login or registration: the user record and their credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    pub user: SessionUser,
    pub credential: Credential,
}

/// Wire shape of an auth response.
///
/// The user is either nested under `user` or the body is itself the user
/// record with an extra `token` field.
#[derive(Debug, Deserialize)]
struct RawAuthResponse {
    #[serde(default)]
    user: Option<SessionUser>,
    #[serde(default)]
    token: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl TryFrom<RawAuthResponse> for AuthResponse {
    type Error = ApiError;

    fn try_from(raw: RawAuthResponse) -> Result<Self, Self::Error> {
        let unexpected = || ApiError::Parse("unexpected login response".to_string());

        let user = match raw.user {
            Some(user) => user,
            None => serde_json::from_value(Value::Object(raw.rest)).map_err(|_| unexpected())?,
        };
        let credential = raw
            .token
            .as_deref()
            .map(Credential::parse)
            .and_then(Result::ok)
            .ok_or_else(unexpected)?;

        Ok(Self { user, credential })
    }
}

/// New-account form, as filled in on the registration screen.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub password_confirm: SecretString,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub city: String,
    pub role: UserRole,
}

impl RegistrationForm {
    /// Check the form before sending it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if a required field is blank or the
    /// passwords do not match.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() {
            return Err(ApiError::InvalidInput("Username is required".to_string()));
        }
        if self.email.trim().is_empty() {
            return Err(ApiError::InvalidInput("Email is required".to_string()));
        }
        if self.password.expose_secret().is_empty() {
            return Err(ApiError::InvalidInput("Password is required".to_string()));
        }
        if self.password.expose_secret() != self.password_confirm.expose_secret() {
            return Err(ApiError::InvalidInput("Passwords do not match".to_string()));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct RegistrationBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    password_confirm: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    phone: &'a str,
    ciudad: &'a str,
    role: &'a str,
}

impl<'a> From<&'a RegistrationForm> for RegistrationBody<'a> {
    fn from(form: &'a RegistrationForm) -> Self {
        Self {
            username: form.username.trim(),
            email: form.email.trim(),
            password: form.password.expose_secret(),
            password_confirm: form.password_confirm.expose_secret(),
            first_name: form.first_name.trim(),
            last_name: form.last_name.trim(),
            phone: form.phone.trim(),
            ciudad: form.city.trim(),
            role: form.role.as_str(),
        }
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

// =============================================================================
// UsersClient
// =============================================================================

/// Client for the Users API.
#[derive(Debug, Clone)]
pub struct UsersClient {
    http: HttpClient,
}

impl UsersClient {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Exchange a username and password for a user record and credential.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for bad credentials, or another error
    /// if the request fails or the response is missing the user or token.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<AuthResponse, ApiError> {
        let body = LoginBody {
            username: username.trim(),
            password: password.expose_secret(),
        };
        let raw: RawAuthResponse = self.http.post("users/users/login/", &body, None).await?;
        AuthResponse::try_from(raw)
    }

    /// Create an account and receive a credential for it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` without sending anything if the form
    /// fails [`RegistrationForm::validate`]; otherwise as for [`login`](Self::login).
    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn register(&self, form: &RegistrationForm) -> Result<AuthResponse, ApiError> {
        form.validate()?;
        let body = RegistrationBody::from(form);
        let raw: RawAuthResponse = self.http.post("users/users/", &body, None).await?;
        AuthResponse::try_from(raw)
    }

    /// The user the credential belongs to.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the credential is no longer valid.
    #[instrument(skip_all)]
    pub async fn current_user(&self, credential: &Credential) -> Result<SessionUser, ApiError> {
        self.http
            .get("users/users/current_user/", Some(credential))
            .await
    }

    /// Tell the backend the session is over.
    ///
    /// Best effort: callers clear the local session whether or not this
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn remote_logout(&self, credential: &Credential) -> Result<(), ApiError> {
        let _: Value = self
            .http
            .post("users/users/logout/", &Value::Object(Map::new()), Some(credential))
            .await?;
        Ok(())
    }
}
