//! Google sign-in: consent redirect, code exchange and the callback that
//! turns a Google profile into a local session.

use actix_web::{
    cookie::{time::Duration, Cookie, SameSite},
    http::header,
    web, HttpRequest, HttpResponse,
};
use log::{debug, info, warn};
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::oauth_login;
use crate::config::GoogleCredentials;
use crate::error::{ApiError, ApiResult};
use crate::session::{create_session_token, session_cookie};

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const STATE_COOKIE: &str = "projexia_oauth_state";
const BYPASS_CALLBACK: &str = "/api/auth/google/callback?bypass=true";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("request to Google failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Google rejected the authorization code: {0}")]
    Rejected(String),
    #[error("Google profile has no email address")]
    MissingEmail,
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        ApiError::server(err)
    }
}

/// The identity fields a provider hands back after consent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub photo: Option<String>,
}

/// Fixed identity used when `BYPASS_AUTH` is on.
pub fn bypass_profile() -> OAuthProfile {
    OAuthProfile {
        id: "1234567890".to_string(),
        display_name: "Test User".to_string(),
        email: "test@example.com".to_string(),
        photo: None,
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

#[derive(Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    creds: GoogleCredentials,
}

impl GoogleClient {
    pub fn new(creds: GoogleCredentials) -> Self {
        GoogleClient {
            http: reqwest::Client::new(),
            creds,
        }
    }

    pub fn authorize_url(&self, state: &str) -> String {
        let params = [
            ("client_id", self.creds.client_id.as_str()),
            ("redirect_uri", self.creds.callback_url.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("state", state),
        ];
        Url::parse_with_params(AUTHORIZE_URL, &params)
            .map(String::from)
            .unwrap_or_else(|_| AUTHORIZE_URL.to_string())
    }

    /// Trades an authorization code for the signed-in user's profile.
    pub async fn exchange(&self, code: &str) -> Result<OAuthProfile, OAuthError> {
        let resp = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.creds.client_id.as_str()),
                ("client_secret", self.creds.client_secret.as_str()),
                ("redirect_uri", self.creds.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(OAuthError::Rejected(format!("{}: {}", status, body)));
        }
        let token: TokenResponse = resp.json().await?;

        let info: UserInfo = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let email = info.email.ok_or(OAuthError::MissingEmail)?;
        Ok(OAuthProfile {
            id: info.sub,
            display_name: info.name.unwrap_or_else(|| email.clone()),
            email,
            photo: info.picture,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub bypass: Option<bool>,
}

fn redirect(location: &str) -> actix_web::HttpResponseBuilder {
    let mut builder = HttpResponse::Found();
    builder.insert_header((header::LOCATION, location.to_string()));
    builder
}

fn not_configured() -> ApiError {
    ApiError::not_found("Google login is not configured")
}

pub async fn google_start(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    if data.config.bypass_auth {
        debug!("Auth bypass on, skipping Google consent");
        return Ok(redirect(BYPASS_CALLBACK).finish());
    }
    let google = data.google.as_ref().ok_or_else(not_configured)?;

    let state = Uuid::new_v4().simple().to_string();
    let state_cookie = Cookie::build(STATE_COOKIE, state.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::minutes(10))
        .finish();

    Ok(redirect(&google.authorize_url(&state))
        .cookie(state_cookie)
        .finish())
}

pub async fn google_callback(
    data: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<CallbackQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();

    let profile = if data.config.bypass_auth && query.bypass.unwrap_or(false) {
        bypass_profile()
    } else {
        let google = data.google.as_ref().ok_or_else(not_configured)?;
        let expected = req.cookie(STATE_COOKIE).map(|c| c.value().to_string());
        if expected.is_none() || expected != query.state {
            warn!("OAuth callback with mismatched state");
            return Err(ApiError::validation("Invalid OAuth state"));
        }
        let code = query
            .code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ApiError::validation("Authorization code is required"))?;
        google.exchange(&code).await?
    };

    let user = oauth_login(data.store.as_ref(), &profile).await?;
    let token = create_session_token(&user.id, &data.config.session_secret, data.config.session_ttl_hours)?;
    info!("User {} signed in with Google", user.id);

    let mut cleared_state = Cookie::build(STATE_COOKIE, "").path("/").finish();
    cleared_state.make_removal();

    Ok(redirect(&data.config.frontend_url)
        .cookie(session_cookie(token, data.config.session_ttl_hours))
        .cookie(cleared_state)
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoogleClient {
        GoogleClient::new(GoogleCredentials {
            client_id: "client-123".into(),
            client_secret: "shh".into(),
            callback_url: "http://localhost:5000/api/auth/google/callback".into(),
        })
    }

    #[test]
    fn authorize_url_carries_state_and_redirect() {
        let url = Url::parse(&client().authorize_url("nonce-1")).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".into(), "client-123".into())));
        assert!(pairs.contains(&("state".into(), "nonce-1".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://localhost:5000/api/auth/google/callback".into()
        )));
        assert!(!pairs.iter().any(|(k, _)| k == "client_secret"));
    }

    #[test]
    fn bypass_profile_is_the_fixed_test_user() {
        let profile = bypass_profile();
        assert_eq!(profile.id, "1234567890");
        assert_eq!(profile.display_name, "Test User");
        assert_eq!(profile.email, "test@example.com");
    }
}
