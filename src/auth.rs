use actix_web::{web, HttpRequest, HttpResponse};
use bcrypt::{hash, verify};
use log::{debug, info};
use reqwest::Url;

use crate::app_state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::payload::{AvatarUpdate, AvatarUpdated, LoginInfo, MessageResponse, SignupInfo};
use crate::models::{filled, PublicUser, User, UserRole};
use crate::oauth::{bypass_profile, OAuthProfile};
use crate::session::{expired_session_cookie, session_user};
use crate::store::Store;

const DUPLICATE_EMAIL: &str = "User with this email already exists";
const AVATAR_SERVICE: &str = "https://api.dicebear.com/7.x/avataaars/svg";

/// Deterministic generated avatar seeded by the email address.
pub fn placeholder_avatar(email: &str) -> String {
    Url::parse_with_params(AVATAR_SERVICE, &[("seed", email)])
        .map(String::from)
        .unwrap_or_else(|_| AVATAR_SERVICE.to_string())
}

/// Creates a credential account. The password is hashed off the async runtime.
pub async fn register(store: &dyn Store, bcrypt_cost: u32, info: SignupInfo) -> ApiResult<User> {
    let (name, email, password) = match (filled(info.name), filled(info.email), filled(info.password)) {
        (Some(name), Some(email), Some(password)) => (name, email, password),
        _ => return Err(ApiError::validation("All fields are required")),
    };

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict(DUPLICATE_EMAIL.to_string()));
    }

    let password_hash = web::block(move || hash(password, bcrypt_cost)).await??;
    let avatar_url = placeholder_avatar(&email);
    let user = User::with_password(name, email, password_hash, avatar_url);
    // The unique index still catches a concurrent signup with the same email.
    store.insert_user(&user).await?;
    info!("Registered user {}", user.id);
    Ok(user)
}

/// Checks credentials. Unknown email, OAuth-only account and wrong password
/// all produce the same error.
pub async fn authenticate(store: &dyn Store, email: &str, password: String) -> ApiResult<User> {
    let user = store.find_user_by_email(email).await?.ok_or(ApiError::Auth)?;
    let Some(password_hash) = user.password.clone() else {
        debug!("Password login attempted for OAuth-only user {}", user.id);
        return Err(ApiError::Auth);
    };

    let matches = web::block(move || verify(password, &password_hash).unwrap_or(false)).await?;
    if !matches {
        return Err(ApiError::Auth);
    }
    Ok(user)
}

/// Finds the local account for a provider identity, creating it on first
/// sight. An existing credential account with the same email gets linked.
pub async fn oauth_login(store: &dyn Store, profile: &OAuthProfile) -> ApiResult<User> {
    if let Some(user) = store.find_user_by_google_id(&profile.id).await? {
        return Ok(user);
    }

    if let Some(mut user) = store.find_user_by_email(&profile.email).await? {
        store.link_google_account(&user.id, &profile.id).await?;
        info!("Linked Google account to existing user {}", user.id);
        user.google_id = Some(profile.id.clone());
        return Ok(user);
    }

    let user = User::from_google(
        profile.id.clone(),
        profile.display_name.clone(),
        profile.email.clone(),
        profile.photo.clone(),
    );
    store.insert_user(&user).await?;
    info!("Created user {} from Google profile", user.id);
    Ok(user)
}

pub async fn signup(data: web::Data<AppState>, info: web::Json<SignupInfo>) -> ApiResult<HttpResponse> {
    let user = register(data.store.as_ref(), data.config.bcrypt_cost, info.into_inner()).await?;
    Ok(HttpResponse::Created().json(PublicUser::from(&user)))
}

pub async fn login(data: web::Data<AppState>, info: web::Json<LoginInfo>) -> ApiResult<HttpResponse> {
    let info = info.into_inner();
    let (email, password) = match (filled(info.email), filled(info.password)) {
        (Some(email), Some(password)) => (email, password),
        _ => return Err(ApiError::validation("Email and password are required")),
    };

    let user = authenticate(data.store.as_ref(), &email, password).await?;
    debug!("User {} logged in", user.id);
    Ok(HttpResponse::Ok().json(PublicUser::from(&user)))
}

pub async fn update_avatar(data: web::Data<AppState>, body: web::Json<AvatarUpdate>) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let (user_id, avatar_url) = match (filled(body.user_id), filled(body.avatar_url)) {
        (Some(user_id), Some(avatar_url)) => (user_id, avatar_url),
        _ => return Err(ApiError::validation("userId and avatarUrl are required")),
    };

    if !data.store.set_user_avatar(&user_id, &avatar_url).await? {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(HttpResponse::Ok().json(AvatarUpdated {
        message: "Avatar updated".to_string(),
        avatar_url,
    }))
}

fn bypass_user() -> PublicUser {
    let profile = bypass_profile();
    PublicUser {
        id: profile.id,
        name: profile.display_name,
        email: profile.email,
        avatar_url: profile.photo,
        role: UserRole::User,
    }
}

pub async fn current_user(data: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    let user = match session_user(&req) {
        Some(id) => data.store.find_user(&id).await?.map(|u| PublicUser::from(&u)),
        None => None,
    };
    let user = match user {
        None if data.config.bypass_auth => Some(bypass_user()),
        other => other,
    };
    Ok(HttpResponse::Ok().json(user))
}

pub async fn logout() -> HttpResponse {
    HttpResponse::Ok()
        .cookie(expired_session_cookie())
        .json(MessageResponse::new("Logged out"))
}
