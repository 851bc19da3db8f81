use super::newtypes::UserId;
use crate::schema::local_user;
use chrono::{DateTime, Utc};
use diesel::{Identifiable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use url::Url;

/// A registered account. The refresh token is single-valued, issuing a new
/// one invalidates the previous one by overwrite.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = local_user, check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    #[serde(skip)]
    pub password_encrypted: Option<String>,
    pub email_verified: bool,
    #[serde(skip)]
    pub refresh_token: Option<String>,
    pub published: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct RegisterUserParams {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RegistrationResponse {
    pub user: User,
    pub email_verification_required: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct VerifyEmailParams {
    pub code: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ResendVerificationParams {
    pub email: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct LoginUserParams {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct LoginResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RefreshTokenParams {
    /// Falls back to the refresh cookie when unset
    pub refresh_token: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RequestPasswordResetParams {
    pub email: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ResetPasswordParams {
    pub token: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct AuthenticateWithOauthParams {
    pub code: String,
    pub oauth_issuer: Url,
    pub redirect_uri: Url,
    /// Only used when the provider does not report a display name
    pub full_name: Option<String>,
}
