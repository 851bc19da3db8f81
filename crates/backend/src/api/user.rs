use super::UserExt;
use axum::{Form, Json, extract::State};
use axum_extra::extract::cookie::{Cookie, CookieJar, Expiration, SameSite};
use axum_macros::debug_handler;
use bcrypt::verify;
use chrono::Utc;
use jsonwebtoken::{
    DecodingKey,
    EncodingKey,
    Header,
    Validation,
    decode,
    encode,
    get_current_timestamp,
};
use quill_database::{
    common::{
        AUTH_COOKIE,
        REFRESH_COOKIE,
        SuccessResponse,
        newtypes::UserId,
        user::{LoginResponse, LoginUserParams, RefreshTokenParams, User},
    },
    error::{BackendError, BackendResult},
    impls::QuillContext,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// user id
    pub sub: String,
    /// hostname
    pub iss: String,
    /// Creation time as unix timestamp
    pub iat: i64,
    /// Expiration time
    pub exp: u64,
}

fn generate_token(
    user_id: UserId,
    domain: &str,
    secret: &str,
    ttl_seconds: u64,
) -> BackendResult<String> {
    let claims = Claims {
        sub: user_id.0.to_string(),
        iss: domain.to_string(),
        iat: Utc::now().timestamp(),
        exp: get_current_timestamp() + ttl_seconds,
    };
    let key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&Header::default(), &claims, &key)?)
}

fn decode_token(jwt: &str, secret: &str) -> BackendResult<Claims> {
    let validation = Validation::default();
    let key = DecodingKey::from_secret(secret.as_bytes());
    let claims = decode::<Claims>(jwt, &key, &validation)?;
    Ok(claims.claims)
}

fn claims_user_id(claims: &Claims) -> BackendResult<UserId> {
    let id = claims
        .sub
        .parse::<i32>()
        .map_err(|_| BackendError::Unauthenticated("invalid token"))?;
    Ok(UserId(id))
}

/// Issues a fresh access/refresh pair and stores the refresh token on the
/// user, which invalidates any previously issued one by overwrite.
pub(crate) fn generate_token_pair(
    user: &User,
    context: &QuillContext,
) -> BackendResult<(String, String)> {
    let auth = &context.conf.auth;
    let domain = &context.conf.server.domain;
    let access = generate_token(
        user.id,
        domain,
        &auth.access_token_secret,
        auth.access_token_minutes * 60,
    )?;
    let refresh = generate_token(
        user.id,
        domain,
        &auth.refresh_token_secret,
        auth.refresh_token_hours * 3600,
    )?;
    User::update_refresh_token(user.id, Some(refresh.clone()), context)?;
    Ok((access, refresh))
}

pub fn validate(jwt: &str, context: &QuillContext) -> BackendResult<User> {
    let claims = decode_token(jwt, &context.conf.auth.access_token_secret)?;
    User::read(claims_user_id(&claims)?, context)
}

fn validate_password(user: &User, password: &str) -> BackendResult<()> {
    let valid = user
        .password_encrypted
        .as_ref()
        .and_then(|pw| verify(password, pw).ok())
        .unwrap_or(false);
    if !valid {
        return Err(BackendError::Unauthenticated("Invalid login"));
    }
    Ok(())
}

pub(crate) fn create_cookie(
    name: &'static str,
    value: String,
    max_age: Duration,
    context: &QuillContext,
) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, value));

    // Must not set cookie domain on localhost
    // https://stackoverflow.com/a/1188145
    let domain = context.conf.server.domain.clone();
    if !domain.starts_with("localhost") && !domain.starts_with("127.0.0.1") {
        cookie = cookie.domain(domain);
    }
    cookie
        .same_site(SameSite::Strict)
        .path("/")
        .http_only(true)
        .secure(!cfg!(debug_assertions))
        .expires(Expiration::DateTime(OffsetDateTime::now_utc() + max_age))
        .build()
}

pub(crate) fn add_auth_cookies(
    jar: CookieJar,
    access: &str,
    refresh: &str,
    context: &QuillContext,
) -> CookieJar {
    let auth = &context.conf.auth;
    jar.add(create_cookie(
        AUTH_COOKIE,
        access.to_string(),
        Duration::minutes(auth.access_token_minutes as i64),
        context,
    ))
    .add(create_cookie(
        REFRESH_COOKIE,
        refresh.to_string(),
        Duration::hours(auth.refresh_token_hours as i64),
        context,
    ))
}

#[debug_handler]
pub(crate) async fn login_user(
    State(context): State<QuillContext>,
    jar: CookieJar,
    Form(params): Form<LoginUserParams>,
) -> BackendResult<(CookieJar, Json<LoginResponse>)> {
    let email = params.email.trim().to_lowercase();
    // unknown email and wrong password are indistinguishable on purpose
    let user = User::read_by_email(&email, &context)?
        .ok_or(BackendError::Unauthenticated("Invalid login"))?;
    validate_password(&user, &params.password)?;
    if !user.email_verified {
        return Err(BackendError::Unauthenticated("Email is not verified"));
    }
    let (access, refresh) = generate_token_pair(&user, &context)?;
    let jar = add_auth_cookies(jar, &access, &refresh, &context);
    Ok((
        jar,
        Json(LoginResponse {
            user,
            access_token: access,
            refresh_token: refresh,
        }),
    ))
}

/// Rotates the token pair. The presented refresh token must match the stored
/// one, so handing out a new pair implicitly revokes the old refresh token.
#[debug_handler]
pub(crate) async fn refresh_token(
    State(context): State<QuillContext>,
    jar: CookieJar,
    Form(params): Form<RefreshTokenParams>,
) -> BackendResult<(CookieJar, Json<LoginResponse>)> {
    let presented = params
        .refresh_token
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
        .ok_or(BackendError::Unauthenticated("Missing refresh token"))?;
    let claims = decode_token(&presented, &context.conf.auth.refresh_token_secret)?;
    let user = User::read(claims_user_id(&claims)?, &context)
        .map_err(|_| BackendError::Unauthenticated("Invalid login"))?;
    if user.refresh_token.as_deref() != Some(presented.as_str()) {
        return Err(BackendError::Unauthenticated("Refresh token mismatch"));
    }
    let (access, refresh) = generate_token_pair(&user, &context)?;
    let jar = add_auth_cookies(jar, &access, &refresh, &context);
    Ok((
        jar,
        Json(LoginResponse {
            user,
            access_token: access,
            refresh_token: refresh,
        }),
    ))
}

#[debug_handler]
pub(crate) async fn logout_user(
    user: UserExt,
    State(context): State<QuillContext>,
    jar: CookieJar,
) -> BackendResult<(CookieJar, Json<SuccessResponse>)> {
    User::update_refresh_token(user.id, None, &context)?;
    let jar = jar
        .remove(create_cookie(AUTH_COOKIE, String::new(), Duration::ZERO, &context))
        .remove(create_cookie(
            REFRESH_COOKIE,
            String::new(),
            Duration::ZERO,
            &context,
        ));
    Ok((jar, Json(SuccessResponse::default())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_token_round_trip() {
        let token = generate_token(UserId(42), "localhost", "secret", 600).unwrap();
        let claims = decode_token(&token, "secret").unwrap();
        assert_eq!("42", claims.sub);
        assert_eq!("localhost", claims.iss);
        assert_eq!(UserId(42), claims_user_id(&claims).unwrap());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = generate_token(UserId(1), "localhost", "secret", 600).unwrap();
        let err = decode_token(&token, "other-secret").unwrap_err();
        assert!(matches!(err, BackendError::Unauthenticated(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        // well past the default decoding leeway
        let claims = Claims {
            sub: "1".to_string(),
            iss: "localhost".to_string(),
            iat: 0,
            exp: get_current_timestamp() - 3600,
        };
        let key = EncodingKey::from_secret(b"secret");
        let token = encode(&Header::default(), &claims, &key).unwrap();
        let err = decode_token(&token, "secret").unwrap_err();
        assert!(matches!(err, BackendError::Expired(_)));
    }

    #[test]
    fn test_garbage_token_is_not_an_id() {
        let claims = Claims {
            sub: "not-a-number".to_string(),
            iss: "localhost".to_string(),
            iat: 0,
            exp: get_current_timestamp() + 600,
        };
        assert!(claims_user_id(&claims).is_err());
    }
}
