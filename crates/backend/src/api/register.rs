use crate::{
    api::user::{add_auth_cookies, generate_token_pair},
    validate::{validate_email, validate_full_name, validate_new_password},
};
use axum::{Form, Json, extract::State};
use axum_extra::extract::CookieJar;
use axum_macros::debug_handler;
use log::debug;
use quill_database::{
    common::{
        SuccessResponse,
        user::{
            AuthenticateWithOauthParams,
            LoginResponse,
            RegisterUserParams,
            RegistrationResponse,
            RequestPasswordResetParams,
            ResendVerificationParams,
            ResetPasswordParams,
            User,
            VerifyEmailParams,
        },
    },
    config::OAuthProvider,
    email::{
        reset_password::PasswordResetRequest,
        verification::{send_verification_email, verify_email_code},
    },
    error::{BackendError, BackendResult},
    impls::{
        QuillContext,
        user::{OAuthAccount, OAuthAccountInsertForm},
    },
};
use serde::{Deserialize, Serialize};

#[debug_handler]
pub(crate) async fn register_user(
    State(context): State<QuillContext>,
    Form(params): Form<RegisterUserParams>,
) -> BackendResult<Json<RegistrationResponse>> {
    validate_full_name(&params.full_name)?;
    validate_new_password(&params.password, &params.confirm_password)?;
    let email = params.email.trim().to_lowercase();
    validate_email(&email)?;
    User::check_email_taken(&email, &context)?;

    let user = User::create(
        params.full_name.trim().to_string(),
        email,
        Some(params.password),
        false,
        &context,
    )?;
    send_verification_email(&user, &context).await?;

    Ok(Json(RegistrationResponse {
        user,
        email_verification_required: true,
    }))
}

/// Confirms the emailed code and logs the fresh account in. The code is
/// consumed on first use, retrying with it returns NotFound.
#[debug_handler]
pub(crate) async fn verify_email(
    State(context): State<QuillContext>,
    jar: CookieJar,
    Form(params): Form<VerifyEmailParams>,
) -> BackendResult<(CookieJar, Json<LoginResponse>)> {
    let user = verify_email_code(&params.code, &context)?;
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
pub(crate) async fn resend_verification_code(
    State(context): State<QuillContext>,
    Form(params): Form<ResendVerificationParams>,
) -> BackendResult<Json<SuccessResponse>> {
    let email = params.email.trim().to_lowercase();
    let user =
        User::read_by_email(&email, &context)?.ok_or(BackendError::NotFound("user"))?;
    if user.email_verified {
        return Err(BackendError::Conflict(
            "Email is already verified".to_string(),
        ));
    }
    send_verification_email(&user, &context).await?;
    Ok(Json(SuccessResponse::default()))
}

#[debug_handler]
pub(crate) async fn request_password_reset(
    State(context): State<QuillContext>,
    Form(params): Form<RequestPasswordResetParams>,
) -> BackendResult<Json<SuccessResponse>> {
    let email = params.email.trim().to_lowercase();
    PasswordResetRequest::create(&email, &context).await?;
    Ok(Json(SuccessResponse::default()))
}

#[debug_handler]
pub(crate) async fn reset_password(
    State(context): State<QuillContext>,
    Form(params): Form<ResetPasswordParams>,
) -> BackendResult<Json<SuccessResponse>> {
    validate_new_password(&params.new_password, &params.confirm_new_password)?;
    let request = PasswordResetRequest::read_and_delete(&params.token, &context)?;
    User::update_password(request.user_id, params.new_password, &context)?;
    Ok(Json(SuccessResponse::default()))
}

#[debug_handler]
pub(crate) async fn authenticate_with_oauth(
    State(context): State<QuillContext>,
    jar: CookieJar,
    Form(params): Form<AuthenticateWithOauthParams>,
) -> BackendResult<(CookieJar, Json<LoginResponse>)> {
    let oauth_invalid = || BackendError::Unauthenticated("Oauth authorization is invalid");
    // validate inputs
    if params.code.is_empty() || params.code.len() > 300 {
        return Err(oauth_invalid());
    }

    // validate the redirect_uri
    let redirect_uri = &params.redirect_uri;
    if redirect_uri.host_str().unwrap_or("").is_empty()
        || redirect_uri.path() != "/account/oauth_callback"
        || !redirect_uri.query().unwrap_or("").is_empty()
    {
        return Err(oauth_invalid());
    }

    let oauth_provider = context
        .conf
        .oauth_providers
        .iter()
        .find(|provider| provider.issuer == params.oauth_issuer)
        .ok_or_else(oauth_invalid)?;

    let token_response = oauth_request_access_token(
        oauth_provider,
        &params.code,
        redirect_uri.as_str(),
        &context,
    )
    .await?;

    let user_info = oauth_get_user_info(
        oauth_provider,
        token_response.access_token.as_str(),
        &context,
    )
    .await?;
    let issuer = oauth_provider.issuer.to_string();
    let email = user_info.email.trim().to_lowercase();

    // Lookup user by oauth account, then by email for account linking, and
    // finally register a new account.
    let user = if let Some(user) = OAuthAccount::read_user(&issuer, &user_info.sub, &context)? {
        user
    } else if let Some(user) = User::read_by_email(&email, &context)? {
        let form = OAuthAccountInsertForm {
            oauth_issuer_url: issuer,
            oauth_user_id: user_info.sub,
            user_id: user.id,
        };
        OAuthAccount::create(&form, &context)?;
        user
    } else {
        let full_name = user_info
            .name
            .clone()
            .or(params.full_name)
            .ok_or_else(|| BackendError::invalid("Name is required to register new account"))?;
        validate_email(&email)?;
        // the provider vouches for the address, no code verification needed
        let user = User::create(full_name, email, None, true, &context)?;
        let form = OAuthAccountInsertForm {
            oauth_issuer_url: issuer,
            oauth_user_id: user_info.sub,
            user_id: user.id,
        };
        OAuthAccount::create(&form, &context)?;
        user
    };

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

#[derive(Serialize, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
}

/// Request an Access Token from the OAUTH provider
async fn oauth_request_access_token(
    oauth_provider: &OAuthProvider,
    code: &str,
    redirect_uri: &str,
    context: &QuillContext,
) -> BackendResult<OAuthTokenResponse> {
    let form = [
        ("client_id", &*oauth_provider.client_id),
        ("client_secret", &*oauth_provider.client_secret),
        ("code", code),
        ("grant_type", "authorization_code"),
        ("redirect_uri", redirect_uri),
    ];

    let response = context
        .client
        .post(oauth_provider.token_endpoint.as_str())
        .header("Accept", "application/json")
        .form(&form[..])
        .send()
        .await?;
    let status = response.status();
    let text = response.text().await?;
    debug!("Oauth request access token response: status {status}, text {text}");

    serde_json::from_str(&text)
        .map_err(|_| BackendError::Unauthenticated("Oauth authorization is invalid"))
}

/// Request the user info from the OAUTH provider
async fn oauth_get_user_info(
    oauth_provider: &OAuthProvider,
    access_token: &str,
    context: &QuillContext,
) -> BackendResult<OauthUserInfo> {
    let response = context
        .client
        .get(oauth_provider.userinfo_endpoint.as_str())
        .header("Accept", "application/json")
        .bearer_auth(access_token)
        .send()
        .await?;
    let status = response.status();
    let text = response.text().await?;
    debug!("Oauth get user info response: status {status}, text {text}");

    serde_json::from_str(&text)
        .map_err(|_| BackendError::Unauthenticated("Oauth authorization is invalid"))
}

#[derive(Serialize, Deserialize)]
struct OauthUserInfo {
    sub: String,
    email: String,
    name: Option<String>,
}
