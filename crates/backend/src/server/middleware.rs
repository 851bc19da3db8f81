use crate::api::user::validate;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_macros::debug_middleware;
use http::header::{AUTHORIZATION, COOKIE};
use quill_database::{common::AUTH_COOKIE, impls::QuillContext};

/// Checks the Authorization header and the auth cookie for a valid access
/// token. If the user is authenticated, sets a `User` request extension
/// which the `UserExt` extractor picks up.
#[debug_middleware]
pub(super) async fn auth_middleware(
    State(context): State<QuillContext>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let headers = request.headers();
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);
    let cookie = headers
        .get(COOKIE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .split(';')
        .filter_map(|s| s.split_once('='))
        .find(|(name, _)| name.trim() == AUTH_COOKIE)
        .map(|(_, value)| value.trim().to_string());

    for token in [bearer, cookie].into_iter().flatten() {
        if let Ok(user) = validate(&token, &context) {
            request.extensions_mut().insert(user);
            break;
        }
    }
    next.run(request).await
}
