use crate::api::{
    category::{
        create_category,
        delete_category,
        list_categories,
        update_category,
        user_categories,
    },
    comment::{create_comment, edit_comment, reply_comment},
    post::{
        create_post,
        get_post,
        list_posts,
        search_posts,
        soft_delete_post,
        toggle_dislike,
        toggle_like,
        toggle_visibility,
        update_post,
        user_posts,
    },
    register::{
        authenticate_with_oauth,
        register_user,
        request_password_reset,
        resend_verification_code,
        reset_password,
        verify_email,
    },
    user::{login_user, logout_user, refresh_token},
};
use axum::{
    Extension,
    Router,
    extract::rejection::ExtensionRejection,
    response::IntoResponse,
    routing::{get, post},
};
use axum_macros::FromRequestParts;
use http::StatusCode;
use quill_database::{common::user::User, impls::QuillContext};
use std::ops::Deref;

mod category;
mod comment;
mod post;
mod register;
pub(super) mod user;

pub fn api_routes() -> Router<QuillContext> {
    Router::new()
        .route("/account/register", post(register_user))
        .route("/account/verify_email", post(verify_email))
        .route("/account/resend_verification", post(resend_verification_code))
        .route("/account/login", post(login_user))
        .route("/account/logout", post(logout_user))
        .route("/account/refresh", post(refresh_token))
        .route("/account/request_password_reset", post(request_password_reset))
        .route("/account/reset_password", post(reset_password))
        .route("/account/oauth", post(authenticate_with_oauth))
        .route(
            "/post",
            get(get_post)
                .post(create_post)
                .patch(update_post)
                .delete(soft_delete_post),
        )
        .route("/post/list", get(list_posts))
        .route("/post/mine", get(user_posts))
        .route("/post/search", get(search_posts))
        .route("/post/like", post(toggle_like))
        .route("/post/dislike", post(toggle_dislike))
        .route("/post/visibility", post(toggle_visibility))
        .route("/comment", post(create_comment).patch(edit_comment))
        .route("/comment/reply", post(reply_comment))
        .route(
            "/category",
            post(create_category)
                .patch(update_category)
                .delete(delete_category),
        )
        .route("/category/list", get(list_categories))
        .route("/category/mine", get(user_categories))
}

#[derive(FromRequestParts)]
#[from_request(rejection(NotLoggedInError))]
pub struct UserExt {
    #[from_request(via(Extension))]
    user: User,
}

impl axum::extract::OptionalFromRequestParts<QuillContext> for UserExt {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _state: &QuillContext,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<User>().cloned().map(|user| UserExt { user }))
    }
}

impl UserExt {
    pub fn inner(self) -> User {
        self.user
    }
}
impl Deref for UserExt {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}
impl From<ExtensionRejection> for NotLoggedInError {
    fn from(_: ExtensionRejection) -> Self {
        NotLoggedInError
    }
}
pub struct NotLoggedInError;

impl IntoResponse for NotLoggedInError {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::UNAUTHORIZED, "Login required").into_response()
    }
}
