use super::send_email;
use crate::{
    common::{newtypes::UserId, user::User},
    error::{BackendError, BackendResult},
    impls::QuillContext,
    schema::password_reset_request,
    utils::http_protocol_str,
};
use chrono::{DateTime, Duration, Utc};
use diesel::{
    ExpressionMethods,
    Identifiable,
    Insertable,
    OptionalExtension,
    QueryDsl,
    Queryable,
    RunQueryDsl,
    Selectable,
    delete,
    insert_into,
};
use log::warn;
use std::ops::DerefMut;
use uuid::Uuid;

#[derive(PartialEq, Eq, Debug, Queryable, Selectable, Identifiable)]
#[diesel(table_name = password_reset_request)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PasswordResetRequest {
    id: i32,
    pub user_id: UserId,
    token: String,
    published: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = password_reset_request)]
struct PasswordResetRequestForm {
    user_id: UserId,
    token: String,
}

impl PasswordResetRequest {
    pub async fn create(email: &str, context: &QuillContext) -> BackendResult<()> {
        let user =
            User::read_by_email(email, context)?.ok_or(BackendError::NotFound("user"))?;

        let mut conn = context.db_pool.get()?;
        let form = PasswordResetRequestForm {
            user_id: user.id,
            token: Uuid::new_v4().to_string(),
        };
        let request = insert_into(password_reset_request::table)
            .values(form)
            .get_result::<PasswordResetRequest>(conn.deref_mut())?;
        drop(conn);

        let domain = &context.conf.server.domain;
        let reset_link = format!(
            "{}://{}/account/reset_password?token={}",
            http_protocol_str(),
            domain,
            &request.token
        );
        let body = format!(
            r#"<h1>Password Reset Request</h1><br><a href="{reset_link}">Click here to reset your password</a>"#,
        );
        if let Err(err) = send_email("Password reset", &user.email, body, context).await {
            warn!("failed to send password reset mail to {}: {err}", user.email);
        }

        Ok(())
    }

    /// Single use, the row is deleted even when the token turns out to be
    /// expired.
    pub fn read_and_delete(token: &str, context: &QuillContext) -> BackendResult<Self> {
        let mut conn = context.db_pool.get()?;
        let request: PasswordResetRequest = password_reset_request::table
            .filter(password_reset_request::token.eq(token))
            .get_result(conn.deref_mut())
            .optional()?
            .ok_or(BackendError::NotFound("reset token"))?;
        delete(password_reset_request::table.find(request.id)).execute(conn.deref_mut())?;

        if Utc::now() - request.published > Duration::days(1) {
            return Err(BackendError::Expired("reset token"));
        }
        Ok(request)
    }
}
