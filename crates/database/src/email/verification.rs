use super::send_email;
use crate::{
    common::{newtypes::UserId, user::User},
    error::{BackendError, BackendResult},
    impls::QuillContext,
    schema::email_verification,
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
use rand::Rng;
use std::ops::DerefMut;

#[derive(Clone, Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = email_verification)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EmailVerification {
    pub id: i32,
    pub user_id: UserId,
    pub code: String,
    pub published: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = email_verification)]
struct EmailVerificationForm {
    user_id: UserId,
    code: String,
}

fn generate_verification_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

fn code_expired(published: DateTime<Utc>, now: DateTime<Utc>, max_minutes: i64) -> bool {
    now - published > Duration::minutes(max_minutes)
}

/// Stores a fresh six-digit code for the user (replacing any pending one)
/// and mails it. Send failures are logged and swallowed so a flaky SMTP
/// server cannot fail the registration itself.
pub async fn send_verification_email(user: &User, context: &QuillContext) -> BackendResult<()> {
    let mut conn = context.db_pool.get()?;
    let form = EmailVerificationForm {
        user_id: user.id,
        code: generate_verification_code(),
    };
    delete(email_verification::table.filter(email_verification::user_id.eq(user.id)))
        .execute(conn.deref_mut())?;
    let code = form.code.clone();
    insert_into(email_verification::table)
        .values(form)
        .execute(conn.deref_mut())?;
    drop(conn);

    let body = format!(
        r#"Hello {}, your verification code for {} is:<br><br><b>{code}</b><br><br>It is valid for {} minutes. Ignore this email if the account isn't yours."#,
        user.full_name, context.conf.server.domain, context.conf.auth.verification_code_minutes,
    );

    if let Err(err) = send_email("Verify your email", &user.email, body, context).await {
        warn!("failed to send verification code to {}: {err}", user.email);
    }
    Ok(())
}

/// Consumes a verification code and marks the account verified. The code row
/// is deleted up front, so a second attempt with the same code is NotFound
/// and the account can never be re-verified through a stale code.
pub fn verify_email_code(code: &str, context: &QuillContext) -> BackendResult<User> {
    let mut conn = context.db_pool.get()?;
    let verification: EmailVerification = email_verification::table
        .filter(email_verification::code.eq(code))
        .get_result(conn.deref_mut())
        .optional()?
        .ok_or(BackendError::NotFound("verification code"))?;
    delete(email_verification::table.find(verification.id)).execute(conn.deref_mut())?;
    drop(conn);

    if code_expired(
        verification.published,
        Utc::now(),
        context.conf.auth.verification_code_minutes,
    ) {
        return Err(BackendError::Expired("verification code"));
    }

    let user = User::read(verification.user_id, context)?;
    if user.email_verified {
        return Err(BackendError::Conflict(
            "Email is already verified".to_string(),
        ));
    }
    User::set_verified(user.id, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_generate_verification_code() {
        for _ in 0..100 {
            let code = generate_verification_code();
            assert_eq!(6, code.len());
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_code_expiry() {
        let now = Utc::now();
        assert!(!code_expired(now - Duration::minutes(14), now, 15));
        assert!(code_expired(now - Duration::minutes(16), now, 15));
    }
}
