use crate::{
    common::{newtypes::UserId, user::User},
    error::{BackendError, BackendResult},
    impls::QuillContext,
    schema::{local_user, oauth_account},
};
use bcrypt::{DEFAULT_COST, hash};
use chrono::{DateTime, Utc};
use diesel::{
    AsChangeset,
    ExpressionMethods,
    Identifiable,
    Insertable,
    OptionalExtension,
    QueryDsl,
    Queryable,
    RunQueryDsl,
    Selectable,
    dsl::{exists, select},
    insert_into,
};
use std::ops::DerefMut;

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = local_user, check_for_backend(diesel::pg::Pg))]
pub struct UserInsertForm {
    pub full_name: String,
    pub email: String,
    pub password_encrypted: Option<String>,
    pub email_verified: bool,
}

impl User {
    pub fn create(
        full_name: String,
        email: String,
        password: Option<String>,
        email_verified: bool,
        context: &QuillContext,
    ) -> BackendResult<Self> {
        let mut conn = context.db_pool.get()?;
        let form = UserInsertForm {
            full_name,
            email,
            password_encrypted: password.map(|p| hash(p, DEFAULT_COST)).transpose()?,
            email_verified,
        };
        Ok(insert_into(local_user::table)
            .values(form)
            .get_result(conn.deref_mut())?)
    }

    pub fn read(id: UserId, context: &QuillContext) -> BackendResult<Self> {
        let mut conn = context.db_pool.get()?;
        local_user::table
            .find(id)
            .get_result(conn.deref_mut())
            .optional()?
            .ok_or(BackendError::NotFound("user"))
    }

    /// Lookup by the normalized (lowercased) address.
    pub fn read_by_email(email: &str, context: &QuillContext) -> BackendResult<Option<Self>> {
        let mut conn = context.db_pool.get()?;
        Ok(local_user::table
            .filter(local_user::email.eq(email))
            .get_result(conn.deref_mut())
            .optional()?)
    }

    pub fn check_email_taken(email: &str, context: &QuillContext) -> BackendResult<()> {
        let mut conn = context.db_pool.get()?;
        let taken: bool = select(exists(
            local_user::table.filter(local_user::email.eq(email)),
        ))
        .get_result(conn.deref_mut())?;
        if taken {
            return Err(BackendError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
        Ok(())
    }

    pub fn set_verified(id: UserId, context: &QuillContext) -> BackendResult<Self> {
        let mut conn = context.db_pool.get()?;
        Ok(diesel::update(local_user::table.find(id))
            .set((
                local_user::email_verified.eq(true),
                local_user::updated.eq(Some(Utc::now())),
            ))
            .get_result(conn.deref_mut())?)
    }

    /// Overwrites the stored refresh token, which implicitly invalidates the
    /// previous one. `None` logs the user out of all sessions.
    pub fn update_refresh_token(
        id: UserId,
        token: Option<String>,
        context: &QuillContext,
    ) -> BackendResult<()> {
        let mut conn = context.db_pool.get()?;
        diesel::update(local_user::table.find(id))
            .set(local_user::refresh_token.eq(token))
            .execute(conn.deref_mut())?;
        Ok(())
    }

    pub fn update_password(
        id: UserId,
        new_password: String,
        context: &QuillContext,
    ) -> BackendResult<()> {
        let mut conn = context.db_pool.get()?;
        diesel::update(local_user::table.find(id))
            .set((
                local_user::password_encrypted.eq(Some(hash(new_password, DEFAULT_COST)?)),
                local_user::refresh_token.eq(None::<String>),
                local_user::updated.eq(Some(Utc::now())),
            ))
            .execute(conn.deref_mut())?;
        Ok(())
    }
}

#[derive(Clone, Debug, Queryable, Selectable, Identifiable)]
#[diesel(table_name = oauth_account, primary_key(oauth_issuer_url, oauth_user_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OAuthAccount {
    pub oauth_issuer_url: String,
    pub oauth_user_id: String,
    pub user_id: UserId,
    pub published: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = oauth_account)]
pub struct OAuthAccountInsertForm {
    pub oauth_issuer_url: String,
    pub oauth_user_id: String,
    pub user_id: UserId,
}

impl OAuthAccount {
    pub fn create(form: &OAuthAccountInsertForm, context: &QuillContext) -> BackendResult<Self> {
        let mut conn = context.db_pool.get()?;
        Ok(insert_into(oauth_account::table)
            .values(form)
            .get_result(conn.deref_mut())?)
    }

    pub fn read_user(
        issuer: &str,
        oauth_user_id: &str,
        context: &QuillContext,
    ) -> BackendResult<Option<User>> {
        let mut conn = context.db_pool.get()?;
        Ok(oauth_account::table
            .inner_join(local_user::table)
            .filter(oauth_account::oauth_issuer_url.eq(issuer))
            .filter(oauth_account::oauth_user_id.eq(oauth_user_id))
            .select(local_user::all_columns)
            .get_result(conn.deref_mut())
            .optional()?)
    }
}
