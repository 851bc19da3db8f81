use crate::{
    common::{
        category::Category,
        newtypes::{CategoryId, UserId},
    },
    error::{BackendError, BackendResult},
    impls::QuillContext,
    schema::category,
};
use diesel::{
    AsChangeset,
    ExpressionMethods,
    Insertable,
    OptionalExtension,
    QueryDsl,
    RunQueryDsl,
    delete,
    insert_into,
};
use std::ops::DerefMut;

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = category, check_for_backend(diesel::pg::Pg))]
pub struct CategoryInsertForm {
    pub name: String,
    pub slug: String,
    pub creator_id: UserId,
}

impl Category {
    pub fn create(form: CategoryInsertForm, context: &QuillContext) -> BackendResult<Self> {
        let mut conn = context.db_pool.get()?;
        Ok(insert_into(category::table)
            .values(form)
            .get_result(conn.deref_mut())?)
    }

    pub fn read(id: CategoryId, context: &QuillContext) -> BackendResult<Self> {
        let mut conn = context.db_pool.get()?;
        category::table
            .find(id)
            .get_result(conn.deref_mut())
            .optional()?
            .ok_or(BackendError::NotFound("category"))
    }

    /// The slug unique key is scoped per creator, two users may both have a
    /// "rust" category.
    pub fn check_slug_taken(
        creator_id: UserId,
        slug: &str,
        context: &QuillContext,
    ) -> BackendResult<()> {
        let mut conn = context.db_pool.get()?;
        let existing: Option<Category> = category::table
            .filter(category::creator_id.eq(creator_id))
            .filter(category::slug.eq(slug))
            .get_result(conn.deref_mut())
            .optional()?;
        if existing.is_some() {
            return Err(BackendError::Conflict(
                "Category with same name already exists".to_string(),
            ));
        }
        Ok(())
    }

    pub fn list_all(context: &QuillContext) -> BackendResult<Vec<Self>> {
        let mut conn = context.db_pool.get()?;
        Ok(category::table
            .order_by(category::name.asc())
            .get_results(conn.deref_mut())?)
    }

    pub fn list_for_creator(
        creator_id: UserId,
        context: &QuillContext,
    ) -> BackendResult<Vec<Self>> {
        let mut conn = context.db_pool.get()?;
        Ok(category::table
            .filter(category::creator_id.eq(creator_id))
            .order_by(category::name.asc())
            .get_results(conn.deref_mut())?)
    }

    pub fn update_name(
        id: CategoryId,
        name: String,
        slug: String,
        context: &QuillContext,
    ) -> BackendResult<Self> {
        let mut conn = context.db_pool.get()?;
        Ok(diesel::update(category::table.find(id))
            .set((category::name.eq(name), category::slug.eq(slug)))
            .get_result(conn.deref_mut())?)
    }

    pub fn delete(id: CategoryId, context: &QuillContext) -> BackendResult<()> {
        let mut conn = context.db_pool.get()?;
        let deleted = delete(category::table.find(id)).execute(conn.deref_mut())?;
        if deleted == 0 {
            return Err(BackendError::NotFound("category"));
        }
        Ok(())
    }
}
