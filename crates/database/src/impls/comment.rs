use crate::{
    common::{
        comment::{Comment, CommentView},
        newtypes::{CommentId, PostId, UserId},
        user::User,
    },
    error::{BackendError, BackendResult},
    impls::QuillContext,
    schema::{comment, local_user},
};
use chrono::{DateTime, Utc};
use diesel::{
    AsChangeset,
    ExpressionMethods,
    Insertable,
    OptionalExtension,
    QueryDsl,
    RunQueryDsl,
    insert_into,
    update,
};
use std::ops::DerefMut;

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = comment, check_for_backend(diesel::pg::Pg))]
pub struct DbCommentInsertForm {
    pub creator_id: UserId,
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub depth: i32,
    pub deleted: bool,
    pub published: DateTime<Utc>,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = comment, check_for_backend(diesel::pg::Pg))]
pub struct DbCommentUpdateForm {
    pub content: Option<String>,
    pub deleted: Option<bool>,
    pub updated: Option<DateTime<Utc>>,
}

impl Comment {
    /// A reply is a single row insert. The parent's reply list is derived
    /// from the `parent_id` back-pointers at read time, so there is no
    /// second write that could race or leave an orphaned reference.
    pub fn create(form: DbCommentInsertForm, context: &QuillContext) -> BackendResult<Self> {
        let mut conn = context.db_pool.get()?;
        Ok(insert_into(comment::table)
            .values(form)
            .get_result(conn.deref_mut())?)
    }

    pub fn update(
        form: DbCommentUpdateForm,
        id: CommentId,
        context: &QuillContext,
    ) -> BackendResult<CommentView> {
        let mut conn = context.db_pool.get()?;
        let comment: Comment = update(comment::table.find(id))
            .set(form)
            .get_result(conn.deref_mut())?;
        let creator = User::read(comment.creator_id, context)?;
        Ok(CommentView { comment, creator })
    }

    pub fn read(id: CommentId, context: &QuillContext) -> BackendResult<Self> {
        let mut conn = context.db_pool.get()?;
        comment::table
            .find(id)
            .get_result::<Self>(conn.deref_mut())
            .optional()?
            .ok_or(BackendError::NotFound("comment"))
    }

    pub fn read_view(id: CommentId, context: &QuillContext) -> BackendResult<CommentView> {
        let comment = Comment::read(id, context)?;
        let creator = User::read(comment.creator_id, context)?;
        Ok(CommentView { comment, creator })
    }

    pub fn read_for_post(
        post_id: PostId,
        context: &QuillContext,
    ) -> BackendResult<Vec<CommentView>> {
        let mut conn = context.db_pool.get()?;
        let comments = comment::table
            .inner_join(local_user::table)
            .filter(comment::post_id.eq(post_id))
            .order_by(comment::published.desc())
            .get_results::<(Comment, User)>(conn.deref_mut())?;

        // Clear content of deleted comments. comments themselves are returned
        // so that the tree can be rendered.
        Ok(comments
            .into_iter()
            .map(|(mut comment, creator)| {
                if comment.deleted {
                    comment.content = String::new()
                };
                CommentView { comment, creator }
            })
            .collect())
    }
}
