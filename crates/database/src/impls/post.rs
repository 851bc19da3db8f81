use crate::{
    common::{
        category::Category,
        comment::{Comment, build_comment_tree},
        newtypes::{CategoryId, PostId, UserId},
        post::{Post, PostView},
        user::User,
    },
    error::{BackendError, BackendResult},
    impls::QuillContext,
    schema::{post, post_like},
};
use chrono::{DateTime, Utc};
use diesel::{
    AsChangeset,
    BoolExpressionMethods,
    ExpressionMethods,
    Insertable,
    OptionalExtension,
    PgTextExpressionMethods,
    QueryDsl,
    RunQueryDsl,
    delete,
    insert_into,
};
use std::ops::DerefMut;

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = post, check_for_backend(diesel::pg::Pg))]
pub struct DbPostForm {
    pub title: String,
    pub content: String,
    pub slug: String,
    pub creator_id: UserId,
    pub category_id: CategoryId,
    pub thumbnail: Option<String>,
    pub public: bool,
    pub deleted: bool,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = post, check_for_backend(diesel::pg::Pg))]
pub struct PostUpdateForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub slug: Option<String>,
    pub thumbnail: Option<String>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub enum PostViewQuery<'a> {
    Id(PostId),
    Slug(&'a str),
}

impl From<PostId> for PostViewQuery<'_> {
    fn from(val: PostId) -> Self {
        PostViewQuery::Id(val)
    }
}
impl<'a> From<&'a str> for PostViewQuery<'a> {
    fn from(val: &'a str) -> Self {
        PostViewQuery::Slug(val)
    }
}

impl Post {
    pub fn create(form: DbPostForm, context: &QuillContext) -> BackendResult<Self> {
        let mut conn = context.db_pool.get()?;
        Ok(insert_into(post::table)
            .values(form)
            .get_result(conn.deref_mut())?)
    }

    pub fn update(form: PostUpdateForm, id: PostId, context: &QuillContext) -> BackendResult<Self> {
        let mut conn = context.db_pool.get()?;
        Ok(diesel::update(post::table.find(id))
            .set(form)
            .get_result(conn.deref_mut())?)
    }

    pub fn read(id: PostId, context: &QuillContext) -> BackendResult<Self> {
        let mut conn = context.db_pool.get()?;
        post::table
            .find(id)
            .get_result::<Self>(conn.deref_mut())
            .optional()?
            .ok_or(BackendError::NotFound("post"))
    }

    pub fn read_view<'a>(
        params: impl Into<PostViewQuery<'a>>,
        context: &QuillContext,
    ) -> BackendResult<PostView> {
        let mut conn = context.db_pool.get()?;
        let mut query = post::table.into_boxed();
        query = match params.into() {
            PostViewQuery::Id(id) => query.filter(post::id.eq(id)),
            PostViewQuery::Slug(slug) => query.filter(post::slug.eq(slug)),
        };
        let post: Post = query
            .get_result(conn.deref_mut())
            .optional()?
            .ok_or(BackendError::NotFound("post"))?;
        drop(conn);

        let creator = User::read(post.creator_id, context)?;
        let category = Category::read(post.category_id, context)?;
        let comments = build_comment_tree(Comment::read_for_post(post.id, context)?);
        let (like_count, dislike_count) = Post::reaction_counts(post.id, context)?;
        Ok(PostView {
            post,
            creator,
            category,
            like_count,
            dislike_count,
            comments,
        })
    }

    /// Public, non-deleted posts, newest first.
    pub fn list(
        page: i64,
        page_size: i64,
        context: &QuillContext,
    ) -> BackendResult<(Vec<Self>, i64)> {
        let mut conn = context.db_pool.get()?;
        let total = post::table
            .filter(post::public.eq(true))
            .filter(post::deleted.eq(false))
            .count()
            .get_result(conn.deref_mut())?;
        let posts = post::table
            .filter(post::public.eq(true))
            .filter(post::deleted.eq(false))
            .order_by(post::published.desc())
            .limit(page_size)
            .offset((page - 1) * page_size)
            .get_results(conn.deref_mut())?;
        Ok((posts, total))
    }

    /// All of a user's own posts regardless of visibility, excluding
    /// soft-deleted ones.
    pub fn read_for_creator(creator_id: UserId, context: &QuillContext) -> BackendResult<Vec<Self>> {
        let mut conn = context.db_pool.get()?;
        Ok(post::table
            .filter(post::creator_id.eq(creator_id))
            .filter(post::deleted.eq(false))
            .order_by(post::published.desc())
            .get_results(conn.deref_mut())?)
    }

    pub fn search(query: &str, context: &QuillContext) -> BackendResult<Vec<Self>> {
        let mut conn = context.db_pool.get()?;
        let replaced = query
            .replace('%', "\\%")
            .replace('_', "\\_")
            .replace(' ', "%");
        let replaced = format!("%{replaced}%");
        Ok(post::table
            .filter(
                post::title
                    .ilike(&replaced)
                    .or(post::content.ilike(&replaced))
                    .or(post::slug.ilike(&replaced)),
            )
            .filter(post::public.eq(true))
            .filter(post::deleted.eq(false))
            .order_by(post::published.desc())
            .get_results(conn.deref_mut())?)
    }

    pub fn set_deleted(id: PostId, deleted: bool, context: &QuillContext) -> BackendResult<Self> {
        let mut conn = context.db_pool.get()?;
        Ok(diesel::update(post::table.find(id))
            .set(post::deleted.eq(deleted))
            .get_result(conn.deref_mut())?)
    }

    pub fn set_public(id: PostId, public: bool, context: &QuillContext) -> BackendResult<Self> {
        let mut conn = context.db_pool.get()?;
        Ok(diesel::update(post::table.find(id))
            .set(post::public.eq(public))
            .get_result(conn.deref_mut())?)
    }

    /// Toggles the user's reaction. A row per (post, user) holds either a
    /// like or a dislike, so the two are mutually exclusive by construction
    /// and toggles by different users never contend on the same row.
    pub fn toggle_reaction(
        post_id_: PostId,
        creator_id_: UserId,
        liked_: bool,
        context: &QuillContext,
    ) -> BackendResult<()> {
        use post_like::dsl::{creator_id, liked, post_id};
        let mut conn = context.db_pool.get()?;
        let existing: Option<bool> = post_like::table
            .find((post_id_, creator_id_))
            .select(liked)
            .get_result(conn.deref_mut())
            .optional()?;
        match reaction_action(existing, liked_) {
            ReactionAction::Clear => {
                delete(post_like::table.find((post_id_, creator_id_)))
                    .execute(conn.deref_mut())?;
            }
            ReactionAction::Set => {
                insert_into(post_like::table)
                    .values((
                        post_id.eq(post_id_),
                        creator_id.eq(creator_id_),
                        liked.eq(liked_),
                    ))
                    .on_conflict((post_id, creator_id))
                    .do_update()
                    .set(liked.eq(liked_))
                    .execute(conn.deref_mut())?;
            }
        }
        Ok(())
    }

    pub fn reaction_counts(id: PostId, context: &QuillContext) -> BackendResult<(i64, i64)> {
        let mut conn = context.db_pool.get()?;
        let like_count = post_like::table
            .filter(post_like::post_id.eq(id))
            .filter(post_like::liked.eq(true))
            .count()
            .get_result(conn.deref_mut())?;
        let dislike_count = post_like::table
            .filter(post_like::post_id.eq(id))
            .filter(post_like::liked.eq(false))
            .count()
            .get_result(conn.deref_mut())?;
        Ok((like_count, dislike_count))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ReactionAction {
    Set,
    Clear,
}

/// Repeating the same reaction removes it, anything else (no reaction yet,
/// or the opposite one) overwrites.
fn reaction_action(existing: Option<bool>, liked: bool) -> ReactionAction {
    match existing {
        Some(current) if current == liked => ReactionAction::Clear,
        _ => ReactionAction::Set,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_double_toggle_restores_original_state() {
        // no reaction -> like -> no reaction
        assert_eq!(ReactionAction::Set, reaction_action(None, true));
        assert_eq!(ReactionAction::Clear, reaction_action(Some(true), true));
    }

    #[test]
    fn test_opposite_reaction_replaces() {
        assert_eq!(ReactionAction::Set, reaction_action(Some(false), true));
        assert_eq!(ReactionAction::Set, reaction_action(Some(true), false));
    }
}
