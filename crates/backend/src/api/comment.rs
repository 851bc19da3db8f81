use super::UserExt;
use crate::validate::{validate_comment_max_depth, validate_not_empty};
use axum::{Form, Json, extract::State};
use axum_macros::debug_handler;
use chrono::Utc;
use quill_database::{
    common::comment::{
        Comment,
        CommentView,
        CreateCommentParams,
        EditCommentParams,
        ReplyCommentParams,
    },
    common::post::Post,
    error::{BackendError, BackendResult},
    impls::{
        QuillContext,
        comment::{DbCommentInsertForm, DbCommentUpdateForm},
    },
};

/// Creates a top-level comment on a post.
#[debug_handler]
pub(crate) async fn create_comment(
    user: UserExt,
    State(context): State<QuillContext>,
    Form(params): Form<CreateCommentParams>,
) -> BackendResult<Json<CommentView>> {
    validate_not_empty(&params.content)?;
    let post = Post::read(params.post_id, &context)?;
    if post.deleted {
        return Err(BackendError::NotFound("post"));
    }
    let form = DbCommentInsertForm {
        creator_id: user.id,
        post_id: post.id,
        parent_id: None,
        content: params.content,
        depth: 0,
        deleted: false,
        published: Utc::now(),
    };
    let comment = Comment::create(form, &context)?;
    Ok(Json(Comment::read_view(comment.id, &context)?))
}

/// Replies to an existing comment at any depth. The post id is inherited
/// from the parent, so a reply can never land on a different post than the
/// comment it answers.
#[debug_handler]
pub(crate) async fn reply_comment(
    user: UserExt,
    State(context): State<QuillContext>,
    Form(params): Form<ReplyCommentParams>,
) -> BackendResult<Json<CommentView>> {
    validate_not_empty(&params.content)?;
    let parent = Comment::read(params.parent_id, &context)?;
    if parent.deleted {
        return Err(BackendError::invalid("Cant reply to deleted comment"));
    }
    let depth = parent.depth + 1;
    validate_comment_max_depth(depth)?;
    let form = DbCommentInsertForm {
        creator_id: user.id,
        post_id: parent.post_id,
        parent_id: Some(parent.id),
        content: params.content,
        depth,
        deleted: false,
        published: Utc::now(),
    };
    let comment = Comment::create(form, &context)?;
    Ok(Json(Comment::read_view(comment.id, &context)?))
}

#[debug_handler]
pub(crate) async fn edit_comment(
    user: UserExt,
    State(context): State<QuillContext>,
    Form(params): Form<EditCommentParams>,
) -> BackendResult<Json<CommentView>> {
    if let Some(content) = &params.content {
        validate_not_empty(content)?;
    }
    if params.content.is_none() && params.deleted.is_none() {
        return Err(BackendError::invalid("Edit has no parameters"));
    }
    let orig_comment = Comment::read(params.id, &context)?;
    if orig_comment.creator_id != user.id {
        return Err(BackendError::PermissionDenied(
            "Cannot edit comment created by another user",
        ));
    }
    let form = DbCommentUpdateForm {
        content: params.content,
        deleted: params.deleted,
        updated: Some(Utc::now()),
    };
    Ok(Json(Comment::update(form, params.id, &context)?))
}
