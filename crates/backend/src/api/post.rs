use super::UserExt;
use crate::{assets::upload_thumbnail, validate::validate_not_empty};
use axum::{
    Form,
    Json,
    extract::{Multipart, Query, State},
};
use axum_macros::debug_handler;
use chrono::Utc;
use quill_database::{
    common::{
        SuccessResponse,
        category::Category,
        newtypes::{CategoryId, PostId},
        post::{
            GetPostParams,
            ListPostsParams,
            ListPostsResponse,
            Pagination,
            Post,
            PostIdParams,
            PostView,
            SearchPostsParams,
        },
        user::User,
    },
    error::{BackendError, BackendResult},
    impls::{
        QuillContext,
        post::{DbPostForm, PostUpdateForm},
    },
    utils::{generate_slug, sanitize_html},
};

/// Form fields of the multipart create/update requests. The thumbnail is
/// carried as raw bytes and only leaves the process towards the asset host.
#[derive(Default)]
struct PostUpload {
    post_id: Option<PostId>,
    title: Option<String>,
    content: Option<String>,
    category_id: Option<CategoryId>,
    thumbnail: Option<(String, Vec<u8>)>,
}

impl PostUpload {
    async fn read(mut multipart: Multipart) -> BackendResult<Self> {
        let invalid = |err: axum::extract::multipart::MultipartError| {
            BackendError::InvalidArgument(err.to_string())
        };
        let mut upload = PostUpload::default();
        while let Some(field) = multipart.next_field().await.map_err(invalid)? {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };
            match name.as_str() {
                "post_id" => {
                    let text = field.text().await.map_err(invalid)?;
                    let id = text
                        .parse()
                        .map_err(|_| BackendError::invalid("Invalid post_id"))?;
                    upload.post_id = Some(PostId(id));
                }
                "category_id" => {
                    let text = field.text().await.map_err(invalid)?;
                    let id = text
                        .parse()
                        .map_err(|_| BackendError::invalid("Invalid category_id"))?;
                    upload.category_id = Some(CategoryId(id));
                }
                "title" => upload.title = Some(field.text().await.map_err(invalid)?),
                "content" => upload.content = Some(field.text().await.map_err(invalid)?),
                "thumbnail" => {
                    let file_name = field.file_name().unwrap_or("thumbnail").to_string();
                    let data = field.bytes().await.map_err(invalid)?;
                    upload.thumbnail = Some((file_name, data.to_vec()));
                }
                _ => {}
            }
        }
        Ok(upload)
    }
}

#[debug_handler]
pub(crate) async fn create_post(
    user: UserExt,
    State(context): State<QuillContext>,
    multipart: Multipart,
) -> BackendResult<Json<Post>> {
    let upload = PostUpload::read(multipart).await?;
    let title = upload
        .title
        .ok_or_else(|| BackendError::invalid("Title is required"))?;
    let content = upload
        .content
        .ok_or_else(|| BackendError::invalid("Content is required"))?;
    let category_id = upload
        .category_id
        .ok_or_else(|| BackendError::invalid("CategoryId is required"))?;
    let (file_name, data) = upload
        .thumbnail
        .ok_or_else(|| BackendError::invalid("Thumbnail is required"))?;
    validate_not_empty(&title)?;
    validate_not_empty(&content)?;
    let category = Category::read(category_id, &context)?;

    // upload first, an asset host failure must not leave a post row behind
    let thumbnail = upload_thumbnail(&file_name, data, &context).await?;

    let form = DbPostForm {
        slug: generate_slug(&title),
        title,
        content: sanitize_html(&content),
        creator_id: user.id,
        category_id: category.id,
        thumbnail: Some(thumbnail),
        public: true,
        deleted: false,
    };
    Ok(Json(Post::create(form, &context)?))
}

#[debug_handler]
pub(crate) async fn update_post(
    user: UserExt,
    State(context): State<QuillContext>,
    multipart: Multipart,
) -> BackendResult<Json<Post>> {
    let upload = PostUpload::read(multipart).await?;
    let post_id = upload
        .post_id
        .ok_or_else(|| BackendError::invalid("PostId is required"))?;
    if upload.title.is_none() && upload.content.is_none() && upload.thumbnail.is_none() {
        return Err(BackendError::invalid(
            "At least one of Title, Content, or Thumbnail must be provided",
        ));
    }
    let post = Post::read(post_id, &context)?;
    if post.creator_id != user.id {
        return Err(BackendError::PermissionDenied(
            "You are not allowed to update this post",
        ));
    }

    let thumbnail = match upload.thumbnail {
        Some((file_name, data)) => Some(upload_thumbnail(&file_name, data, &context).await?),
        None => None,
    };
    if let Some(title) = &upload.title {
        validate_not_empty(title)?;
    }
    if let Some(content) = &upload.content {
        validate_not_empty(content)?;
    }
    let form = PostUpdateForm {
        slug: upload.title.as_deref().map(generate_slug),
        title: upload.title,
        content: upload.content.as_deref().map(sanitize_html),
        thumbnail,
        updated: Some(Utc::now()),
    };
    Ok(Json(Post::update(form, post.id, &context)?))
}

#[debug_handler]
pub(crate) async fn list_posts(
    Query(params): Query<ListPostsParams>,
    State(context): State<QuillContext>,
) -> BackendResult<Json<ListPostsResponse>> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(10).clamp(1, 100);
    let (posts, total) = Post::list(page, page_size, &context)?;
    Ok(Json(ListPostsResponse {
        posts,
        pagination: Pagination::new(total, page, page_size),
    }))
}

#[debug_handler]
pub(crate) async fn user_posts(
    user: UserExt,
    State(context): State<QuillContext>,
) -> BackendResult<Json<Vec<Post>>> {
    Ok(Json(Post::read_for_creator(user.id, &context)?))
}

/// Fetches the detail page of a post by slug. Private and soft-deleted
/// posts stay visible to their creator only.
#[debug_handler]
pub(crate) async fn get_post(
    user: Option<UserExt>,
    Query(params): Query<GetPostParams>,
    State(context): State<QuillContext>,
) -> BackendResult<Json<PostView>> {
    let view = Post::read_view(params.slug.as_str(), &context)?;
    let is_creator = user
        .map(|u| u.id == view.post.creator_id)
        .unwrap_or(false);
    if (view.post.deleted || !view.post.public) && !is_creator {
        return Err(BackendError::NotFound("post"));
    }
    Ok(Json(view))
}

#[debug_handler]
pub(crate) async fn search_posts(
    Query(params): Query<SearchPostsParams>,
    State(context): State<QuillContext>,
) -> BackendResult<Json<Vec<Post>>> {
    let keyword = params.keyword.trim();
    if keyword.is_empty() {
        return Err(BackendError::invalid("Keyword is required for search"));
    }
    Ok(Json(Post::search(keyword, &context)?))
}

#[debug_handler]
pub(crate) async fn toggle_like(
    user: UserExt,
    State(context): State<QuillContext>,
    Form(params): Form<PostIdParams>,
) -> BackendResult<Json<SuccessResponse>> {
    toggle_reaction(&user, params.post_id, true, &context)
}

#[debug_handler]
pub(crate) async fn toggle_dislike(
    user: UserExt,
    State(context): State<QuillContext>,
    Form(params): Form<PostIdParams>,
) -> BackendResult<Json<SuccessResponse>> {
    toggle_reaction(&user, params.post_id, false, &context)
}

fn toggle_reaction(
    user: &User,
    post_id: PostId,
    liked: bool,
    context: &QuillContext,
) -> BackendResult<Json<SuccessResponse>> {
    let post = Post::read(post_id, context)?;
    if post.deleted {
        return Err(BackendError::NotFound("post"));
    }
    Post::toggle_reaction(post.id, user.id, liked, context)?;
    Ok(Json(SuccessResponse::default()))
}

#[debug_handler]
pub(crate) async fn toggle_visibility(
    user: UserExt,
    State(context): State<QuillContext>,
    Form(params): Form<PostIdParams>,
) -> BackendResult<Json<Post>> {
    let post = Post::read(params.post_id, &context)?;
    if post.creator_id != user.id {
        return Err(BackendError::PermissionDenied(
            "You are not allowed to perform this action",
        ));
    }
    Ok(Json(Post::set_public(post.id, !post.public, &context)?))
}

#[debug_handler]
pub(crate) async fn soft_delete_post(
    user: UserExt,
    State(context): State<QuillContext>,
    Form(params): Form<PostIdParams>,
) -> BackendResult<Json<SuccessResponse>> {
    let post = Post::read(params.post_id, &context)?;
    if post.creator_id != user.id {
        return Err(BackendError::PermissionDenied(
            "You are not authorized to delete this post",
        ));
    }
    Post::set_deleted(post.id, true, &context)?;
    Ok(Json(SuccessResponse::default()))
}
