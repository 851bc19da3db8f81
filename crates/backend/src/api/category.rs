use super::UserExt;
use crate::validate::validate_not_empty;
use axum::{Form, Json, extract::State};
use axum_macros::debug_handler;
use quill_database::{
    common::{
        SuccessResponse,
        category::{
            Category,
            CreateCategoryParams,
            DeleteCategoryParams,
            UpdateCategoryParams,
        },
    },
    error::{BackendError, BackendResult},
    impls::{QuillContext, category::CategoryInsertForm},
    utils::generate_slug,
};

#[debug_handler]
pub(crate) async fn create_category(
    user: UserExt,
    State(context): State<QuillContext>,
    Form(params): Form<CreateCategoryParams>,
) -> BackendResult<Json<Category>> {
    validate_not_empty(&params.name)?;
    let slug = generate_slug(&params.name);
    Category::check_slug_taken(user.id, &slug, &context)?;
    let form = CategoryInsertForm {
        name: params.name.trim().to_string(),
        slug,
        creator_id: user.id,
    };
    Ok(Json(Category::create(form, &context)?))
}

#[debug_handler]
pub(crate) async fn list_categories(
    State(context): State<QuillContext>,
) -> BackendResult<Json<Vec<Category>>> {
    Ok(Json(Category::list_all(&context)?))
}

#[debug_handler]
pub(crate) async fn user_categories(
    user: UserExt,
    State(context): State<QuillContext>,
) -> BackendResult<Json<Vec<Category>>> {
    Ok(Json(Category::list_for_creator(user.id, &context)?))
}

#[debug_handler]
pub(crate) async fn update_category(
    user: UserExt,
    State(context): State<QuillContext>,
    Form(params): Form<UpdateCategoryParams>,
) -> BackendResult<Json<Category>> {
    validate_not_empty(&params.name)?;
    let category = Category::read(params.category_id, &context)?;
    if category.creator_id != user.id {
        return Err(BackendError::PermissionDenied(
            "You are not authorized to update this category",
        ));
    }
    let slug = generate_slug(&params.name);
    Ok(Json(Category::update_name(
        category.id,
        params.name.trim().to_string(),
        slug,
        &context,
    )?))
}

#[debug_handler]
pub(crate) async fn delete_category(
    user: UserExt,
    State(context): State<QuillContext>,
    Form(params): Form<DeleteCategoryParams>,
) -> BackendResult<Json<SuccessResponse>> {
    let category = Category::read(params.category_id, &context)?;
    if category.creator_id != user.id {
        return Err(BackendError::PermissionDenied(
            "You are not authorized to delete this category",
        ));
    }
    Category::delete(category.id, &context)?;
    Ok(Json(SuccessResponse::default()))
}
