use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CommentFormPage, RecipeDeletePage, RecipeFormPage, RecipeIndex, RecipeListQuery, RecipeShow},
    forms::{RecipeData, RecipeForm},
    repo_types::{Recipe, RecipeCriteria},
    services::RecipeService,
    voter::RecipeVoter,
};
use crate::{
    auth::extractors::CurrentUser,
    categories::services::CategoryService,
    comments::{
        forms::CommentForm, repo_types::Comment, services::CommentService, voter::CommentVoter,
    },
    error::AppError,
    flash::{redirect, Flash, FlashLevel},
    db::is_unique_violation,
    forms::{add_error, already_used, optional, FieldErrors, ALREADY_USED},
    state::AppState,
    tags::{services::TagService, transformer::TagsTransformer},
    view::View,
    voter::{deny_unless_granted, Action},
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipe", get(index))
        .route("/recipe/:id", get(show))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipe/create", get(create_form).post(create))
        .route("/recipe/:id/edit", get(edit_form).put(edit))
        .route("/recipe/:id/delete", get(delete_form).delete(delete))
        .route("/recipe/:id/comment", get(comment_form).post(comment))
}

async fn load(recipes: &RecipeService, id: Uuid) -> Result<Recipe, AppError> {
    recipes
        .find_one_by_id(id)
        .await?
        .ok_or(AppError::NotFound("recipe"))
}

fn parse_filter(value: &Option<String>, name: &str) -> Result<Option<Uuid>, AppError> {
    optional(value)
        .map(|v| Uuid::parse_str(&v))
        .transpose()
        .map_err(|_| AppError::BadRequest(format!("Invalid {name} filter")))
}

/// Binds the form and runs the checks that need the database: the category
/// must exist and the title must be free.
async fn bind(
    form: &mut RecipeForm,
    recipes: &RecipeService,
    categories: &CategoryService,
    except: Option<Uuid>,
) -> Result<Result<RecipeData, FieldErrors>, AppError> {
    let bound = form.bind();
    let mut errors = bound.as_ref().err().cloned().unwrap_or_default();
    if !errors.contains_key("title") && recipes.is_title_taken(&form.title, except).await? {
        add_error(&mut errors, "title", ALREADY_USED);
    }
    if !errors.contains_key("category") {
        if let Ok(id) = Uuid::parse_str(form.category.trim()) {
            if categories.find_one_by_id(id).await?.is_none() {
                add_error(&mut errors, "category", "This value is not valid.");
            }
        }
    }
    Ok(match bound {
        Ok(data) if errors.is_empty() => Ok(data),
        _ => Err(errors),
    })
}

#[instrument(skip(recipes, categories, tags, flash))]
pub async fn index(
    State(recipes): State<RecipeService>,
    State(categories): State<CategoryService>,
    State(tags): State<TagService>,
    Query(q): Query<RecipeListQuery>,
    flash: Flash,
) -> Result<View<RecipeIndex>, AppError> {
    let criteria = RecipeCriteria {
        category_id: parse_filter(&q.category, "category")?,
        tag_id: parse_filter(&q.tag, "tag")?,
        author_id: None,
    };
    let category = match criteria.category_id {
        Some(id) => categories.find_one_by_id(id).await?,
        None => None,
    };
    let tag = match criteria.tag_id {
        Some(id) => tags.find_one_by_id(id).await?,
        None => None,
    };
    let pagination = recipes
        .paginated_list(q.page.unwrap_or(1), &criteria)
        .await?;
    Ok(View::new(RecipeIndex {
        pagination,
        category,
        tag,
    })
    .with_flash(flash))
}

#[instrument(skip(recipes, categories, comments, flash))]
pub async fn show(
    State(recipes): State<RecipeService>,
    State(categories): State<CategoryService>,
    State(comments): State<CommentService>,
    Path(id): Path<Uuid>,
    flash: Flash,
) -> Result<View<RecipeShow>, AppError> {
    let recipe = load(&recipes, id).await?;
    let category = categories.find_one_by_id(recipe.category_id).await?;
    let comment_count = comments.count_by_recipe(recipe.id).await?;
    let comments = comments.find_by_recipe(recipe.id).await?;
    Ok(View::new(RecipeShow {
        recipe,
        category,
        comments,
        comment_count,
    })
    .with_flash(flash))
}

#[instrument(skip(categories, user))]
pub async fn create_form(
    State(categories): State<CategoryService>,
    CurrentUser(user): CurrentUser,
) -> Result<View<RecipeFormPage>, AppError> {
    deny_unless_granted(&RecipeVoter, Action::Create, None, &user)?;
    Ok(View::new(RecipeFormPage {
        recipe: None,
        form: RecipeForm::default(),
        categories: categories.find_all().await?,
        errors: FieldErrors::new(),
    }))
}

#[instrument(skip(recipes, categories, tags, user, form))]
pub async fn create(
    State(recipes): State<RecipeService>,
    State(categories): State<CategoryService>,
    State(tags): State<TagService>,
    CurrentUser(user): CurrentUser,
    Form(mut form): Form<RecipeForm>,
) -> Result<Response, AppError> {
    deny_unless_granted(&RecipeVoter, Action::Create, None, &user)?;
    let data = match bind(&mut form, &recipes, &categories, None).await? {
        Ok(data) => data,
        Err(errors) => {
            return Ok(View::invalid(RecipeFormPage {
                recipe: None,
                form,
                categories: categories.find_all().await?,
                errors,
            })
            .into_response())
        }
    };

    let mut recipe = Recipe::new(&data.title, data.category_id, Some(user.id));
    let linked = TagsTransformer::new(&tags).reverse_transform(&data.tags).await?;
    data.apply(&mut recipe, linked);
    if let Err(err) = recipes.save(&recipe).await {
        if !is_unique_violation(&err) {
            return Err(err.into());
        }
        warn!(title = %recipe.title, "recipe title taken before save");
        return Ok(View::invalid(RecipeFormPage {
            recipe: None,
            form,
            categories: categories.find_all().await?,
            errors: already_used("title"),
        })
        .into_response());
    }
    Ok(redirect("/recipe", FlashLevel::Success, "message_added_successfully"))
}

#[instrument(skip(recipes, categories, user))]
pub async fn edit_form(
    State(recipes): State<RecipeService>,
    State(categories): State<CategoryService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<View<RecipeFormPage>, AppError> {
    let recipe = load(&recipes, id).await?;
    deny_unless_granted(&RecipeVoter, Action::Edit, Some(&recipe), &user)?;
    Ok(View::new(RecipeFormPage {
        form: RecipeForm::from_recipe(&recipe),
        recipe: Some(recipe),
        categories: categories.find_all().await?,
        errors: FieldErrors::new(),
    }))
}

#[instrument(skip(recipes, categories, tags, user, form))]
pub async fn edit(
    State(recipes): State<RecipeService>,
    State(categories): State<CategoryService>,
    State(tags): State<TagService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Form(mut form): Form<RecipeForm>,
) -> Result<Response, AppError> {
    let mut recipe = load(&recipes, id).await?;
    deny_unless_granted(&RecipeVoter, Action::Edit, Some(&recipe), &user)?;
    let data = match bind(&mut form, &recipes, &categories, Some(recipe.id)).await? {
        Ok(data) => data,
        Err(errors) => {
            return Ok(View::invalid(RecipeFormPage {
                recipe: Some(recipe),
                form,
                categories: categories.find_all().await?,
                errors,
            })
            .into_response())
        }
    };

    let linked = TagsTransformer::new(&tags).reverse_transform(&data.tags).await?;
    data.apply(&mut recipe, linked);
    recipe.touch();
    if let Err(err) = recipes.save(&recipe).await {
        if !is_unique_violation(&err) {
            return Err(err.into());
        }
        warn!(recipe_id = %recipe.id, title = %recipe.title, "recipe title taken before save");
        return Ok(View::invalid(RecipeFormPage {
            recipe: Some(load(&recipes, id).await?),
            form,
            categories: categories.find_all().await?,
            errors: already_used("title"),
        })
        .into_response());
    }
    Ok(redirect("/recipe", FlashLevel::Success, "message_updated_successfully"))
}

#[instrument(skip(recipes, user))]
pub async fn delete_form(
    State(recipes): State<RecipeService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<View<RecipeDeletePage>, AppError> {
    let recipe = load(&recipes, id).await?;
    deny_unless_granted(&RecipeVoter, Action::Delete, Some(&recipe), &user)?;
    Ok(View::new(RecipeDeletePage { recipe }))
}

#[instrument(skip(recipes, user))]
pub async fn delete(
    State(recipes): State<RecipeService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let recipe = load(&recipes, id).await?;
    deny_unless_granted(&RecipeVoter, Action::Delete, Some(&recipe), &user)?;
    recipes.delete(&recipe).await?;
    Ok(redirect("/recipe", FlashLevel::Success, "message_deleted_successfully"))
}

#[instrument(skip(recipes, user))]
pub async fn comment_form(
    State(recipes): State<RecipeService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<View<CommentFormPage>, AppError> {
    let recipe = load(&recipes, id).await?;
    deny_unless_granted(&CommentVoter, Action::Create, None, &user)?;
    Ok(View::new(CommentFormPage {
        recipe_id: recipe.id,
        recipe_title: recipe.title,
        form: CommentForm::default(),
        errors: FieldErrors::new(),
    }))
}

#[instrument(skip(recipes, comments, user, form))]
pub async fn comment(
    State(recipes): State<RecipeService>,
    State(comments): State<CommentService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Form(mut form): Form<CommentForm>,
) -> Result<Response, AppError> {
    let recipe = load(&recipes, id).await?;
    deny_unless_granted(&CommentVoter, Action::Create, None, &user)?;
    let errors = form.check();
    if !errors.is_empty() {
        warn!(recipe_id = %recipe.id, "comment rejected");
        return Ok(View::invalid(CommentFormPage {
            recipe_id: recipe.id,
            recipe_title: recipe.title,
            form,
            errors,
        })
        .into_response());
    }

    comments
        .save(&Comment::new(recipe.id, user.id, &form.content))
        .await?;
    Ok(redirect(
        &format!("/recipe/{}", recipe.id),
        FlashLevel::Success,
        "message_added_successfully",
    ))
}
