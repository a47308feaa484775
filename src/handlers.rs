use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{header, HeaderName, StatusCode, Uri},
    Extension, Json,
};
use sqlx::SqlitePool;

use crate::{
    authentication::{
        get_jwt_token, hash_password_argon2, verify_password_argon2, AuthUser, MaybeUser,
    },
    data_formats::{
        parse_recipe_filters, render_shopping_list, IngredientQueryParams, IngredientResponse,
        LoginRequest, PageWrapper, PaginationParams, RecipeRequest, RecipeResponse,
        RegisterRequest, ShortRecipeResponse, SubscriptionQueryParams, SubscriptionResponse,
        TagResponse, TokenResponse, UserResponse,
    },
    db_helpers::{
        add_recipe_relation_in_db, aggregate_shopping_list_in_db, count_recipes_by_author_in_db,
        create_recipe_in_db, delete_recipe_in_db, follow_author_in_db, get_ingredient_by_id_in_db,
        get_ingredients_for_recipe_in_db, get_recipe_by_id_in_db, get_tag_by_id_in_db,
        get_tags_for_recipe_in_db, get_user_by_email, get_user_by_id, insert_user,
        list_followed_authors_in_db, list_ingredients_in_db, list_recipes_in_db,
        is_following_in_db, list_short_recipes_by_author_in_db, list_tags_in_db,
        list_users_in_db, remove_recipe_relation_in_db, unfollow_author_in_db,
        update_recipe_in_db, RecipeRelation,
    },
    errors::{is_unique_violation, RequestError, RequestErrorJsonWrapper},
    models::Recipe,
    validation::{validate_cooking_time, validate_recipe_payload},
    JsonResponse,
};

type ErrorJson = JsonResponse<RequestErrorJsonWrapper>;
type JsonResult<T> = Result<Json<T>, ErrorJson>;
type CreatedResult<T> = Result<JsonResponse<T>, ErrorJson>;
type NoContentResult = Result<StatusCode, ErrorJson>;

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> Result<(), (StatusCode, String)> {
    Err((
        StatusCode::NOT_FOUND,
        format!("URL {} provided was not found", uri),
    ))
}

async fn build_recipe_response(
    pool: &SqlitePool,
    recipe: Recipe,
) -> Result<RecipeResponse, RequestError> {
    let tags = get_tags_for_recipe_in_db(pool, recipe.id).await?;
    let ingredients = get_ingredients_for_recipe_in_db(pool, recipe.id).await?;
    Ok(RecipeResponse::new(recipe, tags, ingredients))
}

// ----------------- User Handlers -----------------
pub async fn register_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Json(mut request): Json<RegisterRequest>,
) -> CreatedResult<UserResponse> {
    request.password = hash_password_argon2(request.password)
        .await
        .map_err(|_| RequestError::ServerError.to_json_response())?;

    let user = insert_user(&pool, &request).await.map_err(|e| {
        if let RequestError::DatabaseError(error) = &e {
            if is_unique_violation(error) {
                return RequestError::Conflict("A user with this username or email already exists")
                    .to_json_response();
            }
        }
        e.to_json_response()
    })?;

    Ok((StatusCode::CREATED, Json(UserResponse::new(user, false))))
}

pub async fn login_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Json(request): Json<LoginRequest>,
) -> JsonResult<TokenResponse> {
    let user = get_user_by_email(&pool, &request.email)
        .await
        .map_err(|e| e.to_json_response())?;
    let user = match user {
        Some(user) => user,
        None => {
            return Err(RequestError::Validation(
                "Unable to log in with the provided credentials".to_string(),
            )
            .to_json_response());
        }
    };

    let is_password_correct = verify_password_argon2(request.password, user.password.clone())
        .await
        .map_err(|_| RequestError::ServerError.to_json_response())?;
    if !is_password_correct {
        return Err(RequestError::Validation(
            "Unable to log in with the provided credentials".to_string(),
        )
        .to_json_response());
    }

    let token = get_jwt_token(user.id).map_err(|_| RequestError::ServerError.to_json_response())?;
    Ok(Json(TokenResponse { token }))
}

pub async fn get_current_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    MaybeUser(maybe_user): MaybeUser,
) -> JsonResult<UserResponse> {
    if let Some(AuthUser { id, .. }) = maybe_user {
        let user = get_user_by_id(&pool, id)
            .await
            .map_err(|e| e.to_json_response())?;
        let user = match user {
            Some(user) => user,
            None => return Err(RequestError::NotFound("User not found").to_json_response()),
        };
        return Ok(Json(UserResponse::new(user, false)));
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

pub async fn list_users(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
    Query(params): Query<PaginationParams>,
) -> JsonResult<PageWrapper<UserResponse>> {
    let users = list_users_in_db(&pool, params.limit as i64, params.offset as i64)
        .await
        .map_err(|e| e.to_json_response())?;
    let mut results = Vec::with_capacity(users.len());
    for user in users {
        let is_subscribed = is_following_in_db(&pool, maybe_user.get_id(), user.id)
            .await
            .map_err(|e| e.to_json_response())?;
        results.push(UserResponse::new(user, is_subscribed));
    }
    Ok(Json(PageWrapper::wrap(results)))
}

pub async fn get_user_profile(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
    Path(user_id): Path<i64>,
) -> JsonResult<UserResponse> {
    let user = get_user_by_id(&pool, user_id)
        .await
        .map_err(|e| e.to_json_response())?;
    let user = match user {
        Some(user) => user,
        None => return Err(RequestError::NotFound("User not found").to_json_response()),
    };
    let is_subscribed = is_following_in_db(&pool, maybe_user.get_id(), user_id)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(UserResponse::new(user, is_subscribed)))
}

// ----------------- Subscription Handlers -----------------
pub async fn subscribe_to_author(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(author_id): Path<i64>,
    Query(params): Query<SubscriptionQueryParams>,
) -> CreatedResult<SubscriptionResponse> {
    if let Some(AuthUser { id, .. }) = maybe_user {
        let author = follow_author_in_db(&pool, id, author_id)
            .await
            .map_err(|e| e.to_json_response())?;
        let recipes = list_short_recipes_by_author_in_db(&pool, author_id, params.recipes_limit)
            .await
            .map_err(|e| e.to_json_response())?;
        let recipes_count = count_recipes_by_author_in_db(&pool, author_id)
            .await
            .map_err(|e| e.to_json_response())?;
        return Ok((
            StatusCode::CREATED,
            Json(SubscriptionResponse::new(author, recipes, recipes_count)),
        ));
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

pub async fn unsubscribe_from_author(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(author_id): Path<i64>,
) -> NoContentResult {
    if let Some(AuthUser { id, .. }) = maybe_user {
        unfollow_author_in_db(&pool, id, author_id)
            .await
            .map_err(|e| e.to_json_response())?;
        return Ok(StatusCode::NO_CONTENT);
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

pub async fn list_subscriptions(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Query(params): Query<SubscriptionQueryParams>,
) -> JsonResult<PageWrapper<SubscriptionResponse>> {
    if let Some(AuthUser { id, .. }) = maybe_user {
        let authors =
            list_followed_authors_in_db(&pool, id, params.limit as i64, params.offset as i64)
                .await
                .map_err(|e| e.to_json_response())?;
        let mut results = Vec::with_capacity(authors.len());
        for author in authors {
            let recipes =
                list_short_recipes_by_author_in_db(&pool, author.id, params.recipes_limit)
                    .await
                    .map_err(|e| e.to_json_response())?;
            let recipes_count = count_recipes_by_author_in_db(&pool, author.id)
                .await
                .map_err(|e| e.to_json_response())?;
            results.push(SubscriptionResponse::new(author, recipes, recipes_count));
        }
        return Ok(Json(PageWrapper::wrap(results)));
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

// ----------------- Tag Handlers -----------------
pub async fn list_tags(Extension(pool): Extension<Arc<SqlitePool>>) -> JsonResult<Vec<TagResponse>> {
    let tags = list_tags_in_db(&pool)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

pub async fn get_tag(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(tag_id): Path<i64>,
) -> JsonResult<TagResponse> {
    let tag = get_tag_by_id_in_db(&pool, tag_id)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(TagResponse::from(tag)))
}

// ----------------- Ingredient Handlers -----------------
pub async fn list_ingredients(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Query(params): Query<IngredientQueryParams>,
) -> JsonResult<Vec<IngredientResponse>> {
    let ingredients = list_ingredients_in_db(&pool, params.name.as_deref())
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(
        ingredients
            .into_iter()
            .map(IngredientResponse::from)
            .collect(),
    ))
}

pub async fn get_ingredient(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(ingredient_id): Path<i64>,
) -> JsonResult<IngredientResponse> {
    let ingredient = get_ingredient_by_id_in_db(&pool, ingredient_id)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(IngredientResponse::from(ingredient)))
}

// ----------------- Recipe Handlers -----------------
pub async fn list_recipes(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
    Query(params): Query<Vec<(String, String)>>,
) -> JsonResult<PageWrapper<RecipeResponse>> {
    let filters = parse_recipe_filters(&params);
    let recipes = list_recipes_in_db(&pool, maybe_user.get_id(), &filters)
        .await
        .map_err(|e| e.to_json_response())?;
    let mut results = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let response = build_recipe_response(&pool, recipe)
            .await
            .map_err(|e| e.to_json_response())?;
        results.push(response);
    }
    Ok(Json(PageWrapper::wrap(results)))
}

pub async fn create_recipe(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Json(request): Json<RecipeRequest>,
) -> CreatedResult<RecipeResponse> {
    if let Some(AuthUser { id, .. }) = maybe_user {
        validate_recipe_payload(&request.tags, &request.ingredients)
            .map_err(|e| e.to_json_response())?;
        validate_cooking_time(request.cooking_time).map_err(|e| e.to_json_response())?;

        let recipe_id = create_recipe_in_db(&pool, id, &request)
            .await
            .map_err(|e| e.to_json_response())?;
        let recipe = get_recipe_by_id_in_db(&pool, Some(id), recipe_id)
            .await
            .map_err(|e| e.to_json_response())?
            .ok_or_else(|| RequestError::ServerError.to_json_response())?;
        let response = build_recipe_response(&pool, recipe)
            .await
            .map_err(|e| e.to_json_response())?;
        return Ok((StatusCode::CREATED, Json(response)));
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

pub async fn get_recipe(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
    Path(recipe_id): Path<i64>,
) -> JsonResult<RecipeResponse> {
    let recipe = get_recipe_by_id_in_db(&pool, maybe_user.get_id(), recipe_id)
        .await
        .map_err(|e| e.to_json_response())?;
    let recipe = match recipe {
        Some(recipe) => recipe,
        None => return Err(RequestError::NotFound("Recipe not found").to_json_response()),
    };
    let response = build_recipe_response(&pool, recipe)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(response))
}

pub async fn update_recipe(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(recipe_id): Path<i64>,
    Json(request): Json<RecipeRequest>,
) -> JsonResult<RecipeResponse> {
    if let Some(AuthUser { id, .. }) = maybe_user {
        let actor = match get_user_by_id(&pool, id)
            .await
            .map_err(|e| e.to_json_response())?
        {
            Some(actor) => actor,
            None => {
                return Err(
                    RequestError::NotAuthorized("Need to be authorized").to_json_response()
                )
            }
        };
        validate_recipe_payload(&request.tags, &request.ingredients)
            .map_err(|e| e.to_json_response())?;
        validate_cooking_time(request.cooking_time).map_err(|e| e.to_json_response())?;

        update_recipe_in_db(&pool, &actor, recipe_id, &request)
            .await
            .map_err(|e| e.to_json_response())?;
        let recipe = get_recipe_by_id_in_db(&pool, Some(id), recipe_id)
            .await
            .map_err(|e| e.to_json_response())?
            .ok_or_else(|| RequestError::ServerError.to_json_response())?;
        let response = build_recipe_response(&pool, recipe)
            .await
            .map_err(|e| e.to_json_response())?;
        return Ok(Json(response));
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

pub async fn delete_recipe(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(recipe_id): Path<i64>,
) -> NoContentResult {
    if let Some(AuthUser { id, .. }) = maybe_user {
        let actor = match get_user_by_id(&pool, id)
            .await
            .map_err(|e| e.to_json_response())?
        {
            Some(actor) => actor,
            None => {
                return Err(
                    RequestError::NotAuthorized("Need to be authorized").to_json_response()
                )
            }
        };
        delete_recipe_in_db(&pool, &actor, recipe_id)
            .await
            .map_err(|e| e.to_json_response())?;
        return Ok(StatusCode::NO_CONTENT);
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

// ----------------- Favorite / Shopping Cart Handlers -----------------
pub async fn favorite_recipe(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(recipe_id): Path<i64>,
) -> CreatedResult<ShortRecipeResponse> {
    add_recipe_relation(&pool, maybe_user, RecipeRelation::Favorite, recipe_id).await
}

pub async fn unfavorite_recipe(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(recipe_id): Path<i64>,
) -> NoContentResult {
    remove_recipe_relation(&pool, maybe_user, RecipeRelation::Favorite, recipe_id).await
}

pub async fn add_recipe_to_shopping_cart(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(recipe_id): Path<i64>,
) -> CreatedResult<ShortRecipeResponse> {
    add_recipe_relation(&pool, maybe_user, RecipeRelation::ShoppingCart, recipe_id).await
}

pub async fn remove_recipe_from_shopping_cart(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(recipe_id): Path<i64>,
) -> NoContentResult {
    remove_recipe_relation(&pool, maybe_user, RecipeRelation::ShoppingCart, recipe_id).await
}

async fn add_recipe_relation(
    pool: &SqlitePool,
    maybe_user: Option<AuthUser>,
    relation: RecipeRelation,
    recipe_id: i64,
) -> CreatedResult<ShortRecipeResponse> {
    if let Some(AuthUser { id, .. }) = maybe_user {
        let recipe = add_recipe_relation_in_db(pool, relation, id, recipe_id)
            .await
            .map_err(|e| e.to_json_response())?;
        return Ok((StatusCode::CREATED, Json(ShortRecipeResponse::from(recipe))));
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

async fn remove_recipe_relation(
    pool: &SqlitePool,
    maybe_user: Option<AuthUser>,
    relation: RecipeRelation,
    recipe_id: i64,
) -> NoContentResult {
    if let Some(AuthUser { id, .. }) = maybe_user {
        remove_recipe_relation_in_db(pool, relation, id, recipe_id)
            .await
            .map_err(|e| e.to_json_response())?;
        return Ok(StatusCode::NO_CONTENT);
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

// ----------------- Shopping List Download -----------------
pub async fn download_shopping_cart(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
) -> Result<([(HeaderName, &'static str); 2], String), ErrorJson> {
    if let Some(AuthUser { id, .. }) = maybe_user {
        let user = match get_user_by_id(&pool, id)
            .await
            .map_err(|e| e.to_json_response())?
        {
            Some(user) => user,
            None => {
                return Err(
                    RequestError::NotAuthorized("Need to be authorized").to_json_response()
                )
            }
        };
        let items = aggregate_shopping_list_in_db(&pool, id)
            .await
            .map_err(|e| e.to_json_response())?;
        let owner = if user.full_name().is_empty() {
            user.username.clone()
        } else {
            user.full_name()
        };
        let document = render_shopping_list(&owner, &items);
        return Ok((
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=shopping_list.txt",
                ),
            ],
            document,
        ));
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}
