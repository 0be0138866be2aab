use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query},
    http::{StatusCode, Uri},
    Extension, Json,
};

use crate::{
    authentication::{
        generate_token_key, get_jwt_token, hash_password_argon2, verify_jwt_token,
        verify_password_argon2, AuthUser, TokenKind,
    },
    data_formats::*,
    db_helpers::*,
    errors::RequestError,
    media::{is_supported_image, remove_media_file, store_ad_image},
    models::User,
    AppState,
};

type JsonResult<T> = Result<Json<T>, RequestError>;
type CreatedResult<T> = Result<(StatusCode, Json<T>), RequestError>;

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

async fn authenticate(pool: &sqlx::SqlitePool, request: LoginRequest) -> Result<User, RequestError> {
    let user = match get_user_by_username(pool, &request.username).await? {
        Some(user) => user,
        None => return Err(RequestError::NotAuthorized("Invalid credentials")),
    };
    let is_password_correct = verify_password_argon2(request.password, user.password.clone())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password verification failed");
            RequestError::ServerError
        })?;
    if !is_password_correct {
        return Err(RequestError::NotAuthorized("Invalid credentials"));
    }
    Ok(user)
}

// ----------------- User Handlers -----------------
pub async fn register_user(
    Extension(state): Extension<Arc<AppState>>,
    ValidJson(mut request): ValidJson<RegisterRequest>,
) -> CreatedResult<UserResponse> {
    request.password = hash_password_argon2(request.password)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            RequestError::ServerError
        })?;

    let user = insert_user(&state.pool, request).await.map_err(|e| {
        if e.is_unique_violation() {
            return RequestError::Validation("A user with that username already exists.".into());
        }
        e
    })?;
    let locations = get_user_locations_in_db(&state.pool, user.id).await?;
    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(UserResponse::new(user, locations))))
}

pub async fn login_user(
    Extension(state): Extension<Arc<AppState>>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> JsonResult<TokenResponse> {
    let user = authenticate(&state.pool, request).await?;
    let token = get_or_create_token_in_db(&state.pool, user.id, &generate_token_key()).await?;
    Ok(Json(TokenResponse { token }))
}

pub async fn logout_user(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthUser,
) -> JsonResult<StatusResponse> {
    delete_token_for_user_in_db(&state.pool, user.id).await?;
    Ok(Json(StatusResponse {
        status: "logged out".to_string(),
    }))
}

pub async fn obtain_token_pair(
    Extension(state): Extension<Arc<AppState>>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> JsonResult<TokenPairResponse> {
    let user = authenticate(&state.pool, request).await?;
    let issue = |kind| {
        get_jwt_token(&state.config, user.id, kind).map_err(|e| {
            tracing::error!(error = %e, "jwt encoding failed");
            RequestError::ServerError
        })
    };
    Ok(Json(TokenPairResponse {
        access: issue(TokenKind::Access)?,
        refresh: issue(TokenKind::Refresh)?,
    }))
}

pub async fn refresh_token(
    Extension(state): Extension<Arc<AppState>>,
    ValidJson(RefreshRequest { refresh }): ValidJson<RefreshRequest>,
) -> JsonResult<AccessTokenResponse> {
    let user_id = verify_jwt_token(&state.config, &refresh, TokenKind::Refresh)?;
    if get_user_by_id(&state.pool, user_id).await?.is_none() {
        return Err(RequestError::NotAuthorized("User no longer exists"));
    }
    let access = get_jwt_token(&state.config, user_id, TokenKind::Access).map_err(|e| {
        tracing::error!(error = %e, "jwt encoding failed");
        RequestError::ServerError
    })?;
    Ok(Json(AccessTokenResponse { access }))
}

pub async fn get_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> JsonResult<UserResponse> {
    let (user, locations) = get_user_with_locations_in_db(&state.pool, id).await?;
    Ok(Json(UserResponse::new(user, locations)))
}

pub async fn delete_user(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    if user.id != id {
        return Err(RequestError::Forbidden);
    }
    let images = delete_user_in_db(&state.pool, id).await?;
    for image in &images {
        remove_media_file(&state.config.media_root, image).await;
    }
    tracing::info!(user_id = id, removed_images = images.len(), "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
// ----------------- End User Handlers -----------------

// ----------------- Category Handlers -----------------
pub async fn list_categories(
    Extension(state): Extension<Arc<AppState>>,
) -> JsonResult<Vec<CategoryResponse>> {
    let categories = list_categories_in_db(&state.pool).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

pub async fn create_category(
    Extension(state): Extension<Arc<AppState>>,
    _user: AuthUser,
    ValidJson(request): ValidJson<CreateCategoryRequest>,
) -> CreatedResult<CategoryResponse> {
    let category = create_category_in_db(&state.pool, request).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

pub async fn delete_category(
    Extension(state): Extension<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    for image in delete_category_in_db(&state.pool, id).await? {
        remove_media_file(&state.config.media_root, &image).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

// ----------------- Ad Handlers -----------------
pub async fn list_ads(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> JsonResult<Vec<AdListResponse>> {
    let filter = AdFilter::from_query_pairs(params)?;
    let ads = list_ads_in_db(&state.pool, &filter).await?;
    Ok(Json(ads.into_iter().map(Into::into).collect()))
}

pub async fn get_ad(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<i64>,
) -> JsonResult<AdDetailResponse> {
    let detail = get_ad_detail_in_db(&state.pool, id).await?;
    Ok(Json(detail.into()))
}

pub async fn create_ad(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthUser,
    ValidJson(request): ValidJson<CreateAdRequest>,
) -> CreatedResult<AdDetailResponse> {
    let detail = create_ad_in_db(&state.pool, user.id, request).await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

pub async fn replace_ad(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidJson(request): ValidJson<UpdateAdRequest>,
) -> JsonResult<AdDetailResponse> {
    request.check_complete().map_err(RequestError::Validation)?;
    let detail = update_ad_in_db(&state.pool, user.id, id, request).await?;
    Ok(Json(detail.into()))
}

pub async fn patch_ad(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidJson(request): ValidJson<UpdateAdRequest>,
) -> JsonResult<AdDetailResponse> {
    let detail = update_ad_in_db(&state.pool, user.id, id, request).await?;
    Ok(Json(detail.into()))
}

pub async fn delete_ad(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    if let Some(image) = delete_ad_in_db(&state.pool, user.id, id).await? {
        remove_media_file(&state.config.media_root, &image).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn upload_ad_image(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> JsonResult<AdImageResponse> {
    ensure_ad_owner_in_db(&state.pool, user.id, id).await?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RequestError::Validation(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_owned();
        let content_type = field.content_type().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| RequestError::Validation(e.to_string()))?;
        if data.is_empty() {
            return Err(RequestError::Validation("The submitted file is empty.".into()));
        }
        if !is_supported_image(content_type.as_deref(), &data) {
            return Err(RequestError::Validation(
                "Upload a valid image. The file you uploaded was either not an image or a corrupted image.".into(),
            ));
        }

        let stored = store_ad_image(&state.config.media_root, &file_name, &data)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "storing ad image failed");
                RequestError::ServerError
            })?;
        let (ad, previous) = match set_ad_image_in_db(&state.pool, user.id, id, &stored).await {
            Ok(result) => result,
            Err(e) => {
                remove_media_file(&state.config.media_root, &stored).await;
                return Err(e);
            }
        };
        if let Some(previous) = previous {
            remove_media_file(&state.config.media_root, &previous).await;
        }
        tracing::info!(ad_id = id, image = %stored, "ad image uploaded");
        return Ok(Json(ad.into()));
    }
    Err(RequestError::Validation("No image was submitted.".into()))
}

// ----------------- Like Handlers -----------------
pub async fn create_like(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthUser,
    ValidJson(LikeRequest { ad }): ValidJson<LikeRequest>,
) -> CreatedResult<LikeResponse> {
    let like = add_like_in_db(&state.pool, user.id, ad).await?;
    Ok((StatusCode::CREATED, Json(like.into())))
}

pub async fn list_liked_ads(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthUser,
) -> JsonResult<Vec<AdListResponse>> {
    let ads = list_liked_ads_in_db(&state.pool, user.id).await?;
    Ok(Json(ads.into_iter().map(Into::into).collect()))
}

// ----------------- Comment Handlers -----------------
pub async fn create_comment(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthUser,
    ValidJson(request): ValidJson<CommentRequest>,
) -> CreatedResult<CommentResponse> {
    let comment = add_comment_to_ad_in_db(&state.pool, user.id, request).await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}
