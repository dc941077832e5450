//! Catalog endpoints: listing, search, detail and admin create/update/delete.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use tracing::info;

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::db::contents::ContentFilter;
use crate::error::{AppError, AppResult};
use crate::models::{
    ContentListResponse, ContentMutationResponse, ContentResponse, ContentWithRelations,
    IncludeQuery, ListContentsQuery, MessageResponse, PaginationParams, Relations, SearchQuery,
};
use crate::services::catalog::{self, IMAGE_FIELDS, UpsertTarget};
use crate::services::intake::{self, MediaIntake};

fn list_response(
    contents: Vec<ContentWithRelations>,
    total: u64,
    pagination: &PaginationParams,
) -> ContentListResponse {
    ContentListResponse {
        contents: contents.into_iter().map(Into::into).collect(),
        total,
        page: pagination.page(),
        page_size: pagination.page_size(),
    }
}

async fn list_with(
    pool: &DbPool,
    filter: ContentFilter,
    pagination: PaginationParams,
) -> AppResult<HttpResponse> {
    let (contents, total) = pool
        .list_contents(&filter, &pagination, Relations::LISTING)
        .await?;
    Ok(HttpResponse::Ok().json(list_response(contents, total, &pagination)))
}

/// List contents, newest first.
#[utoipa::path(
    get,
    path = "/api/contents",
    tag = "Contents",
    params(ListContentsQuery),
    responses(
        (status = 200, description = "Page of contents", body = ContentListResponse),
        (status = 404, description = "Unknown category", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_contents(
    pool: web::Data<DbPool>,
    query: web::Query<ListContentsQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let filter = ContentFilter {
        content_type: query.content_type.filter(|t| !t.trim().is_empty()),
        category_id: query.category_id,
        ..Default::default()
    };
    let pagination = PaginationParams {
        page: query.page,
        page_size: query.page_size,
    };
    list_with(&pool, filter, pagination).await
}

/// Case-insensitive title search.
#[utoipa::path(
    get,
    path = "/api/contents/search",
    tag = "Contents",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching contents", body = ContentListResponse),
        (status = 400, description = "Empty query", body = crate::error::ErrorResponse),
    )
)]
pub async fn search_contents(
    pool: web::Data<DbPool>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    if query.q.trim().is_empty() {
        return Err(AppError::InvalidInput("Search query is required".to_string()));
    }
    let filter = ContentFilter {
        title_query: Some(query.q),
        ..Default::default()
    };
    let pagination = PaginationParams {
        page: query.page,
        page_size: query.page_size,
    };
    list_with(&pool, filter, pagination).await
}

/// Contents tagged with a genre.
#[utoipa::path(
    get,
    path = "/api/contents/genre/{genre_id}",
    tag = "Contents",
    params(("genre_id" = i32, Path, description = "Genre id"), PaginationParams),
    responses((status = 200, description = "Page of contents", body = ContentListResponse))
)]
pub async fn contents_by_genre(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    query: web::Query<PaginationParams>,
) -> AppResult<HttpResponse> {
    let filter = ContentFilter {
        genre_id: Some(path.into_inner()),
        ..Default::default()
    };
    list_with(&pool, filter, query.into_inner()).await
}

/// Contents whose type matches a category name.
#[utoipa::path(
    get,
    path = "/api/contents/category/{category_id}",
    tag = "Contents",
    params(("category_id" = i32, Path, description = "Category id"), PaginationParams),
    responses(
        (status = 200, description = "Page of contents", body = ContentListResponse),
        (status = 404, description = "Category not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn contents_by_category(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    query: web::Query<PaginationParams>,
) -> AppResult<HttpResponse> {
    let filter = ContentFilter {
        category_id: Some(path.into_inner()),
        ..Default::default()
    };
    list_with(&pool, filter, query.into_inner()).await
}

/// One content with its relations.
#[utoipa::path(
    get,
    path = "/api/contents/{content_id}",
    tag = "Contents",
    params(("content_id" = i32, Path, description = "Content id"), IncludeQuery),
    responses(
        (status = 200, description = "Content", body = ContentResponse),
        (status = 404, description = "Content not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_content(
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    query: web::Query<IncludeQuery>,
) -> AppResult<HttpResponse> {
    let content_id = path.into_inner();
    let content = pool
        .get_content(content_id, query.relations())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Content {}", content_id)))?;
    Ok(HttpResponse::Ok().json(ContentResponse::from(content)))
}

async fn save_content(
    intake: &MediaIntake,
    target: UpsertTarget,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let parts = intake::read_form(&mut payload, intake.storage(), intake.limits(), IMAGE_FIELDS).await?;
    let outcome = catalog::upsert_content(intake, target, parts).await?;
    let message = if outcome.created {
        "Content created successfully"
    } else {
        "Content updated successfully"
    };
    Ok(HttpResponse::Ok().json(ContentMutationResponse {
        message: message.to_string(),
        content: outcome.content.into(),
    }))
}

/// Create a content, or update the one with the same title.
#[utoipa::path(
    post,
    path = "/api/contents/create",
    tag = "Contents",
    request_body(content_type = "multipart/form-data", description = "Content fields, coverImage and episode video files"),
    responses(
        (status = 200, description = "Content saved", body = ContentMutationResponse),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin access required", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_content(
    _admin: AdminUser,
    intake: web::Data<MediaIntake>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    save_content(&intake, UpsertTarget::Create, payload).await
}

/// Update a content by id.
#[utoipa::path(
    put,
    path = "/api/contents/{content_id}",
    tag = "Contents",
    params(("content_id" = i32, Path, description = "Content id")),
    request_body(content_type = "multipart/form-data", description = "Content fields, coverImage and episode video files"),
    responses(
        (status = 200, description = "Content updated", body = ContentMutationResponse),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse),
        (status = 404, description = "Content not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn update_content(
    _admin: AdminUser,
    intake: web::Data<MediaIntake>,
    path: web::Path<i32>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    save_content(&intake, UpsertTarget::Update(path.into_inner()), payload).await
}

/// Soft-delete a content with its episodes and links.
#[utoipa::path(
    delete,
    path = "/api/contents/{content_id}",
    tag = "Contents",
    params(("content_id" = i32, Path, description = "Content id")),
    responses(
        (status = 200, description = "Content deleted", body = MessageResponse),
        (status = 404, description = "Content not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn delete_content(
    admin: AdminUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let content_id = path.into_inner();
    pool.soft_delete_content(content_id).await?;
    info!(content_id, user_id = admin.claims.user_id, "Content deleted");
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Content deleted successfully".to_string(),
    }))
}

/// Configure catalog routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/contents").route(web::get().to(list_contents)))
        .service(web::resource("/contents/search").route(web::get().to(search_contents)))
        .service(web::resource("/contents/create").route(web::post().to(create_content)))
        .service(web::resource("/contents/genre/{genre_id}").route(web::get().to(contents_by_genre)))
        .service(
            web::resource("/contents/category/{category_id}")
                .route(web::get().to(contents_by_category)),
        )
        .service(
            web::resource("/contents/{content_id}")
                .route(web::get().to(get_content))
                .route(web::put().to(update_content))
                .route(web::delete().to(delete_content)),
        );
}
