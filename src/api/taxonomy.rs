//! Genre and category endpoints.

use actix_web::{HttpResponse, web};
use tracing::info;

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{CategoryResponse, CreateTaxonomyRequest, GenreResponse};

#[utoipa::path(
    get,
    path = "/api/genres",
    tag = "Taxonomy",
    responses((status = 200, description = "All genres by name", body = Vec<GenreResponse>))
)]
pub async fn list_genres(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let genres: Vec<GenreResponse> = pool
        .list_genres()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(HttpResponse::Ok().json(genres))
}

#[utoipa::path(
    post,
    path = "/api/genres",
    tag = "Taxonomy",
    request_body = CreateTaxonomyRequest,
    responses(
        (status = 201, description = "Genre created", body = GenreResponse),
        (status = 400, description = "Blank or duplicate name", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_genre(
    _admin: AdminUser,
    pool: web::Data<DbPool>,
    body: web::Json<CreateTaxonomyRequest>,
) -> AppResult<HttpResponse> {
    let genre = pool.create_genre(&body.name).await?;
    info!(genre_id = genre.id, name = %genre.name, "Genre created");
    Ok(HttpResponse::Created().json(GenreResponse::from(genre)))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Taxonomy",
    responses((status = 200, description = "All categories by name", body = Vec<CategoryResponse>))
)]
pub async fn list_categories(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let categories: Vec<CategoryResponse> = pool
        .list_categories()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(HttpResponse::Ok().json(categories))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Taxonomy",
    request_body = CreateTaxonomyRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Blank or duplicate name", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_category(
    _admin: AdminUser,
    pool: web::Data<DbPool>,
    body: web::Json<CreateTaxonomyRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let category = pool
        .create_category(&body.name, body.description)
        .await?;
    info!(category_id = category.id, name = %category.name, "Category created");
    Ok(HttpResponse::Created().json(CategoryResponse::from(category)))
}

/// Configure taxonomy routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/genres")
            .route(web::get().to(list_genres))
            .route(web::post().to(create_genre)),
    )
    .service(
        web::resource("/categories")
            .route(web::get().to(list_categories))
            .route(web::post().to(create_category)),
    );
}
