//! HTTP handler functions for the natal chart API.

use actix_web::{HttpResponse, web};
use natal_chart::ChartError;
use natal_chart_models::ZodiacSign;
use natal_forum::ForumError;
use natal_forum_models::{NewCategory, NewPost, NewTopic};
use natal_server_models::{
    ApiChart, ApiChartList, ApiError, ApiHealth, ApiSign, ApiTopicDetail, ChartListParams,
    ChartRequest,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/signs`
///
/// Returns the static sign table (element, colour, glyph).
pub async fn signs() -> HttpResponse {
    let table: Vec<ApiSign> = ZodiacSign::all().iter().copied().map(ApiSign::from).collect();
    HttpResponse::Ok().json(table)
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

fn internal_error(context: &str, e: impl std::fmt::Display) -> HttpResponse {
    log::error!("{context}: {e}");
    HttpResponse::InternalServerError().json(ApiError::new(context))
}

fn chart_error_response(e: &ChartError) -> HttpResponse {
    match e {
        ChartError::InvalidInput(reason) => {
            log::warn!("Rejected chart request: {reason}");
            HttpResponse::BadRequest().json(ApiError::new(reason.to_string()))
        }
        ChartError::ProviderUnavailable { .. } | ChartError::MalformedProviderData { .. } => {
            log::error!("Chart derivation failed: {e}");
            HttpResponse::ServiceUnavailable().json(ApiError {
                error: "Ephemeris provider unavailable".to_string(),
                retryable: Some(e.is_retryable()),
            })
        }
    }
}

/// `POST /api/charts`
///
/// Validates the birth form, derives the chart, and persists it. Nothing
/// is stored unless derivation fully succeeds.
pub async fn create_chart(
    state: web::Data<AppState>,
    body: web::Json<ChartRequest>,
) -> HttpResponse {
    let input = match body.to_birth_input() {
        Ok(input) => input,
        Err(e) => return chart_error_response(&ChartError::InvalidInput(e)),
    };

    let chart = match state.charts.derive(&input).await {
        Ok(chart) => chart,
        Err(e) => return chart_error_response(&e),
    };

    let id = match natal_database::store_chart(state.db.as_ref(), &chart).await {
        Ok(id) => id,
        Err(e) => return internal_error("Failed to store chart", e),
    };

    match natal_database::fetch_chart(state.db.as_ref(), &id).await {
        Ok(Some(stored)) => {
            log::info!("Created chart {id}");
            HttpResponse::Created().json(ApiChart::from(stored))
        }
        Ok(None) => internal_error("Failed to load stored chart", format!("{id} missing")),
        Err(e) => internal_error("Failed to load stored chart", e),
    }
}

/// `GET /api/charts`
pub async fn list_charts(
    state: web::Data<AppState>,
    params: web::Query<ChartListParams>,
) -> HttpResponse {
    let db = state.db.as_ref();
    let charts = match natal_database::list_charts(db, params.limit(), params.offset()).await {
        Ok(charts) => charts,
        Err(e) => return internal_error("Failed to list charts", e),
    };

    match natal_database::count_charts(db).await {
        Ok(total) => HttpResponse::Ok().json(ApiChartList { charts, total }),
        Err(e) => internal_error("Failed to count charts", e),
    }
}

/// `GET /api/charts/{id}`
pub async fn get_chart(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    match natal_database::fetch_chart(state.db.as_ref(), &id).await {
        Ok(Some(stored)) => HttpResponse::Ok().json(ApiChart::from(stored)),
        Ok(None) => HttpResponse::NotFound().json(ApiError::new(format!("Chart {id} not found"))),
        Err(e) => internal_error("Failed to load chart", e),
    }
}

/// `DELETE /api/charts/{id}`
pub async fn delete_chart(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    match natal_database::delete_chart(state.db.as_ref(), &id).await {
        Ok(true) => {
            log::info!("Deleted chart {id}");
            HttpResponse::NoContent().finish()
        }
        Ok(false) => {
            HttpResponse::NotFound().json(ApiError::new(format!("Chart {id} not found")))
        }
        Err(e) => internal_error("Failed to delete chart", e),
    }
}

// ---------------------------------------------------------------------------
// Forum
// ---------------------------------------------------------------------------

fn forum_error_response(e: &ForumError) -> HttpResponse {
    match e {
        ForumError::Validation(reason) => {
            HttpResponse::BadRequest().json(ApiError::new(reason.to_string()))
        }
        ForumError::NotFound { .. } => HttpResponse::NotFound().json(ApiError::new(e.to_string())),
        ForumError::Database(_) => internal_error("Forum query failed", e),
    }
}

/// `GET /api/forum/categories`
pub async fn list_categories(state: web::Data<AppState>) -> HttpResponse {
    match natal_forum::list_categories(state.db.as_ref()).await {
        Ok(categories) => HttpResponse::Ok().json(categories),
        Err(e) => forum_error_response(&e),
    }
}

/// `POST /api/forum/categories`
pub async fn create_category(
    state: web::Data<AppState>,
    body: web::Json<NewCategory>,
) -> HttpResponse {
    match natal_forum::create_category(state.db.as_ref(), &body).await {
        Ok(category) => HttpResponse::Created().json(category),
        Err(e) => forum_error_response(&e),
    }
}

/// `GET /api/forum/categories/{id}/topics`
pub async fn list_topics(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    match natal_forum::list_topics(state.db.as_ref(), path.into_inner()).await {
        Ok(topics) => HttpResponse::Ok().json(topics),
        Err(e) => forum_error_response(&e),
    }
}

/// `POST /api/forum/topics`
pub async fn create_topic(state: web::Data<AppState>, body: web::Json<NewTopic>) -> HttpResponse {
    match natal_forum::create_topic(state.db.as_ref(), &body).await {
        Ok(topic) => HttpResponse::Created().json(topic),
        Err(e) => forum_error_response(&e),
    }
}

/// `GET /api/forum/topics/{id}`
///
/// Returns the topic with all of its posts.
pub async fn get_topic(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    let db = state.db.as_ref();

    let topic = match natal_forum::get_topic(db, id).await {
        Ok(Some(topic)) => topic,
        Ok(None) => {
            return forum_error_response(&ForumError::NotFound { entity: "topic", id });
        }
        Err(e) => return forum_error_response(&e),
    };

    match natal_forum::list_posts(db, id).await {
        Ok(posts) => HttpResponse::Ok().json(ApiTopicDetail { topic, posts }),
        Err(e) => forum_error_response(&e),
    }
}

/// `POST /api/forum/topics/{id}/posts`
pub async fn create_post(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<NewPost>,
) -> HttpResponse {
    match natal_forum::create_post(state.db.as_ref(), path.into_inner(), &body).await {
        Ok(post) => HttpResponse::Created().json(post),
        Err(e) => forum_error_response(&e),
    }
}
