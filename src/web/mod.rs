//! The two HTTP front-ends: class timetables and exam timetables.

pub mod auth;
pub mod class_api;
pub mod error;
pub mod exam_api;
pub mod pages;
pub mod state;

use crate::config::server_config::ServerConfig;
use crate::utils::error::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use state::{ClassState, ExamState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn class_router(state: Arc<ClassState>, body_limit: usize) -> Router {
    let api_routes = Router::new()
        .route("/health", get(class_api::health))
        .route("/upload", post(class_api::upload))
        .route("/courses", get(class_api::courses))
        .route("/electives", get(class_api::electives))
        .route("/config", get(class_api::get_config).post(class_api::update_config))
        .route("/generate", post(class_api::generate))
        .route("/outputs", get(class_api::outputs))
        .route("/download/all", get(class_api::download_all))
        .route("/download/{filename}", get(class_api::download))
        .route("/download/teacher/{name}", get(class_api::download_teacher))
        .route("/teachers", get(class_api::teachers));

    Router::new()
        .route("/", get(class_api::index))
        .route("/timetable/{section}", get(class_api::section_page))
        .route("/teacher/{name}", get(class_api::teacher_page))
        .route("/free-rooms", get(class_api::free_rooms_page))
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub fn exam_router(state: Arc<ExamState>, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(exam_api::upload_form).post(exam_api::generate_calendar))
        .route("/login", get(exam_api::login_page).post(exam_api::login))
        .route("/logout", get(exam_api::logout))
        .route("/public", get(exam_api::public_page))
        .route("/view", get(exam_api::view))
        .route("/download", get(exam_api::download))
        .route("/health", get(exam_api::health))
        .route("/api/update_cell", post(exam_api::update_cell))
        .route("/api/get_sheet_data/{sheet}", get(exam_api::sheet_data))
        .route("/seating/generate", post(exam_api::seating_generate))
        .route("/seating/view", get(exam_api::seating_view))
        .route("/seating/download/{filename}", get(exam_api::seating_download))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs both servers until Ctrl-C.
pub async fn serve(config: ServerConfig, monitor: bool) -> Result<()> {
    for dir in [
        &config.paths.class_inputs,
        &config.paths.class_outputs,
        &config.paths.exam_workdir,
        &config.paths.seating_workdir,
    ] {
        tokio::fs::create_dir_all(dir).await?;
    }
    config.warn_on_default_credentials();

    let class_state = ClassState::new(&config, monitor).await?;
    let exam_state = ExamState::new(&config, monitor).await?;

    let host = &config.server.host;
    let class_listener = TcpListener::bind((host.as_str(), config.server.class_port)).await?;
    let exam_listener = TcpListener::bind((host.as_str(), config.server.exam_port)).await?;
    tracing::info!("🌐 Class timetable server on http://{}", class_listener.local_addr()?);
    tracing::info!("🌐 Exam timetable server on http://{}", exam_listener.local_addr()?);

    let class = axum::serve(class_listener, class_router(class_state, config.class_body_limit()))
        .with_graceful_shutdown(shutdown_signal("class"));
    let exam = axum::serve(exam_listener, exam_router(exam_state, config.exam_body_limit()))
        .with_graceful_shutdown(shutdown_signal("exam"));

    tokio::try_join!(async move { class.await }, async move { exam.await })?;
    tracing::info!("👋 Servers stopped");
    Ok(())
}

async fn shutdown_signal(server: &'static str) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Shutting down {} server", server);
}

/// Keeps only the final path segment and characters safe in a file name.
pub fn secure_file_name(raw: &str) -> Option<String> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = last
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}

pub fn attachment(file_name: &str, body: Vec<u8>) -> Response {
    let content_type = match file_name.rsplit('.').next().map(|e| e.to_ascii_lowercase()) {
        Some(ext) if ext == "csv" => "text/csv; charset=utf-8",
        Some(ext) if ext == "json" => "application/json",
        Some(ext) if ext == "zip" => "application/zip",
        _ => "application/octet-stream",
    };
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_file_name() {
        assert_eq!(secure_file_name("year 1.csv"), Some("year_1.csv".to_string()));
        assert_eq!(secure_file_name("../../etc/passwd"), Some("passwd".to_string()));
        assert_eq!(secure_file_name("C:\\data\\rooms.csv"), Some("rooms.csv".to_string()));
        assert_eq!(secure_file_name(".."), None);
        assert_eq!(secure_file_name(""), None);
    }
}
