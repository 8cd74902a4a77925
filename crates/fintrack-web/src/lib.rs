//! HTTP server for fintrack
//!
//! Routes are organized into modules:
//! - routes::records: Dashboard, record forms and the JSON records API
//! - routes::auth: Sign-in page, sign-in and sign-out
//!
//! Everything except `/auth*` and `/api/health` sits behind the session
//! guard (see `session`).

pub mod error;
pub mod routes;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use fintrack_config::Config;
use fintrack_core::{IdentityRef, SessionRegistry};
use fintrack_utils::escape_html;
use tokio::net::TcpListener;

pub use error::ApiError;
pub use session::RecordsContext;

/// How often expired sessions are swept
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub identity: IdentityRef,
    pub config: Config,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::auth::{page_sign_in, sign_in, sign_out};
    use routes::records::{
        api_add_record, api_delete_record, api_records, api_reload, api_summary,
        api_update_record, form_add_record, form_delete_record, form_update_record,
        page_dashboard,
    };

    let pages = Router::new()
        .route("/", get(page_dashboard))
        .route("/dashboard", get(page_dashboard))
        .route("/records", post(form_add_record))
        .route("/records/:id/update", post(form_update_record))
        .route("/records/:id/delete", post(form_delete_record))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    let api = Router::new()
        .route("/api/records", get(api_records).post(api_add_record))
        .route("/api/records/reload", post(api_reload))
        .route("/api/records/:id", put(api_update_record).delete(api_delete_record))
        .route("/api/summary", get(api_summary))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session_api,
        ));

    Router::new()
        .route("/api/health", get(health_check))
        .route("/auth", get(page_sign_in).post(sign_in))
        .route("/auth/logout", post(sign_out))
        .merge(pages)
        .merge(api)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Fintrack</title>
    <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-gray-50 text-gray-900">
    {}
</body>
</html>"#,
        escape_html(title),
        content
    )
}

/// Top navigation bar for signed-in pages
pub fn nav_bar(current_path: &str, display_name: &str) -> String {
    let links = [("/", "Dashboard")];

    let mut nav = String::from(
        "<nav class='bg-white border-b'><div class='max-w-5xl mx-auto px-4 py-3 flex items-center gap-6'>\
         <h1 class='text-xl font-bold text-indigo-600'>Fintrack</h1><ul class='flex gap-2 flex-1'>",
    );
    for (path, label) in &links {
        let active_class = if current_path == *path || (*path == "/" && current_path == "/dashboard") {
            "bg-indigo-50 text-indigo-600"
        } else {
            "text-gray-600 hover:bg-gray-50"
        };
        nav.push_str(&format!(
            "<li><a href='{}' class='px-3 py-2 rounded-lg {}'>{}</a></li>",
            path, active_class, label
        ));
    }
    nav.push_str(&format!(
        "</ul><span class='text-sm text-gray-500'>{}</span>\
         <form method='post' action='/auth/logout'><button class='text-sm text-red-600'>Sign out</button></form>\
         </div></nav>",
        escape_html(display_name)
    ));
    nav
}

/// Full page for a signed-in user
pub fn page_response(title: &str, current_path: &str, display_name: &str, inner_content: &str) -> String {
    base_html(
        title,
        &format!(
            "{}<main class='max-w-5xl mx-auto p-6'>{}</main>",
            nav_bar(current_path, display_name),
            inner_content
        ),
    )
}

/// Start the HTTP server and run until Ctrl-C
pub async fn start_server(state: AppState) -> std::io::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);

    let registry = state.registry.clone();
    let purge = tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = registry.purge_expired();
            if purged > 0 {
                log::info!("Purged {} expired sessions", purged);
            }
        }
    });

    let router = create_router(state);
    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting fintrack on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - / (Dashboard)");
    log::info!("  - /auth (Sign in)");
    log::info!("  - /api/* (JSON API endpoints)");

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    purge.abort();
    match &result {
        Ok(_) => log::info!("Server stopped gracefully"),
        Err(e) => log::error!("Server error: {}", e),
    }
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
