//! One-shot listener for the OAuth redirect
//!
//! Binds the host/port of the configured redirect URI, serves its path until
//! the authorization server sends the browser back with `?code=..` (or
//! `?error=..`), then shuts down.

use actix_web::{web, App, HttpResponse, HttpServer};
use parking_lot::Mutex;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info};

use super::AuthError;

const SUCCESS_PAGE: &str = "<html><body><h1>Authorization complete</h1>\
     <p>You can close this window and return to spoty.</p>\
     <script>window.close()</script></body></html>";

type PendingCode = Mutex<Option<oneshot::Sender<Result<String, String>>>>;

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn handle_callback(
    query: web::Query<CallbackQuery>,
    pending: web::Data<PendingCode>,
) -> HttpResponse {
    let query = query.into_inner();
    let outcome = match (query.code, query.error) {
        (_, Some(error)) => Err(query.error_description.unwrap_or(error)),
        (Some(code), None) if !code.is_empty() => Ok(code),
        _ => Err("no code in callback".to_string()),
    };

    let response = match &outcome {
        Ok(_) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(SUCCESS_PAGE),
        Err(reason) => HttpResponse::BadRequest().body(format!("Authorization failed: {reason}")),
    };

    if let Some(sender) = pending.lock().take() {
        let _ = sender.send(outcome);
    }

    response
}

/// Host, port and path the redirect URI points at
fn listen_target(redirect_uri: &str) -> Result<(String, u16, String), AuthError> {
    let url = Url::parse(redirect_uri)
        .map_err(|e| AuthError::InvalidConfig(format!("bad redirect uri {redirect_uri}: {e}")))?;

    let host = url
        .host_str()
        .ok_or_else(|| AuthError::InvalidConfig(format!("redirect uri has no host: {redirect_uri}")))?
        .to_string();
    let port = url
        .port_or_known_default()
        .ok_or_else(|| AuthError::InvalidConfig(format!("redirect uri has no port: {redirect_uri}")))?;
    let path = match url.path() {
        "" => "/".to_string(),
        p => p.to_string(),
    };

    Ok((host, port, path))
}

/// Serve the redirect URI until a code arrives or `timeout` elapses
pub async fn wait_for_code(redirect_uri: &str, timeout: Duration) -> Result<String, AuthError> {
    let (host, port, path) = listen_target(redirect_uri)?;

    let (tx, rx) = oneshot::channel::<Result<String, String>>();
    let pending: web::Data<PendingCode> = web::Data::new(Mutex::new(Some(tx)));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(pending.clone())
            .route(&path, web::get().to(handle_callback))
    })
    .workers(1)
    .shutdown_timeout(1)
    .disable_signals()
    .bind((host.as_str(), port))
    .map_err(|e| AuthError::Server(format!("failed to bind {host}:{port}: {e}")))?
    .run();

    let handle = server.handle();
    let server_task = tokio::spawn(server);

    info!("Waiting for authorization callback on {}:{}", host, port);

    let outcome = tokio::time::timeout(timeout, rx).await;

    handle.stop(true).await;
    if let Err(e) = server_task.await {
        debug!("Callback server task ended abnormally: {}", e);
    }

    outcome
        .map_err(|_| AuthError::Timeout)?
        .map_err(|_| AuthError::Server("callback channel closed".to_string()))?
        .map_err(AuthError::Denied)
}
