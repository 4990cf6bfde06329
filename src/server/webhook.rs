//! Webhook Handlers
//!
//! Call-script documents and the provider callbacks.

use super::AppState;
use crate::config::Config;
use crate::voice::{
    RecordOptions, ResponseOptions, SayOptions, TwimlError, Verb, SIGNATURE_HEADER,
};
use axum::{
    extract::{Form, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Form field carrying the transcription
pub const TRANSCRIPTION_TEXT_FIELD: &str = "TranscriptionText";

/// Record verb that sends the recording to the transcription callback
fn transcribing_record(config: &Config) -> Verb {
    Verb::record(RecordOptions {
        max_length: Some(config.call.max_length),
        timeout: Some(config.call.timeout),
        transcribe: Some(true),
        transcribe_callback: Some(config.transcription_url()),
        play_beep: Some(config.call.play_beep),
        ..Default::default()
    })
}

/// Script for an answered call: greet, then record with transcription
pub fn call_script(config: &Config) -> Result<Verb, TwimlError> {
    let mut response = Verb::response(ResponseOptions::default());
    if !config.call.greeting.is_empty() {
        response.add_say(config.call.greeting.clone(), SayOptions::default())?;
    }
    response.append(transcribing_record(config))?;
    Ok(response)
}

/// Script returned after a transcription arrives: keep recording
pub fn record_script(config: &Config) -> Result<Verb, TwimlError> {
    let mut response = Verb::response(ResponseOptions::default());
    response.append(transcribing_record(config))?;
    Ok(response)
}

/// Script that ends the call
pub fn hangup_script() -> Result<Verb, TwimlError> {
    let mut response = Verb::response(ResponseOptions::default());
    response.add_hangup()?;
    Ok(response)
}

fn xml(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/xml")], body).into_response()
}

fn document(script: Result<Verb, TwimlError>) -> Result<Response, StatusCode> {
    match script {
        Ok(verb) => Ok(xml(StatusCode::OK, verb.to_document())),
        Err(e) => {
            error!(error = %e, "Failed to build call script");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Health check
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Serve the call script
pub async fn call_script_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    document(call_script(&state.config))
}

/// Serve the hangup document
pub async fn hangup_handler() -> Result<Response, StatusCode> {
    document(hangup_script())
}

/// Place a call to the default callee, returning the API response
pub async fn place_call_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let config = &state.config;
    if config.call.default_callee.is_empty() {
        warn!("No default callee configured");
        return Err(StatusCode::BAD_REQUEST);
    }

    match state
        .account
        .place_call(
            &config.account.caller_id,
            &config.call.default_callee,
            &config.call_script_url(),
        )
        .await
    {
        Ok(body) => Ok(xml(StatusCode::OK, body)),
        Err(e) => {
            error!(error = %e, "Failed to place call");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

/// Check the provider signature on an inbound webhook
fn verify_request(
    state: &AppState,
    uri: &Uri,
    headers: &HeaderMap,
    params: &[(String, String)],
) -> Result<(), StatusCode> {
    if !state.config.server.verify_signatures {
        return Ok(());
    }

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("Webhook missing signature header");
            StatusCode::FORBIDDEN
        })?;

    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let url = state.config.server.public_endpoint(path);
    match state.validator.validate(&url, params, signature) {
        Ok(true) => Ok(()),
        Ok(false) => {
            warn!(url = %url, "Webhook signature rejected");
            Err(StatusCode::FORBIDDEN)
        }
        Err(e) => {
            warn!(error = %e, "Webhook request malformed");
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

/// Transcription callback: relay the text to the room and keep recording
pub async fn transcription_handler(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
    Form(params): Form<Vec<(String, String)>>,
) -> Result<Response, StatusCode> {
    verify_request(&state, &uri, &headers, &params)?;

    let text = params
        .iter()
        .find(|(k, _)| k == TRANSCRIPTION_TEXT_FIELD)
        .map(|(_, v)| v.as_str())
        .unwrap_or_default();

    if text.is_empty() {
        info!("Transcription callback without text");
    } else if let Err(e) = state.notifier.notify(text).await {
        error!(error = %e, "Failed to relay transcription");
        return Err(StatusCode::BAD_GATEWAY);
    }

    document(record_script(&state.config))
}
