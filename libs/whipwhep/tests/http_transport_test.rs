// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// HyperTransport against a local axum WHIP stub

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use whipwhep::core::{SignalingTransport, SDP_CONTENT_TYPE};
use whipwhep::{HyperTransport, RtcError};

const ANSWER: &str = "v=0\r\na=ice-ufrag:server1\r\n";

async fn whip(headers: HeaderMap, body: String) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type != SDP_CONTENT_TYPE {
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, "expected application/sdp").into_response();
    }
    if !body.contains("a=ice-ufrag:") {
        return (StatusCode::BAD_REQUEST, "offer has no ufrag").into_response();
    }
    (
        StatusCode::CREATED,
        [(header::LOCATION, "/rtc/v1/whip/session/1")],
        ANSWER,
    )
        .into_response()
}

async fn moved() -> impl IntoResponse {
    (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, "/rtc/v1/whip/")])
}

async fn looping() -> impl IntoResponse {
    (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, "/loop/whip/")])
}

async fn rejecting() -> impl IntoResponse {
    (StatusCode::BAD_REQUEST, "stream already publishing")
}

async fn authenticated(headers: HeaderMap) -> impl IntoResponse {
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some("Bearer secret") => (StatusCode::OK, ANSWER).into_response(),
        _ => (StatusCode::UNAUTHORIZED, "missing token").into_response(),
    }
}

/// Serves the stub on an ephemeral port and returns its base URL.
async fn spawn_server() -> String {
    let app = Router::new()
        .route("/rtc/v1/whip/", post(whip))
        .route("/old/whip/", post(moved))
        .route("/loop/whip/", post(looping))
        .route("/busy/whip/", post(rejecting))
        .route("/auth/whip/", post(authenticated));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn offer() -> &'static str {
    "v=0\r\na=ice-ufrag:client1\r\n"
}

#[tokio::test]
async fn test_created_answer_is_returned() {
    let base = spawn_server().await;
    let transport = HyperTransport::new(None).unwrap();

    let answer = transport
        .post(&format!("{}/rtc/v1/whip/", base), offer(), SDP_CONTENT_TYPE)
        .await
        .unwrap();

    assert_eq!(answer, ANSWER);
}

#[tokio::test]
async fn test_wrong_content_type_surfaces_status() {
    let base = spawn_server().await;
    let transport = HyperTransport::new(None).unwrap();

    let result = transport
        .post(&format!("{}/rtc/v1/whip/", base), offer(), "text/plain")
        .await;

    assert!(matches!(
        result,
        Err(RtcError::NegotiationHttp { status: Some(415), .. })
    ));
}

#[tokio::test]
async fn test_temporary_redirect_is_followed() {
    let base = spawn_server().await;
    let transport = HyperTransport::new(None).unwrap();

    let answer = transport
        .post(&format!("{}/old/whip/", base), offer(), SDP_CONTENT_TYPE)
        .await
        .unwrap();

    assert_eq!(answer, ANSWER);
}

#[tokio::test]
async fn test_redirect_loop_gives_up() {
    let base = spawn_server().await;
    let transport = HyperTransport::new(None).unwrap();

    let result = transport
        .post(&format!("{}/loop/whip/", base), offer(), SDP_CONTENT_TYPE)
        .await;

    assert!(matches!(
        result,
        Err(RtcError::NegotiationHttp { status: Some(307), .. })
    ));
}

#[tokio::test]
async fn test_error_status_carries_body() {
    let base = spawn_server().await;
    let transport = HyperTransport::new(None).unwrap();

    let result = transport
        .post(&format!("{}/busy/whip/", base), offer(), SDP_CONTENT_TYPE)
        .await;

    match result {
        Err(RtcError::NegotiationHttp { status, message }) => {
            assert_eq!(status, Some(400));
            assert_eq!(message, "stream already publishing");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let base = spawn_server().await;
    let url = format!("{}/auth/whip/", base);

    let anonymous = HyperTransport::new(None).unwrap();
    assert!(matches!(
        anonymous.post(&url, offer(), SDP_CONTENT_TYPE).await,
        Err(RtcError::NegotiationHttp { status: Some(401), .. })
    ));

    let authorized = HyperTransport::new(Some("secret".into())).unwrap();
    assert_eq!(
        authorized.post(&url, offer(), SDP_CONTENT_TYPE).await.unwrap(),
        ANSWER
    );
}

#[tokio::test]
async fn test_connection_refused_has_no_status() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = HyperTransport::new(None).unwrap();
    let result = transport
        .post(&format!("http://{}/rtc/v1/whip/", addr), offer(), SDP_CONTENT_TYPE)
        .await;

    assert!(matches!(
        result,
        Err(RtcError::NegotiationHttp { status: None, .. })
    ));
}
