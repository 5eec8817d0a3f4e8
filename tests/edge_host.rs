use bytes::Bytes;
use http::{Request, StatusCode};
use http_body_util::{BodyExt, Full};
use idfs_edge::{app, Config, EdgeHost, SecurityHeaders};

fn host(csp: Option<&str>) -> EdgeHost {
    let mut config = Config::default();
    config.server.contact_delay_ms = 0;
    config.edge.content_security_policy = csp.map(str::to_owned);
    app(&config)
}

fn request(method: &str, host: &str, uri: &str, body: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("host", host)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body.to_owned())))
        .unwrap()
}

async fn body_json(response: http::Response<Full<Bytes>>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn assert_security_headers(response: &http::Response<Full<Bytes>>) {
    for (name, value) in SecurityHeaders::BASELINE {
        assert_eq!(response.headers().get(name).unwrap(), value, "{name}");
    }
}

// --- viewer-request ---

#[tokio::test]
async fn apex_host_is_redirected_before_the_origin() {
    let resp = host(None)
        .handle(request("POST", "example.com", "/contact?src=nav", "{}"))
        .await;

    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        resp.headers().get("location").unwrap(),
        "https://www.example.com/contact?src=nav"
    );
    // Edge-generated: the viewer-response hook does not run.
    assert!(resp.headers().get("x-frame-options").is_none());
}

#[tokio::test]
async fn http2_authority_is_classified_too() {
    let req = Request::builder()
        .uri("https://example.com/healthz")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let resp = host(None).handle(req).await;
    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(resp.headers().get("location").unwrap(), "https://www.example.com/healthz");
}

#[tokio::test]
async fn request_without_host_reaches_the_origin() {
    let req = Request::builder()
        .uri("/healthz")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let resp = host(None).handle(req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_security_headers(&resp);
}

// --- origin + viewer-response ---

#[tokio::test]
async fn www_host_reaches_origin_and_gets_security_headers() {
    let resp = host(None)
        .handle(request("GET", "www.example.com", "/healthz", ""))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_security_headers(&resp);
    assert!(resp.headers().get("content-security-policy").is_none());
}

#[tokio::test]
async fn configured_csp_is_added() {
    let resp = host(Some(SecurityHeaders::SITE_CSP))
        .handle(request("GET", "www.example.com", "/readyz", ""))
        .await;
    assert_eq!(
        resp.headers().get("content-security-policy").unwrap(),
        SecurityHeaders::SITE_CSP
    );
}

#[tokio::test]
async fn unknown_route_is_404_with_security_headers() {
    let resp = host(None)
        .handle(request("GET", "www.example.com", "/nope", ""))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_security_headers(&resp);
}

#[tokio::test]
async fn contact_submission_round_trip() {
    let resp = host(None)
        .handle(request(
            "POST",
            "www.example.com",
            "/contact",
            r#"{"name":"Ada","email":"ada@example.com","message":"Hello","serviceType":"Cloud"}"#,
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
    assert_security_headers(&resp);
    assert_eq!(body_json(resp).await, serde_json::json!({ "ok": true }));
}

#[tokio::test]
async fn contact_validation_error_is_400() {
    let resp = host(None)
        .handle(request(
            "POST",
            "www.example.com",
            "/contact",
            r#"{"name":"","email":"ada@example.com","message":"Hello"}"#,
        ))
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await,
        serde_json::json!({ "ok": false, "error": "Name is required" })
    );
}

#[tokio::test]
async fn contact_preflight() {
    let resp = host(None)
        .handle(request("OPTIONS", "www.example.com", "/contact", ""))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("access-control-allow-methods").unwrap(),
        "POST, OPTIONS"
    );
    assert_eq!(body_json(resp).await, serde_json::json!({ "ok": true }));
}
