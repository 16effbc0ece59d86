//! Integration tests for the blocking `download` entry point.
//!
//! Mock servers run on the tokio test runtime; every `download` call runs
//! inside `spawn_blocking` so the blocking client never touches it.

mod support;

use fetcher_core::{DownloadError, PostDataType, Request, ViewState, download, must_parse_url};
use scraper::Selector;
use serde_json::Value;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::socket_guard::{closed_local_addr, start_mock_server_or_skip};
use support::{init_tracing, run_blocking};

async fn setup() -> Option<MockServer> {
    init_tracing();
    start_mock_server_or_skip().await
}

fn get(url: &str) -> Request {
    let mut request = Request::new();
    request.set_url(must_parse_url(url));
    request
}

#[tokio::test]
async fn test_download_json_body_populates_all_views() {
    let Some(server) = setup().await else { return };
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"a":1,"tags":["x","y"]}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/api", server.uri());
    run_blocking(move || {
        let request = get(&url);
        let response = download(&request).expect("download should succeed");

        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.json_state(), ViewState::Parsed);
        assert_eq!(response.json()["a"], Value::from(1));
        assert_eq!(response.json()["tags"][1], Value::from("y"));
        assert_eq!(response.text().as_bytes(), response.body());
        assert_eq!(response.url(), &request.url);
        assert_eq!(response.headers()["content-type"], "application/json");
    })
    .await;
}

#[tokio::test]
async fn test_download_html_body_parses_markup_and_leaves_json_empty() {
    let Some(server) = setup().await else { return };
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("<html><body><p>hi</p></body></html>"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/page", server.uri());
    run_blocking(move || {
        let request = get(&url);
        let response = download(&request).expect("non-JSON body must not be an error");

        let selector = Selector::parse("p").expect("selector");
        let text: String = response
            .html()
            .select(&selector)
            .flat_map(|p| p.text())
            .collect();
        assert_eq!(text, "hi");
        assert!(response.json().is_empty());
        assert_eq!(response.json_state(), ViewState::Malformed);
    })
    .await;
}

#[tokio::test]
async fn test_download_empty_body_gives_queryable_document() {
    let Some(server) = setup().await else { return };
    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let url = format!("{}/empty", server.uri());
    run_blocking(move || {
        let request = get(&url);
        let response = download(&request).expect("empty body must not be an error");

        assert_eq!(response.status().as_u16(), 204);
        assert!(response.body().is_empty());
        assert_eq!(response.text(), "");
        assert!(response.json().is_empty());
        assert_eq!(response.json_state(), ViewState::Empty);
        let selector = Selector::parse("div").expect("selector");
        assert_eq!(response.html().select(&selector).count(), 0);
    })
    .await;
}

#[tokio::test]
async fn test_download_error_status_is_not_an_error() {
    let Some(server) = setup().await else { return };
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let base = server.uri();
    run_blocking(move || {
        let not_found = get(&format!("{base}/missing"));
        let response = download(&not_found).expect("404 is a response");
        assert_eq!(response.status().as_u16(), 404);
        assert_eq!(response.text(), "missing");

        let broken = get(&format!("{base}/broken"));
        let response = download(&broken).expect("500 is a response");
        assert_eq!(response.status().as_u16(), 500);
        assert_eq!(response.text(), "boom");
    })
    .await;
}

#[tokio::test]
async fn test_set_header_twice_sends_single_value() {
    let Some(server) = setup().await else { return };
    Mock::given(method("GET"))
        .and(path("/headers"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let url = format!("{}/headers", server.uri());
    run_blocking(move || {
        let mut request = get(&url);
        request.set_header("X", "1").set_header("X", "2");
        download(&request).expect("download should succeed");
    })
    .await;

    let received = server.received_requests().await.expect("recording enabled");
    assert_eq!(received.len(), 1);
    let values: Vec<_> = received[0]
        .headers
        .get_all("x")
        .iter()
        .map(|v| v.to_str().expect("ascii").to_string())
        .collect();
    assert_eq!(values, vec!["2".to_string()]);
}

#[tokio::test]
async fn test_cookies_are_sent_in_order_in_one_header() {
    let Some(server) = setup().await else { return };
    Mock::given(method("GET"))
        .and(path("/cookies"))
        .and(header("cookie", "a=1; b=2; a=3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let url = format!("{}/cookies", server.uri());
    run_blocking(move || {
        let mut request = get(&url);
        request
            .add_cookie("a", "1")
            .add_cookie("b", "2")
            .add_cookie("a", "3");
        let response = download(&request).expect("download should succeed");
        assert_eq!(response.status().as_u16(), 200, "cookie header did not match");
    })
    .await;
}

#[tokio::test]
async fn test_post_body_and_content_type_reach_the_server() {
    let Some(server) = setup().await else { return };
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("q=rust&page=2"))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"created":true}"#))
        .mount(&server)
        .await;

    let url = format!("{}/submit", server.uri());
    run_blocking(move || {
        let mut request = get(&url);
        request
            .set_method("POST")
            .set_post_data(PostDataType::UrlEncoded, b"q=rust&page=2".to_vec());
        let response = download(&request).expect("download should succeed");

        assert_eq!(response.status().as_u16(), 201);
        assert_eq!(response.json()["created"], Value::Bool(true));
        assert_eq!(response.request().method, "POST");
    })
    .await;
}

#[tokio::test]
async fn test_default_user_agent_is_sent_unless_overridden() {
    let Some(server) = setup().await else { return };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let base = server.uri();
    run_blocking(move || {
        download(&get(&format!("{base}/default"))).expect("default UA request");

        let mut custom = get(&format!("{base}/custom"));
        custom.set_header("User-Agent", "custom-agent/1.0");
        download(&custom).expect("custom UA request");
    })
    .await;

    let received = server.received_requests().await.expect("recording enabled");
    let ua_for = |p: &str| {
        received
            .iter()
            .find(|r| r.url.path() == p)
            .and_then(|r| r.headers.get("user-agent"))
            .map(|v| v.to_str().expect("ascii").to_string())
            .expect("user agent present")
    };
    assert!(ua_for("/default").starts_with("fetcher/"));
    assert_eq!(ua_for("/custom"), "custom-agent/1.0");
}

#[tokio::test]
async fn test_redirect_is_followed_and_recorded_in_reply_info() {
    let Some(server) = setup().await else { return };
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
        .mount(&server)
        .await;

    let url = format!("{}/old", server.uri());
    run_blocking(move || {
        let request = get(&url);
        let response = download(&request).expect("download should succeed");

        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.text(), "moved here");
        assert_eq!(response.url().path(), "/old");
        assert_eq!(response.reply().final_url.path(), "/new");
        assert!(response.reply().remote_addr.is_some());
    })
    .await;
}

#[tokio::test]
async fn test_request_is_routed_through_proxy() {
    let Some(proxy) = setup().await else { return };
    Mock::given(method("GET"))
        .and(path("/via-proxy"))
        .respond_with(ResponseTemplate::new(200).set_body_string("from proxy"))
        .mount(&proxy)
        .await;

    let proxy_uri = proxy.uri();
    run_blocking(move || {
        let mut request = get("http://target.invalid/via-proxy");
        request.with_proxy(proxy_uri);
        let response = download(&request).expect("proxied download should succeed");

        assert_eq!(response.text(), "from proxy");
        assert_eq!(response.url().host_str(), Some("target.invalid"));
    })
    .await;

    assert_eq!(proxy.received_requests().await.expect("recording").len(), 1);
}

#[tokio::test]
async fn test_unreachable_proxy_fails_before_reaching_target() {
    let Some(server) = setup().await else { return };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let url = format!("{}/target", server.uri());
    let dead_proxy = closed_local_addr();
    run_blocking(move || {
        let mut request = get(&url);
        request.with_proxy(dead_proxy);
        let error = download(&request).expect_err("proxy is unreachable");

        let http = error.as_http().expect("transport error");
        assert_eq!(http.request().url, request.url);
        assert!(!error.is_construction());
    })
    .await;

    assert!(server.received_requests().await.expect("recording").is_empty());
}

#[tokio::test]
async fn test_malformed_proxy_is_a_construction_error() {
    let Some(server) = setup().await else { return };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let url = format!("{}/target", server.uri());
    run_blocking(move || {
        let mut request = get(&url);
        request.with_proxy("not a proxy url");
        let error = download(&request).expect_err("proxy string is malformed");

        assert!(matches!(error, DownloadError::InvalidProxy { .. }));
        assert!(error.is_construction());
    })
    .await;

    assert!(server.received_requests().await.expect("recording").is_empty());
}

#[tokio::test]
async fn test_connection_refused_is_wrapped_with_request() {
    init_tracing();
    let url = format!("{}/nothing-here", closed_local_addr());
    run_blocking(move || {
        let mut request = get(&url);
        request.set_header("X-Trace", "refused");
        let error = download(&request).expect_err("nothing is listening");

        let DownloadError::Http(http) = &error else {
            panic!("expected transport error, got {error:?}");
        };
        assert!(http.is_connect());
        assert!(!http.is_timeout());
        assert_eq!(http.request().headers["x-trace"], "refused");
        assert!(std::error::Error::source(http).is_some());
    })
    .await;
}

#[tokio::test]
async fn test_construction_errors_send_nothing() {
    let Some(server) = setup().await else { return };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let url = format!("{}/x", server.uri());
    run_blocking(move || {
        let mut bad_method = get(&url);
        bad_method.set_method("GE T");
        assert!(matches!(
            download(&bad_method),
            Err(DownloadError::InvalidMethod { .. })
        ));

        let mut bad_header = get(&url);
        bad_header.set_header("bad header", "v");
        assert!(matches!(
            download(&bad_header),
            Err(DownloadError::InvalidHeader { .. })
        ));

        assert!(matches!(
            download(&Request::new()),
            Err(DownloadError::InvalidUrl { .. })
        ));
    })
    .await;

    assert!(server.received_requests().await.expect("recording").is_empty());
}

#[tokio::test]
async fn test_concurrent_downloads_share_client_without_cross_talk() {
    let Some(server) = setup().await else { return };
    for i in 0..8 {
        Mock::given(method("GET"))
            .and(path(format!("/item/{i}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Item", i.to_string())
                    .set_body_string(format!(r#"{{"id":{i}}}"#)),
            )
            .mount(&server)
            .await;
    }

    let base = server.uri();
    run_blocking(move || {
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let base = &base;
                    scope.spawn(move || {
                        let request = get(&format!("{base}/item/{i}"));
                        let response = download(&request).expect("download should succeed");
                        (
                            i,
                            response.json()["id"].as_u64(),
                            response.headers()["x-item"].to_str().ok().map(str::to_string),
                        )
                    })
                })
                .collect();

            for handle in handles {
                let (i, id, header) = handle.join().expect("worker panicked");
                assert_eq!(id, Some(i));
                assert_eq!(header, Some(i.to_string()));
            }
        });
    })
    .await;
}
