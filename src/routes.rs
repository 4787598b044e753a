use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::error::ProxyError;
use crate::proxy::FeedProxy;

pub const SERVICE_BANNER: &str = "RSS proxy server is running";

pub struct AppState {
    pub proxy: FeedProxy,
}

pub fn router(state: Arc<AppState>, static_dir: &str) -> Router {
    Router::new()
        .route("/api/rss", get(rss))
        .route("/health", get(health))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Deserialize)]
pub struct RssQuery {
    pub url: Option<String>,
}

pub async fn rss(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RssQuery>,
) -> Result<impl IntoResponse, ProxyError> {
    let body = state.proxy.fetch_feed(query.url.as_deref()).await?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], body))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthBody {
    pub status: String,
    pub message: String,
}

pub async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok".to_string(),
        message: SERVICE_BANNER.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_app() -> Router {
        let state = Arc::new(AppState {
            proxy: FeedProxy::new().unwrap(),
        });
        router(state, "static")
    }

    async fn get_uri(app: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, body.to_vec())
    }

    fn encode(url: &str) -> String {
        serde_urlencoded::to_string([("url", url)]).unwrap()
    }

    mod health_tests {
        use super::*;

        #[tokio::test]
        async fn test_health_endpoint() {
            let (status, content_type, body) = get_uri(create_test_app(), "/health").await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(content_type.as_deref(), Some("application/json"));

            let health: HealthBody = serde_json::from_slice(&body).unwrap();
            assert_eq!(health.status, "ok");
            assert_eq!(health.message, SERVICE_BANNER);
        }
    }

    mod rss_tests {
        use super::*;

        #[tokio::test]
        async fn test_missing_url_parameter() {
            let (status, _, body) = get_uri(create_test_app(), "/api/rss").await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["error"], "BadRequest");
            assert_eq!(json["message"], "Missing required query parameter: url");
            assert!(json.get("statusCode").is_none());
        }

        #[tokio::test]
        async fn test_blank_url_parameter() {
            let (status, _, _) = get_uri(create_test_app(), "/api/rss?url=%20%20").await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        #[tokio::test]
        async fn test_invalid_url_parameter() {
            let uri = format!("/api/rss?{}", encode("not a url"));
            let (status, _, body) = get_uri(create_test_app(), &uri).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["message"], "Invalid URL format");
        }

        #[tokio::test]
        async fn test_success_is_served_as_xml() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .insert_header("content-type", "text/plain")
                        .set_body_string("<rss/>"),
                )
                .mount(&server)
                .await;

            let uri = format!("/api/rss?{}", encode(&server.uri()));
            let (status, content_type, body) = get_uri(create_test_app(), &uri).await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(content_type.as_deref(), Some("application/xml"));
            assert_eq!(body, b"<rss/>");
        }

        #[tokio::test]
        async fn test_upstream_status_is_passed_through() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(403))
                .mount(&server)
                .await;

            let uri = format!("/api/rss?{}", encode(&server.uri()));
            let (status, _, body) = get_uri(create_test_app(), &uri).await;

            assert_eq!(status, StatusCode::FORBIDDEN);
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["error"], "UpstreamError");
            assert_eq!(json["message"], "Unable to fetch RSS feed: Forbidden");
            assert_eq!(json["statusCode"], 403);
        }

        #[tokio::test]
        async fn test_unsupported_scheme_is_internal_error() {
            let uri = format!("/api/rss?{}", encode("ftp://example.com/feed.xml"));
            let (status, _, body) = get_uri(create_test_app(), &uri).await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["error"], "Internal");
        }
    }

    mod static_file_tests {
        use super::*;
        use tempfile::TempDir;

        fn app_serving(dir: &TempDir) -> Router {
            let state = Arc::new(AppState {
                proxy: FeedProxy::new().unwrap(),
            });
            router(state, dir.path().to_str().unwrap())
        }

        #[tokio::test]
        async fn test_files_served_from_static_dir() {
            let dir = TempDir::new().unwrap();
            std::fs::write(dir.path().join("index.html"), "<h1>viewer</h1>").unwrap();

            let (status, _, body) = get_uri(app_serving(&dir), "/index.html").await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, b"<h1>viewer</h1>");
        }

        #[tokio::test]
        async fn test_api_routes_win_over_static_files() {
            let dir = TempDir::new().unwrap();
            std::fs::write(dir.path().join("health"), "static").unwrap();

            let (status, content_type, _) = get_uri(app_serving(&dir), "/health").await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(content_type.as_deref(), Some("application/json"));
        }

        #[tokio::test]
        async fn test_missing_static_dir_only_affects_assets() {
            let dir = TempDir::new().unwrap();
            let missing = dir.path().join("not-deployed");
            let state = Arc::new(AppState {
                proxy: FeedProxy::new().unwrap(),
            });
            let app = router(state, missing.to_str().unwrap());

            let (status, _, _) = get_uri(app.clone(), "/index.html").await;
            assert_eq!(status, StatusCode::NOT_FOUND);

            let (status, _, _) = get_uri(app, "/health").await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    mod rss_query_tests {
        use super::*;

        #[test]
        fn test_rss_query_without_url() {
            let query: RssQuery = serde_urlencoded::from_str("").unwrap();
            assert_eq!(query.url, None);
        }

        #[test]
        fn test_rss_query_decodes_url() {
            let query: RssQuery =
                serde_urlencoded::from_str("url=https%3A%2F%2Fexample.com%2Frss%3Fa%3D1").unwrap();
            assert_eq!(query.url.as_deref(), Some("https://example.com/rss?a=1"));
        }
    }
}
