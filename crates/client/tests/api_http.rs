//! HTTP-level tests for [`GalleryApi`] against a one-shot local server.
//!
//! Each test binds an ephemeral port, answers exactly one request with a
//! canned response and hands the raw request text back for inspection.

use std::time::Duration;

use assert_matches::assert_matches;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use lumen_client::api::{ApiError, GalleryApi};
use lumen_client::wire::{SearchRequest, TagChangeRequest, UploadFile};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Serve one canned response; the handle resolves to the raw request.
async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (format!("http://{addr}"), handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if request_complete(&buf) {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn request_complete(buf: &[u8]) -> bool {
    let text = String::from_utf8_lossy(buf);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let headers = text[..header_end].to_ascii_lowercase();
    let body = &buf[header_end + 4..];
    if let Some(line) = headers.lines().find(|l| l.starts_with("content-length:")) {
        let len: usize = line["content-length:".len()..].trim().parse().unwrap();
        return body.len() >= len;
    }
    if headers.contains("transfer-encoding: chunked") {
        return body.ends_with(b"0\r\n\r\n");
    }
    true
}

fn api(url: &str) -> GalleryApi {
    GalleryApi::new(url, Duration::from_secs(5)).unwrap()
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_posts_query_and_parses_page() {
    let (url, server) = serve_once(
        200,
        r#"{"images":[{"id":"a","aspect_ratio":1.5,"tags":["sea"]}],"total":41,"has_more":true}"#,
    )
    .await;

    let request = SearchRequest {
        query: "beach".into(),
        page: 2,
        limit: 40,
    };
    let response = api(&url).search_images(&request).await.unwrap();
    assert_eq!(response.images.len(), 1);
    assert_eq!(response.images[0].id, "a");
    assert_eq!(response.total, Some(41));
    assert_eq!(response.has_more, Some(true));

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /api/images/search "));
    assert!(raw.contains(r#""query":"beach""#));
    assert!(raw.contains(r#""page":2"#));
    assert!(raw.contains(r#""limit":40"#));
}

#[tokio::test]
async fn unauthorized_maps_to_session_expired() {
    let (url, server) = serve_once(401, "{}").await;
    let request = SearchRequest {
        query: String::new(),
        page: 1,
        limit: 40,
    };
    let result = api(&url).search_images(&request).await;
    assert_matches!(result, Err(ApiError::SessionExpired));
    server.await.unwrap();
}

#[tokio::test]
async fn server_error_keeps_status_and_body() {
    let (url, server) = serve_once(503, r#"{"error":"busy"}"#).await;
    let result = api(&url).list_images().await;
    assert_matches!(result, Err(ApiError::Api { status: 503, ref body }) if body.contains("busy"));
    server.await.unwrap();
}

#[tokio::test]
async fn legacy_listing_accepts_bare_ids() {
    let (url, server) = serve_once(200, r#"["x","y"]"#).await;
    let images = api(&url).list_images().await.unwrap();
    let ids: Vec<&str> = images.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["x", "y"]);
    let raw = server.await.unwrap();
    assert!(raw.starts_with("GET /api/images "));
}

// ---------------------------------------------------------------------------
// Upload & tags
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_sends_multipart_fields() {
    let (url, server) = serve_once(201, "").await;
    let file = UploadFile::new("beach.jpg", b"JPEGDATA".to_vec(), 1_700_000_000_000);
    api(&url).upload_image(&file).await.unwrap();

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /api/images "));
    assert!(raw.to_ascii_lowercase().contains("content-type: multipart/form-data"));
    assert!(raw.contains(r#"name="filename""#));
    assert!(raw.contains(r#"name="data""#));
    assert!(raw.contains(r#"name="last_modified""#));
    assert!(raw.contains("1700000000000"));
    assert!(raw.contains("JPEGDATA"));
}

#[tokio::test]
async fn upload_from_disk_reads_file_when_sent() {
    let dir = std::env::temp_dir().join(format!("lumen-http-upload-{}", std::process::id()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let path = dir.join("dune.jpg");
    tokio::fs::write(&path, b"QUEUEDBYTES").await.unwrap();

    let file = UploadFile::from_path(&path).await.unwrap();
    tokio::fs::write(&path, b"SENTBYTES").await.unwrap();

    let (url, server) = serve_once(201, "").await;
    api(&url).upload_image(&file).await.unwrap();

    let raw = server.await.unwrap();
    assert!(raw.contains(r#"filename="dune.jpg""#));
    assert!(raw.contains("SENTBYTES"));
    assert!(!raw.contains("QUEUEDBYTES"));

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn upload_of_unreadable_file_sends_nothing() {
    let dir = std::env::temp_dir().join(format!("lumen-http-gone-{}", std::process::id()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let path = dir.join("gone.jpg");
    tokio::fs::write(&path, b"x").await.unwrap();
    let file = UploadFile::from_path(&path).await.unwrap();
    tokio::fs::remove_dir_all(&dir).await.unwrap();

    // Port 9 is never listening; the read must fail first.
    let result = api("http://127.0.0.1:9").upload_image(&file).await;
    assert_matches!(result, Err(ApiError::Io(_)));
}

#[tokio::test]
async fn remove_tags_uses_delete() {
    let (url, server) = serve_once(200, "").await;
    let body = TagChangeRequest {
        image_ids: vec!["a".into(), "b".into()],
        tags: vec!["sea".into()],
    };
    api(&url).remove_tags(&body).await.unwrap();

    let raw = server.await.unwrap();
    assert!(raw.starts_with("DELETE /api/tags "));
    assert!(raw.contains(r#""image_ids":["a","b"]"#));
}

#[tokio::test]
async fn add_tags_unauthorized() {
    let (url, server) = serve_once(401, "").await;
    let body = TagChangeRequest {
        image_ids: vec!["a".into()],
        tags: vec!["sea".into()],
    };
    let result = api(&url).add_tags(&body).await;
    assert_matches!(result, Err(ApiError::SessionExpired));
    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /api/tags "));
}
