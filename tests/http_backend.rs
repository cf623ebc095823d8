//! Backend client against a local fake of the meme API.

#![cfg(feature = "api")]

use memegen::api::MemeBackend;
use memegen::editor::MemeEditor;
use memegen::gallery::Gallery;
use memegen::http::HttpBackend;
use memegen::upload::UploadFile;
use memegen::{Error, MemeClient, MemeConfig, TextLineId};
use std::io::Read;
use std::sync::{Arc, Mutex};
use tiny_http::{Header, Response, Server};

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    url: String,
    content_type: String,
    body: Vec<u8>,
}

impl Recorded {
    fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

const TEMPLATES: &str = r#"{"success": true, "data": [
    {"id": "181913649", "name": "Drake Hotline Bling", "url": "https://i.imgflip.com/30b1gx.jpg", "width": 1200, "height": 1200, "box_count": 2},
    {"id": 87743020, "name": "Two Buttons", "url": "https://i.imgflip.com/1g8my4.jpg", "width": 600, "height": 908, "box_count": 3}
]}"#;

const MEMES: &str = r#"{"success": true, "data": [
    {"id": "m1", "template_id": "181913649", "url": "https://i.imgflip.com/m1.jpg", "page_url": "https://imgflip.com/i/m1", "created_at": "2024-03-01T10:00:00"},
    {"id": 2, "url": "https://i.imgflip.com/m2.jpg"}
]}"#;

fn route(method: &str, url: &str, body: &[u8]) -> (u16, String) {
    match (method, url) {
        ("GET", "/api/memes/templates") => (200, TEMPLATES.to_string()),
        ("GET", "/api/memes") => (200, MEMES.to_string()),
        ("POST", "/api/upload") => (
            200,
            r#"{"success": true, "data": {"id": "u1", "filename": "cat.png", "url": "data:image/png;base64,AAAA"}}"#
                .to_string(),
        ),
        ("POST", "/api/memes/create") => {
            let v: serde_json::Value = serde_json::from_slice(body).unwrap_or_default();
            if v["template_id"] == "404" {
                (404, r#"{"detail": "Template not found"}"#.to_string())
            } else if v["boxes"].as_array().map_or(true, |b| b.is_empty()) {
                (200, r#"{"success": false, "error_message": "No texts specified"}"#.to_string())
            } else {
                (
                    200,
                    r#"{"success": true, "data": {"url": "https://i.imgflip.com/new.jpg", "page_url": "https://imgflip.com/i/new"}}"#
                        .to_string(),
                )
            }
        }
        ("POST", "/api/memes/create-custom") => (
            200,
            r#"{"success": true, "data": {"url": "data:image/png;base64,BBBB"}}"#.to_string(),
        ),
        ("DELETE", "/api/memes/missing") => (404, r#"{"detail": "Meme not found"}"#.to_string()),
        ("DELETE", path) if path.starts_with("/api/memes/") => (
            200,
            r#"{"success": true, "message": "Meme deleted successfully"}"#.to_string(),
        ),
        _ => (500, "Internal Server Error".to_string()),
    }
}

/// Start a fake API on an ephemeral port; returns its base URL and the log of
/// requests it has seen.
fn start_fake_api() -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let server = Server::http("127.0.0.1:0").expect("bind fake api");
    let addr = server.server_addr().to_ip().expect("tcp listener");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    std::thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let mut body = Vec::new();
            let _ = request.as_reader().read_to_end(&mut body);
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.as_str().to_string())
                .unwrap_or_default();
            let method = request.method().to_string();
            let url = request.url().to_string();
            let (status, reply) = route(&method, &url, &body);
            log.lock().unwrap().push(Recorded {
                method,
                url,
                content_type,
                body,
            });
            let resp = Response::from_string(reply)
                .with_status_code(status)
                .with_header(Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap());
            let _ = request.respond(resp);
        }
    });

    (format!("http://{}/api", addr), seen)
}

fn backend(base: &str) -> HttpBackend {
    HttpBackend::new(&MemeConfig {
        api_base: base.to_string(),
        timeout_ms: 5000,
        ..Default::default()
    })
    .expect("backend")
}

#[test]
fn templates_are_listed() {
    let (base, _) = start_fake_api();
    let templates = backend(&base).list_templates().unwrap();
    assert_eq!(templates.len(), 2);
    assert_eq!(templates[0].name, "Drake Hotline Bling");
    // Numeric ids are normalised to strings
    assert_eq!(templates[1].id, "87743020");
    assert_eq!(templates[1].box_count, Some(3));
}

#[test]
fn create_sends_boxes_for_non_blank_lines() {
    let (base, seen) = start_fake_api();
    let backend = backend(&base);
    let templates = backend.list_templates().unwrap();

    let mut editor = MemeEditor::new();
    editor.select_template(templates[0].clone());
    editor.update_text(TextLineId(1), "Writing tests");
    editor.update_text(TextLineId(2), "");
    editor.set_text_color("#ff0").unwrap();
    let request = editor.create_request(MemeConfig::default().canvas).unwrap();

    let created = backend.create_meme(&request).unwrap();
    assert_eq!(created.url, "https://i.imgflip.com/new.jpg");
    assert_eq!(created.page_url.as_deref(), Some("https://imgflip.com/i/new"));

    let seen = seen.lock().unwrap();
    let post = seen.iter().find(|r| r.url == "/api/memes/create").expect("create call");
    assert_eq!(post.method, "POST");
    let body = post.json();
    assert_eq!(body["template_id"], "181913649");
    assert_eq!(body["font_family"], "Impact");
    assert_eq!(body["font_size"], 36);
    let boxes = body["boxes"].as_array().unwrap();
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0]["text"], "Writing tests");
    assert_eq!(boxes[0]["color"], "#ffff00");
    assert_eq!(boxes[0]["outline_color"], "#000000");
}

#[test]
fn backend_failures_surface_as_api_errors() {
    let (base, _) = start_fake_api();
    let backend = backend(&base);

    let mut editor = MemeEditor::new();
    let mut template = backend.list_templates().unwrap().remove(0);
    template.id = "404".into();
    editor.select_template(template);
    editor.update_text(TextLineId(1), "hello");
    let request = editor.create_request(MemeConfig::default().canvas).unwrap();
    match backend.create_meme(&request) {
        Err(Error::ApiError(msg)) => assert_eq!(msg, "HTTP 404: Template not found"),
        other => panic!("unexpected: {:?}", other),
    }

    // success: false in a 200 response
    let mut empty = request.clone();
    empty.template_id = "181913649".into();
    empty.boxes.clear();
    match backend.create_meme(&empty) {
        Err(Error::ApiError(msg)) => assert_eq!(msg, "No texts specified"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn custom_creation_posts_lines_and_image() {
    let (base, seen) = start_fake_api();
    let mut editor = MemeEditor::new();
    editor.set_custom_image("data:image/png;base64,AAAA");
    editor.update_text(TextLineId(1), "top");
    editor.set_horizontal_position(TextLineId(1), 30);

    let created = backend(&base)
        .create_custom_meme(&editor.create_custom_request().unwrap())
        .unwrap();
    assert!(created.url.starts_with("data:image/png;base64,"));

    let seen = seen.lock().unwrap();
    let body = seen[0].json();
    assert_eq!(seen[0].url, "/api/memes/create-custom");
    assert_eq!(body["image_url"], "data:image/png;base64,AAAA");
    assert_eq!(body["text_color"], "#ffffff");
    assert_eq!(body["text_lines"][0]["text"], "top");
    assert_eq!(body["text_lines"][0]["horizontalPosition"], 30);
    assert_eq!(body["text_lines"].as_array().unwrap().len(), 2);
}

#[test]
fn upload_is_multipart_and_invalid_files_never_leave() {
    let (base, seen) = start_fake_api();
    let backend = backend(&base);

    assert!(matches!(
        UploadFile::from_bytes("notes.txt", b"hello".to_vec()),
        Err(Error::InvalidFile(_))
    ));
    assert!(seen.lock().unwrap().is_empty());

    let file = UploadFile::from_bytes("cat.png", vec![0x89, b'P', b'N', b'G']).unwrap();
    let uploaded = backend.upload_image(&file).unwrap();
    assert_eq!(uploaded.id.as_deref(), Some("u1"));
    assert_eq!(uploaded.url, "data:image/png;base64,AAAA");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].url, "/api/upload");
    assert!(seen[0].content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&seen[0].body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"cat.png\""));
    assert!(body.contains("image/png"));
}

#[test]
fn gallery_lists_and_deletes() {
    let (base, seen) = start_fake_api();
    let backend = backend(&base);
    let mut gallery = Gallery::new();
    assert_eq!(gallery.refresh(&backend).unwrap(), 2);
    assert_eq!(gallery.memes()[1].id, "2");
    assert_eq!(gallery.reuse("m1").unwrap(), "https://i.imgflip.com/m1.jpg");

    gallery.delete(&backend, "m1").unwrap();
    assert_eq!(gallery.memes().len(), 1);

    match gallery.delete(&backend, "missing") {
        Err(Error::ApiError(msg)) => assert_eq!(msg, "HTTP 404: Meme not found"),
        other => panic!("unexpected: {:?}", other),
    }

    let seen = seen.lock().unwrap();
    let deletes: Vec<_> = seen
        .iter()
        .filter(|r| r.method == "DELETE")
        .map(|r| r.url.as_str())
        .collect();
    assert_eq!(deletes, ["/api/memes/m1", "/api/memes/missing"]);
}

#[test]
fn unreachable_backend_is_a_network_error() {
    // Grab a free port and release it again
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let backend = backend(&format!("http://127.0.0.1:{}/api", port));
    assert!(matches!(backend.list_templates(), Err(Error::NetworkError(_))));
}

#[test]
fn async_client_over_http() {
    let (base, seen) = start_fake_api();
    // The blocking client must be built outside the runtime
    let client = MemeClient::new(backend(&base));
    let runtime = tokio::runtime::Runtime::new().unwrap();

    runtime.block_on(async {
        let templates = client.list_templates().await.unwrap();
        let mut editor = MemeEditor::new();
        editor.select_template(templates[1].clone());
        editor.update_text(TextLineId(2), "bottom");
        let created = client
            .create_meme(editor.create_request(MemeConfig::default().canvas).unwrap())
            .await
            .unwrap();
        editor.record_result(created);
        assert_eq!(
            editor.remote_result().map(|c| c.url.as_str()),
            Some("https://i.imgflip.com/new.jpg")
        );
        assert!(!client.is_creating());
        client.close().await.unwrap();
    });
    assert_eq!(seen.lock().unwrap().len(), 2);
}
