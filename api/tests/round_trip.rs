#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;
use std::sync::Mutex;

use chrono::Utc;
use pretty_assertions::assert_eq;
use slides_writer_api::Presentation;
use slides_writer_api::SlidesClient;
use slides_writer_api::find_title_shape;
use slides_writer_api::overwrite_text;
use slides_writer_api::replace_text;
use slides_writer_api::resolve_text_boxes;
use slides_writer_login::AppCredentials;
use slides_writer_login::Authenticator;
use slides_writer_login::InstalledApp;
use slides_writer_login::TokenData;
use tempfile::TempDir;

/// In-memory stand-in for the Slides backend: it stores text per element
/// and applies `deleteText`/`insertText` the way the real API does, so the
/// write-then-read-back behavior can be checked end to end.
struct FakeSlides {
    server: Arc<tiny_http::Server>,
    base_url: String,
    handle: Option<std::thread::JoinHandle<()>>,
}

type ElementTexts = Arc<Mutex<HashMap<&'static str, String>>>;

impl FakeSlides {
    fn start(state: ElementTexts) -> Self {
        let server = Arc::new(tiny_http::Server::http(("127.0.0.1", 0)).unwrap());
        let port = server.server_addr().to_ip().unwrap().port();
        let base_url = format!("http://127.0.0.1:{port}");

        let worker = server.clone();
        let handle = std::thread::spawn(move || {
            for mut request in worker.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let payload = if request.url().contains(":batchUpdate") {
                    apply_batch(&state, &body)
                } else {
                    render_presentation(&state)
                };
                let response = tiny_http::Response::from_string(payload.to_string()).with_header(
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .unwrap(),
                );
                let _ = request.respond(response);
            }
        });

        Self {
            server,
            base_url,
            handle: Some(handle),
        }
    }

    fn stop(mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
    }
}

fn apply_batch(state: &ElementTexts, body: &str) -> serde_json::Value {
    let parsed: serde_json::Value = serde_json::from_str(body).unwrap();
    let mut texts = state.lock().unwrap();
    for request in parsed["requests"].as_array().unwrap() {
        if let Some(delete) = request.get("deleteText") {
            let id = delete["objectId"].as_str().unwrap();
            if let Some(text) = texts.get_mut(id) {
                text.clear();
            }
        }
        if let Some(insert) = request.get("insertText") {
            let id = insert["objectId"].as_str().unwrap();
            let inserted = insert["text"].as_str().unwrap();
            if let Some(text) = texts.get_mut(id) {
                // insertionIndex is always 0 here; prepend like the API would.
                *text = format!("{inserted}{text}");
            }
        }
    }
    serde_json::json!({ "presentationId": "pres-1", "replies": [] })
}

fn element(state: &ElementTexts, id: &'static str, translate_y: f64) -> serde_json::Value {
    let text = state.lock().unwrap().get(id).cloned().unwrap_or_default();
    let text_elements = if text.is_empty() {
        serde_json::json!([])
    } else {
        serde_json::json!([{ "textRun": { "content": text } }])
    };
    serde_json::json!({
        "objectId": id,
        "transform": { "translateY": translate_y },
        "shape": { "shapeType": "TEXT_BOX", "text": { "textElements": text_elements } }
    })
}

fn render_presentation(state: &ElementTexts) -> serde_json::Value {
    serde_json::json!({
        "presentationId": "pres-1",
        "slides": [
            {
                "objectId": "slide-1",
                "pageElements": [element(state, "deck-title", 40.0)]
            },
            {
                "objectId": "slide-2",
                "pageElements": [
                    element(state, "s2-content", 200.0),
                    element(state, "s2-title", 50.0)
                ]
            }
        ]
    })
}

fn test_auth(dir: &TempDir) -> Authenticator {
    Authenticator::new(
        AppCredentials {
            installed: InstalledApp {
                client_id: "cid".to_string(),
                client_secret: "sec".to_string(),
            },
        },
        "http://127.0.0.1:1/token".to_string(),
        dir.path().join("tokens.json"),
        TokenData {
            access_token: "test-access".to_string(),
            refresh_token: "test-refresh".to_string(),
            expiry: Some(Utc::now() + chrono::Duration::hours(1)),
        },
    )
}

fn text_of(presentation: &Presentation, element_id: &str) -> String {
    presentation
        .slides
        .iter()
        .flat_map(|slide| slide.page_elements.iter().flatten())
        .filter(|element| element.object_id == element_id)
        .flat_map(|element| {
            element
                .shape
                .iter()
                .flat_map(|shape| shape.text.iter())
                .flat_map(|text| text.text_elements.iter())
        })
        .filter_map(|run| run.text_run.as_ref())
        .map(|run| run.content.clone())
        .collect()
}

#[tokio::test]
async fn written_text_reads_back_unchanged() {
    let state: ElementTexts = Arc::new(Mutex::new(HashMap::from([
        ("deck-title", "Old Deck".to_string()),
        ("s2-title", "Heading".to_string()),
        ("s2-content", "Old content".to_string()),
    ])));
    let fake = FakeSlides::start(state);
    let dir = TempDir::new().unwrap();
    let client = SlidesClient::new(test_auth(&dir), fake.base_url.clone());

    let presentation = client.get_presentation("pres-1", None).await.unwrap();
    let pair = resolve_text_boxes(&presentation, 2).unwrap();
    assert_eq!(pair.title_id, "s2-title");
    assert_eq!(pair.content_id, "s2-content");

    replace_text(&client, "pres-1", &pair.content_id, "CATEGORY $400")
        .await
        .unwrap();
    let after = client.get_presentation("pres-1", None).await.unwrap();
    assert_eq!(text_of(&after, "s2-content"), "CATEGORY $400");

    // Writing the same text again leaves it unchanged rather than doubled.
    replace_text(&client, "pres-1", &pair.content_id, "CATEGORY $400")
        .await
        .unwrap();
    let again = client.get_presentation("pres-1", None).await.unwrap();
    assert_eq!(text_of(&again, "s2-content"), "CATEGORY $400");

    let title_id = find_title_shape(&presentation, 1).unwrap();
    overwrite_text(&client, "pres-1", &title_id, "New Deck")
        .await
        .unwrap();
    let final_read = client.get_presentation("pres-1", None).await.unwrap();
    assert_eq!(text_of(&final_read, "deck-title"), "New Deck");

    fake.stop();
}

#[tokio::test]
async fn replace_fills_an_emptied_shape_without_a_delete() {
    let state: ElementTexts = Arc::new(Mutex::new(HashMap::from([
        ("deck-title", "Deck".to_string()),
        ("s2-title", "Heading".to_string()),
        ("s2-content", String::new()),
    ])));
    let fake = FakeSlides::start(state);
    let dir = TempDir::new().unwrap();
    let client = SlidesClient::new(test_auth(&dir), fake.base_url.clone());

    replace_text(&client, "pres-1", "s2-content", "filled in")
        .await
        .unwrap();
    let after = client.get_presentation("pres-1", None).await.unwrap();
    assert_eq!(text_of(&after, "s2-content"), "filled in");

    fake.stop();
}
