use super::*;
use crate::llm::types::ReferenceImage;

fn make_response(parts: serde_json::Value) -> GenerateContentResponse {
    let json = serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": parts },
            "finishReason": "STOP"
        }]
    })
    .to_string();
    parse_response(&json).unwrap()
}

// =============================================================================
// extract_text
// =============================================================================

#[test]
fn extract_text_reads_first_part() {
    let resp = make_response(serde_json::json!([{ "text": "  A misty forest  " }, { "text": "ignored" }]));
    assert_eq!(extract_text(&resp).unwrap(), "  A misty forest  ");
}

#[test]
fn extract_text_no_candidates_is_empty_response() {
    let resp = parse_response(r#"{ "candidates": [] }"#).unwrap();
    assert!(matches!(extract_text(&resp), Err(LlmError::EmptyResponse)));
}

#[test]
fn extract_text_missing_candidates_key_is_empty_response() {
    let resp = parse_response(r#"{ "promptFeedback": { "blockReason": "SAFETY" } }"#).unwrap();
    assert!(matches!(extract_text(&resp), Err(LlmError::EmptyResponse)));
}

#[test]
fn extract_text_first_part_without_text_is_empty_response() {
    let resp = make_response(serde_json::json!([{ "inlineData": { "mimeType": "image/png", "data": "Zm9v" } }]));
    assert!(matches!(extract_text(&resp), Err(LlmError::EmptyResponse)));
}

#[test]
fn extract_text_candidate_without_content_is_empty_response() {
    let resp = parse_response(r#"{ "candidates": [{ "finishReason": "SAFETY" }] }"#).unwrap();
    assert!(matches!(extract_text(&resp), Err(LlmError::EmptyResponse)));
}

// =============================================================================
// extract_png_data_uri
// =============================================================================

#[test]
fn extract_png_builds_data_uri() {
    let resp = make_response(serde_json::json!([
        { "text": "Here is your image" },
        { "inlineData": { "mimeType": "image/png", "data": "Zm9v" } }
    ]));
    assert_eq!(extract_png_data_uri(&resp).unwrap(), "data:image/png;base64,Zm9v");
}

#[test]
fn extract_png_text_only_is_no_image_data() {
    let resp = make_response(serde_json::json!([{ "text": "I cannot draw that" }]));
    assert!(matches!(extract_png_data_uri(&resp), Err(LlmError::NoImageData)));
}

#[test]
fn extract_png_skips_other_mime_types() {
    let resp = make_response(serde_json::json!([
        { "inlineData": { "mimeType": "image/jpeg", "data": "anBn" } },
        { "inlineData": { "mimeType": "image/png", "data": "cG5n" } }
    ]));
    assert_eq!(extract_png_data_uri(&resp).unwrap(), "data:image/png;base64,cG5n");
}

#[test]
fn extract_png_only_jpeg_is_no_image_data() {
    let resp = make_response(serde_json::json!([{ "inlineData": { "mimeType": "image/jpeg", "data": "anBn" } }]));
    assert!(matches!(extract_png_data_uri(&resp), Err(LlmError::NoImageData)));
}

// =============================================================================
// parse_response / http_error
// =============================================================================

#[test]
fn parse_invalid_json() {
    assert!(matches!(parse_response("not json"), Err(LlmError::ApiParse(_))));
}

#[test]
fn http_error_prefers_api_message() {
    let body = r#"{ "error": { "code": 429, "message": "quota exceeded", "status": "RESOURCE_EXHAUSTED" } }"#;
    let err = http_error(429, body);
    assert!(matches!(&err, LlmError::Http { status: 429, message } if message == "quota exceeded"));
}

#[test]
fn http_error_non_json_body_uses_status_line() {
    let err = http_error(502, "<html>Bad Gateway</html>");
    assert!(matches!(&err, LlmError::Http { status: 502, message } if message == "HTTP error! status: 502"));
}

#[test]
fn http_error_without_message_uses_status_line() {
    let err = http_error(400, r#"{ "error": { "code": 400 } }"#);
    assert_eq!(err.to_string(), "HTTP error! status: 400");
}

// =============================================================================
// Request building
// =============================================================================

#[test]
fn text_request_is_single_user_turn() {
    let json = serde_json::to_value(text_request("describe a cat")).unwrap();
    assert_eq!(json, serde_json::json!({ "contents": [{ "role": "user", "parts": [{ "text": "describe a cat" }] }] }));
}

#[test]
fn image_request_puts_references_before_text() {
    let req = ImageRequest {
        text: "a red fox".into(),
        references: vec![
            ReferenceImage { mime_type: "image/png".into(), data: "AAA".into() },
            ReferenceImage { mime_type: "image/jpeg".into(), data: "BBB".into() },
        ],
    };
    let json = serde_json::to_value(image_request(&req)).unwrap();
    let parts = json["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0]["inlineData"]["data"], "AAA");
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[2]["text"], "a red fox");
    assert_eq!(json["generationConfig"]["responseModalities"], serde_json::json!(["TEXT", "IMAGE"]));
}

#[test]
fn endpoint_accepts_bare_and_prefixed_models() {
    assert_eq!(
        endpoint_for_model("https://x.test/v1beta", "gemini-2.0-flash"),
        "https://x.test/v1beta/models/gemini-2.0-flash:generateContent"
    );
    assert_eq!(
        endpoint_for_model("https://x.test/v1beta", "models/gemini-2.0-flash"),
        "https://x.test/v1beta/models/gemini-2.0-flash:generateContent"
    );
}

// =============================================================================
// Transport
// =============================================================================

#[tokio::test]
async fn closed_port_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client =
        GeminiClient::new("k".into(), format!("http://127.0.0.1:{port}/v1beta/"), LlmTimeouts::default()).unwrap();
    let err = client
        .generate_content("m", &text_request("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Network(_)));
}

/// Serve one canned HTTP response on a local port and return the base URL.
async fn serve_once(status_line: &'static str, body: &'static str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().to_string()))
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + content_length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://127.0.0.1:{port}/v1beta")
}

#[tokio::test]
async fn quota_status_surfaces_api_message() {
    let base = serve_once("429 Too Many Requests", r#"{ "error": { "code": 429, "message": "quota exceeded" } }"#).await;
    let client = GeminiClient::new("k".into(), base, LlmTimeouts::default()).unwrap();

    let err = client
        .generate_content("m", &text_request("hi"))
        .await
        .unwrap_err();

    assert!(matches!(&err, LlmError::Http { status: 429, message } if message == "quota exceeded"));
    assert_eq!(err.to_string(), "quota exceeded");
    assert!(err.retryable());
}

#[tokio::test]
async fn error_status_without_message_uses_status_line() {
    let base = serve_once("503 Service Unavailable", "upstream down").await;
    let client = GeminiClient::new("k".into(), base, LlmTimeouts::default()).unwrap();

    let err = client
        .generate_content("m", &text_request("hi"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "HTTP error! status: 503");
}
