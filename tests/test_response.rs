use relay::http::cookie::Cookie;
use relay::http::response::{Response, ResponseBuilder, StatusCode};
use relay::http::writer::{ResponseWriter, serialize_response};

fn rendered(resp: &Response) -> String {
    String::from_utf8(serialize_response(resp, true, true)).unwrap()
}

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::OK.as_u16(), 200);
    assert_eq!(StatusCode::CREATED.as_u16(), 201);
    assert_eq!(StatusCode::NO_CONTENT.as_u16(), 204);
    assert_eq!(StatusCode::BAD_REQUEST.as_u16(), 400);
    assert_eq!(StatusCode::NOT_FOUND.as_u16(), 404);
    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::OK.reason_phrase(), "OK");
    assert_eq!(StatusCode::CREATED.reason_phrase(), "Created");
    assert_eq!(StatusCode::NO_CONTENT.reason_phrase(), "No Content");
    assert_eq!(StatusCode::NOT_FOUND.reason_phrase(), "Not Found");
    assert_eq!(
        StatusCode::INTERNAL_SERVER_ERROR.reason_phrase(),
        "Internal Server Error"
    );
    assert_eq!(StatusCode::from_u16(599).unwrap().reason_phrase(), "");
}

#[test]
fn test_status_code_range() {
    assert!(StatusCode::from_u16(99).is_none());
    assert!(StatusCode::from_u16(1000).is_none());
    assert_eq!(StatusCode::from_u16(418).unwrap().as_u16(), 418);
    assert!(StatusCode::NO_CONTENT.is_bodyless());
    assert!(StatusCode::NOT_MODIFIED.is_bodyless());
    assert!(!StatusCode::OK.is_bodyless());
}

#[test]
fn test_response_builder_basic() {
    let response = ResponseBuilder::new(StatusCode::OK)
        .body(b"Hello, World!".to_vec())
        .build();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"Hello, World!".to_vec());
    assert_eq!(response.content_length, Some(13));
}

#[test]
fn test_response_builder_keeps_duplicate_headers() {
    let response = ResponseBuilder::new(StatusCode::OK)
        .header("Vary", "Accept")
        .header("Vary", "Origin")
        .header("X-Custom", "value")
        .build();

    assert_eq!(response.headers.len(), 3);
    assert_eq!(response.headers.get_all("vary").count(), 2);
}

#[test]
fn test_response_reason_override() {
    let mut response = Response::new(StatusCode::NOT_FOUND);
    assert_eq!(response.reason(), "Not Found");

    response.reason = Some("Nope".to_string());
    assert_eq!(response.reason(), "Nope");
}

#[test]
fn test_effective_content_type_forces_charset() {
    let mut response = Response::new(StatusCode::OK);
    response.content_type = Some("text/html; charset=ISO-8859-1".to_string());
    response.content_encoding = Some("utf-8".to_string());
    assert_eq!(
        response.effective_content_type().as_deref(),
        Some("text/html; charset=utf-8")
    );

    response.content_type = Some("application/json".to_string());
    assert_eq!(
        response.effective_content_type().as_deref(),
        Some("application/json; charset=utf-8")
    );

    response.content_encoding = None;
    assert_eq!(
        response.effective_content_type().as_deref(),
        Some("application/json")
    );

    response.content_type = None;
    assert_eq!(response.effective_content_type(), None);
}

#[test]
fn test_explicit_content_length_wins_over_body() {
    let mut response = Response::new(StatusCode::OK);
    response.body = b"abc".to_vec();
    assert_eq!(response.effective_content_length(), 3);

    response.content_length = Some(10);
    assert_eq!(response.effective_content_length(), 10);
}

#[test]
fn test_serialize_status_line_and_framing() {
    let response = ResponseBuilder::new(StatusCode::OK)
        .header("X-Custom", "v")
        .content_type("text/plain")
        .body(b"hello".to_vec())
        .build();
    let text = rendered(&response);

    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("X-Custom: v\r\n"));
    assert!(text.contains("Content-Type: text/plain\r\n"));
    assert!(text.contains("Content-Length: 5\r\n"));
    assert!(text.contains("Connection: keep-alive\r\n"));
    assert!(text.ends_with("\r\n\r\nhello"));
}

#[test]
fn test_serialize_custom_reason_and_close() {
    let mut response = Response::new(StatusCode::from_u16(599).unwrap());
    response.reason = Some("Network Timeout".to_string());
    let text = String::from_utf8(serialize_response(&response, false, true)).unwrap();

    assert!(text.starts_with("HTTP/1.1 599 Network Timeout\r\n"));
    assert!(text.contains("Connection: close\r\n"));
    assert!(text.contains("Content-Length: 0\r\n"));
}

#[test]
fn test_serialize_one_set_cookie_per_cookie() {
    let mut sess = Cookie::new("sess", "abc");
    sess.domain = Some("localhost".to_string());
    sess.path = Some("/".to_string());
    sess.http_only = true;

    let response = ResponseBuilder::new(StatusCode::OK)
        .cookie(sess)
        .cookie(Cookie::new("theme", "dark"))
        .build();
    let text = rendered(&response);

    assert!(text.contains("Set-Cookie: sess=abc; Domain=localhost; Path=/; HttpOnly\r\n"));
    assert!(text.contains("Set-Cookie: theme=dark\r\n"));
}

#[test]
fn test_serialize_head_response_omits_body_keeps_length() {
    let response = ResponseBuilder::new(StatusCode::OK).body(b"hello".to_vec()).build();
    let text = String::from_utf8(serialize_response(&response, true, false)).unwrap();

    assert!(text.contains("Content-Length: 5\r\n"));
    assert!(text.ends_with("\r\n\r\n"));
}

#[tokio::test]
async fn test_response_writer_writes_everything() {
    let response = ResponseBuilder::new(StatusCode::OK).body(b"payload".to_vec()).build();
    let expected = serialize_response(&response, true, true);

    let mut out: Vec<u8> = Vec::new();
    let mut writer = ResponseWriter::new(&response, true, true);
    writer.write_to_stream(&mut out).await.unwrap();

    assert_eq!(out, expected);
}

#[test]
fn test_bad_request_response() {
    let response = Response::bad_request();
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.content_type.as_deref(), Some("text/plain"));
    assert_eq!(response.body, b"400 Bad Request".to_vec());
    assert_eq!(response.content_length, Some(15));
}
