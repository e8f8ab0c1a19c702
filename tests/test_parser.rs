use relay::http::parser::{ParseError, decode_chunked, parse_http_request, parse_response_head};
use relay::http::request::Method;

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.path, "/");
    assert_eq!(parsed.version, "HTTP/1.1");
    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_post_request_with_body() {
    let req = b"POST /api HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::POST);
    assert_eq!(parsed.path, "/api");
    assert_eq!(parsed.version, "HTTP/1.1");
    assert_eq!(parsed.body, b"hello".to_vec());
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_multiple_headers() {
    let req = b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    assert_eq!(parsed.headers.get("User-Agent").unwrap(), "test-client");
    assert_eq!(parsed.headers.get("Accept").unwrap(), "*/*");
}

#[test]
fn test_parse_request_with_path_and_query_string() {
    let req = b"GET /search?q=rust HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.path, "/search?q=rust");
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_incomplete_request_partial_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_invalid_http_method() {
    let req = b"GE(T / HTTP/1.1\r\n\r\n";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::InvalidMethod)));
}

#[test]
fn test_parse_malformed_header() {
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::InvalidHeader)));
}

#[test]
fn test_parse_various_http_methods() {
    let methods = vec![
        ("GET", Method::GET),
        ("POST", Method::POST),
        ("PUT", Method::PUT),
        ("DELETE", Method::DELETE),
        ("HEAD", Method::HEAD),
        ("OPTIONS", Method::OPTIONS),
        ("PATCH", Method::PATCH),
    ];

    for (method_str, expected_method) in methods {
        let req = format!("{} / HTTP/1.1\r\n\r\n", method_str);
        let (parsed, _) = parse_http_request(req.as_bytes()).unwrap();
        assert_eq!(parsed.method, expected_method);
    }
}

#[test]
fn test_parse_extension_method() {
    let req = b"PROPFIND /dav/ HTTP/1.1\r\nDepth: 1\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::Other("PROPFIND".to_string()));
    assert_eq!(parsed.method.as_str(), "PROPFIND");
}

#[test]
fn test_parse_request_with_empty_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 0\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.body.len(), 0);
}

#[test]
fn test_parse_request_with_binary_body() {
    let req = b"POST /upload HTTP/1.1\r\nContent-Length: 4\r\n\r\n\x00\x01\x02\x03";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.body, vec![0, 1, 2, 3]);
}

#[test]
fn test_parse_header_case_preservation() {
    let req = b"GET / HTTP/1.1\r\nContent-Type: application/json\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    // Headers keep their casing but match case-insensitively
    assert!(parsed.headers.get("Content-Type").is_some());
    assert_eq!(parsed.headers.iter().next().unwrap().0, "Content-Type");
    assert_eq!(parsed.headers.get("content-type"), Some("application/json"));
}

#[test]
fn test_parse_duplicate_headers_are_kept() {
    let req = b"GET / HTTP/1.1\r\nCookie: a=1\r\nCookie: b=2\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.headers.get_all("Cookie").collect::<Vec<_>>(), vec!["a=1", "b=2"]);
}

#[test]
fn test_parse_chunked_request_body() {
    let req = b"POST /upload HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6;ext=1\r\n world\r\n0\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.body, b"hello world".to_vec());
    assert_eq!(consumed, req.len());
    assert!(parsed.has_body());
}

#[test]
fn test_parse_chunked_request_incomplete() {
    let req = b"POST /upload HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhel";
    assert!(matches!(parse_http_request(req), Err(ParseError::Incomplete)));
}

#[test]
fn test_decode_chunked_with_trailers() {
    let body = b"3\r\nabc\r\n0\r\nX-Checksum: 1\r\n\r\nleftover";
    let (decoded, consumed) = decode_chunked(body).unwrap();

    assert_eq!(decoded, b"abc".to_vec());
    assert_eq!(&body[consumed..], b"leftover");
}

#[test]
fn test_decode_chunked_rejects_missing_crlf() {
    let body = b"3\r\nabcX0\r\n\r\n";
    assert!(matches!(decode_chunked(body), Err(ParseError::InvalidChunk)));
}

#[test]
fn test_decode_chunked_rejects_oversized_chunk() {
    let body = b"ffffffffffffffff\r\nab\r\n0\r\n\r\n";
    assert!(matches!(decode_chunked(body), Err(ParseError::InvalidChunk)));
}

#[test]
fn test_parse_request_with_oversized_chunk_is_rejected() {
    let req = b"POST /upload HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nffffffffffffffff\r\nab\r\n0\r\n\r\n";
    assert!(matches!(parse_http_request(req), Err(ParseError::InvalidChunk)));
}

#[test]
fn test_parse_pipelined_requests() {
    let req = b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n";
    let (first, consumed) = parse_http_request(req).unwrap();
    let (second, _) = parse_http_request(&req[consumed..]).unwrap();

    assert_eq!(first.path, "/a");
    assert_eq!(second.path, "/b");
}

#[test]
fn test_parse_response_head() {
    let resp = b"HTTP/1.1 404 Not Found\r\nX-Custom: v\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\n\r\nbody";
    let (head, consumed) = parse_response_head(resp).unwrap();

    assert_eq!(head.status.as_u16(), 404);
    assert_eq!(head.reason, "Not Found");
    assert_eq!(head.version, "HTTP/1.1");
    assert_eq!(head.headers.get("x-custom"), Some("v"));
    assert_eq!(head.headers.get_all("Set-Cookie").count(), 2);
    assert_eq!(&resp[consumed..], b"body");
}

#[test]
fn test_parse_response_head_keeps_multi_word_reason() {
    let resp = b"HTTP/1.1 503 Service Temporarily Unavailable\r\n\r\n";
    let (head, _) = parse_response_head(resp).unwrap();

    assert_eq!(head.reason, "Service Temporarily Unavailable");
}

#[test]
fn test_parse_response_head_invalid_status() {
    assert!(matches!(
        parse_response_head(b"HTTP/1.1 abc OK\r\n\r\n"),
        Err(ParseError::InvalidStatus)
    ));
    assert!(matches!(
        parse_response_head(b"garbage\r\n\r\n"),
        Err(ParseError::InvalidStatus)
    ));
    assert!(matches!(
        parse_response_head(b"HTTP/1.1 200 OK\r\n"),
        Err(ParseError::Incomplete)
    ));
}
