mod server_decode {
    use pretty_assertions::assert_eq;
    use raw_h1::server::{Phase, RequestParser, Status};
    use raw_h1::{ParseError, Request};

    fn decode_str(s: &str) -> Result<Request, ParseError> {
        RequestParser::parse(s.replace("\n", "\r\n").as_bytes())
    }

    #[test]
    fn get_without_headers() {
        let request = RequestParser::parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(request.method(), "GET");
        assert_eq!(request.target(), "/");
        assert_eq!(request.version(), "HTTP/1.1");
        assert!(request.headers().is_empty());
        assert!(request.body().is_empty());
    }

    #[test]
    fn only_http_1_1() {
        assert_eq!(
            RequestParser::parse(b"GET / HTTP/1.0\r\n\r\n").unwrap_err(),
            ParseError::UnsupportedVersion("HTTP/1.0".into())
        );
        assert_eq!(
            RequestParser::parse(b"GET / HTTP/2\r\n\r\n").unwrap_err(),
            ParseError::UnsupportedVersion("HTTP/2".into())
        );
    }

    #[test]
    fn request_line_needs_three_parts() {
        for line in &["GET /\r\n\r\n", "/ HTTP/1.1\r\n\r\n", "GET / x HTTP/1.1\r\n\r\n", "\r\n"] {
            assert!(
                matches!(
                    RequestParser::parse(line.as_bytes()),
                    Err(ParseError::MalformedRequestLine(_))
                ),
                "{:?}",
                line
            );
        }
    }

    #[test]
    fn method_is_uppercase_letters() {
        assert_eq!(
            decode_str("Get / HTTP/1.1\n\n").unwrap_err(),
            ParseError::InvalidMethod("Get".into())
        );
        assert_eq!(
            decode_str("M-SEARCH * HTTP/1.1\n\n").unwrap_err(),
            ParseError::InvalidMethod("M-SEARCH".into())
        );
        assert_eq!(decode_str("OPTIONS * HTTP/1.1\n\n").unwrap().target(), "*");
    }

    #[test]
    fn repeated_headers_are_combined() {
        let request = decode_str("GET /x HTTP/1.1\nHost: a\nHost: b\n\n").unwrap();
        assert_eq!(request.headers().len(), 1);
        assert_eq!(request.header("Host"), Some("a, b"));
    }

    #[test]
    fn post_with_body() {
        let request = decode_str(
            r#"POST / HTTP/1.1
host: localhost:8080
content-length: 5
content-type: text/plain;charset=utf-8
another-header: header value
another-header: other header value

hello"#,
        )
        .unwrap();

        assert_eq!(request.method(), "POST");
        assert_eq!(request.body(), b"hello");
        assert_eq!(request.header("Content-Type"), Some("text/plain;charset=utf-8"));
        assert_eq!(
            request.header("another-header"),
            Some("header value, other header value")
        );
        let names: Vec<_> = request.headers().iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec!["host", "content-length", "content-type", "another-header"]
        );
    }

    #[test]
    fn body_waits_for_content_length() {
        let mut parser = RequestParser::new();
        let (_, status) = parser
            .feed(b"POST /x HTTP/1.1\r\nContent-Length: 5\r\n\r\nhell")
            .unwrap();
        assert_eq!(status, Status::Partial);
        assert_eq!(parser.phase(), Phase::AwaitingBody);

        assert_eq!(parser.feed(b"o").unwrap(), (1, Status::Complete));
        assert_eq!(parser.finish().unwrap().body(), b"hello");
    }

    #[test]
    fn unexpected_eof() {
        let mut parser = RequestParser::new();
        parser
            .feed(b"POST /x HTTP/1.1\r\nContent-Length: 5\r\n\r\nhell")
            .unwrap();
        assert_eq!(parser.finish().unwrap_err(), ParseError::Incomplete);

        let mut parser = RequestParser::new();
        parser.feed(b"GET / HTTP/1.1\r\nHost: a\r\n").unwrap();
        assert_eq!(parser.phase(), Phase::AwaitingHeaders);
        assert_eq!(parser.finish().unwrap_err(), ParseError::Incomplete);

        assert_eq!(
            RequestParser::new().finish().unwrap_err(),
            ParseError::Incomplete
        );
    }

    #[test]
    fn header_without_colon() {
        assert_eq!(
            decode_str("GET / HTTP/1.1\nHost localhost\n\n").unwrap_err(),
            ParseError::MalformedHeader("Host localhost".into())
        );
    }

    #[test]
    fn head_must_be_utf8() {
        assert_eq!(
            RequestParser::parse(b"GET /\xff HTTP/1.1\r\n\r\n").unwrap_err(),
            ParseError::InvalidUtf8
        );
    }

    #[test]
    fn body_may_be_binary() {
        let mut raw = b"PUT /blob HTTP/1.1\r\nContent-Length: 4\r\n\r\n".to_vec();
        raw.extend_from_slice(&[0, 0xff, b'\r', b'\n']);
        let request = RequestParser::parse(&raw).unwrap();
        assert_eq!(request.body(), &[0, 0xff, b'\r', b'\n']);
        assert_eq!(request.into_body(), vec![0, 0xff, b'\r', b'\n']);
    }

    #[test]
    fn long_lines_grow_the_buffer() {
        let long = "a".repeat(64 * 1024);
        let raw = format!("GET /{} HTTP/1.1\r\nX-Long: {}\r\n\r\n", long, long);
        let mut parser = RequestParser::new();
        for chunk in raw.as_bytes().chunks(1000) {
            parser.feed(chunk).unwrap();
        }
        let request = parser.finish().unwrap();
        assert_eq!(request.target().len(), long.len() + 1);
        assert_eq!(request.header("x-long"), Some(long.as_str()));
    }
}
