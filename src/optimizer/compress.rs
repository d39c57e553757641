use {
    super::Content,
    crate::{Result, cache::CachedResponse},
    flate2::{Compression, write::GzEncoder},
    http::{HeaderMap, header},
    std::io::Write,
};

/// Parses an `Accept-Encoding` value into `(coding, q)` pairs.
fn parse_accept_encoding(value: &str) -> Vec<(&str, f32)> {
    value
        .split(',')
        .filter_map(|part| {
            let mut params = part.split(';');
            let coding = params.next()?.trim();
            if coding.is_empty() {
                return None;
            }
            let quality = params
                .filter_map(|param| {
                    let (name, q) = param.split_once('=')?;
                    name.trim().eq_ignore_ascii_case("q").then_some(q)
                })
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0)
                .clamp(0.0, 1.0);
            Some((coding, quality))
        })
        .collect()
}

/// True when the client accepts gzip with a non-zero quality, either
/// explicitly or through `*`.
pub fn accepts_gzip(accept_encoding: Option<&str>) -> bool {
    let Some(value) = accept_encoding else {
        return false;
    };
    let codings = parse_accept_encoding(value);
    let explicit = codings
        .iter()
        .find(|(coding, _)| coding.eq_ignore_ascii_case("gzip") || coding.eq_ignore_ascii_case("x-gzip"));
    match explicit.or_else(|| codings.iter().find(|(coding, _)| *coding == "*")) {
        Some((_, quality)) => *quality > 0.0,
        None => false,
    }
}

pub fn accepts_gzip_header(headers: &HeaderMap) -> bool {
    accepts_gzip(
        headers
            .get(header::ACCEPT_ENCODING)
            .and_then(|value| value.to_str().ok()),
    )
}

pub fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Gzips the body of `response` in place.
///
/// Sets `Content-Encoding: gzip`, adds `Accept-Encoding` to `Vary` and
/// drops `Content-Length`. Empty or already encoded bodies are left alone.
pub fn compress_response(response: &mut CachedResponse) -> Result<()> {
    if response.body().is_empty() || response.header(header::CONTENT_ENCODING.as_str()).is_some() {
        return Ok(());
    }
    let before = response.body().len();
    let compressed = gzip(response.body())?;
    tracing::debug!(before, after = compressed.len(), "Compressed response");
    response.set_body(compressed);
    response.set_header(header::CONTENT_ENCODING.as_str(), "gzip");
    response.merge_header_token(header::VARY.as_str(), "Accept-Encoding");
    Ok(())
}

/// Compresses any [`Content`] shape. Bare bodies become full responses so
/// the encoding headers can travel with them.
pub fn compress(content: Content) -> Result<Content> {
    let mut response = content.into_cached()?;
    compress_response(&mut response)?;
    Ok(Content::Response(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use flate2::read::GzDecoder;
    use http::StatusCode;
    use std::io::Read;

    fn gunzip(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_accepts_gzip() {
        assert!(accepts_gzip(Some("gzip")));
        assert!(accepts_gzip(Some("br, GZIP;q=0.5")));
        assert!(accepts_gzip(Some("deflate, *")));
        assert!(accepts_gzip(Some("x-gzip")));

        assert!(!accepts_gzip(None));
        assert!(!accepts_gzip(Some("")));
        assert!(!accepts_gzip(Some("br, deflate")));
        assert!(!accepts_gzip(Some("gzip;q=0")));
        assert!(!accepts_gzip(Some("gzip;q=0, *")));
        assert!(!accepts_gzip(Some("*;q=0")));
        assert!(!accepts_gzip(Some("gzip;Q=0")));
        assert!(!accepts_gzip(Some("gzip; q = 0")));
        assert!(accepts_gzip(Some("gzip;Q=0.8")));
    }

    #[test]
    fn test_compress_response_sets_headers() {
        let body = "hello world ".repeat(50);
        let mut response = CachedResponse::new(StatusCode::OK, body.clone())
            .with_header("content-length", &body.len().to_string())
            .with_header("vary", "Origin");

        compress_response(&mut response).unwrap();
        assert_eq!(response.header("content-encoding"), Some("gzip"));
        assert_eq!(response.header("vary"), Some("Origin, Accept-Encoding"));
        assert!(response.header("content-length").is_none());
        assert!(response.body().len() < body.len());
        assert_eq!(gunzip(response.body()), body.as_bytes());
    }

    #[test]
    fn test_compress_skips_encoded_and_empty() {
        let mut encoded = CachedResponse::new(StatusCode::OK, "abc").with_header("content-encoding", "br");
        compress_response(&mut encoded).unwrap();
        assert_eq!(encoded.body().as_ref(), b"abc");

        let mut empty = CachedResponse::new(StatusCode::NO_CONTENT, "");
        compress_response(&mut empty).unwrap();
        assert!(empty.header("content-encoding").is_none());
    }

    #[test]
    fn test_compress_content_keeps_status() {
        let Content::Response(response) =
            compress(Content::from(("gone", StatusCode::GONE))).unwrap()
        else {
            panic!("expected a response");
        };
        assert_eq!(response.status(), StatusCode::GONE);
        assert_eq!(gunzip(response.body()), b"gone");

        let nested = Content::from((Content::from(("x", StatusCode::OK)), StatusCode::OK));
        assert_eq!(compress(nested).unwrap_err().kind(), ErrorKind::UnsupportedContent);
    }
}
