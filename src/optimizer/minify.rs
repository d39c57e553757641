//! HTML minification.
//!
//! A single pass scanner: comments are dropped (conditional comments are
//! kept), whitespace runs in text and inside tags collapse to one space,
//! `attr=""` becomes `attr`, and the contents of `<pre>`, `<textarea>`,
//! `<script>` and `<style>` are copied verbatim. Attribute values are never
//! touched.

use {
    super::Content,
    crate::{Error, Result, cache::CachedResponse},
    http::header,
};

const RAW_TEXT_ELEMENTS: [&str; 4] = ["pre", "textarea", "script", "style"];

pub fn minify_html(input: &str) -> String {
    let src = input.as_bytes();
    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;

    while i < src.len() {
        if src[i..].starts_with(b"<!--") {
            let end = find(src, i + 4, b"-->").map_or(src.len(), |pos| pos + 3);
            if is_conditional_comment(&src[i + 4..end]) {
                out.extend_from_slice(&src[i..end]);
            }
            i = end;
            continue;
        }

        if src[i] == b'<'
            && src
                .get(i + 1)
                .is_some_and(|c| c.is_ascii_alphabetic() || *c == b'/' || *c == b'!')
        {
            let end = tag_end(src, i);
            let tag = &src[i..end];
            minify_tag(tag, &mut out);
            i = match raw_text_element(tag) {
                Some(name) => {
                    let close = format!("</{name}");
                    let close_at = find_ignore_case(src, end, close.as_bytes()).unwrap_or(src.len());
                    out.extend_from_slice(&src[end..close_at]);
                    close_at
                }
                None => end,
            };
            continue;
        }

        if src[i].is_ascii_whitespace() {
            if out.last() != Some(&b' ') {
                out.push(b' ');
            }
        } else {
            out.push(src[i]);
        }
        i += 1;
    }

    // only ASCII bytes are ever dropped or rewritten, so the output is UTF-8
    String::from_utf8_lossy(&out).into_owned()
}

/// Minifies an HTML response body in place.
///
/// Responses that are not HTML or that already carry a `Content-Encoding`
/// are left alone.
pub fn minify_response(response: &mut CachedResponse) -> Result<()> {
    if !response.is_html() || response.header(header::CONTENT_ENCODING.as_str()).is_some() {
        return Ok(());
    }
    let text = std::str::from_utf8(response.body())
        .map_err(|e| Error::unsupported_content(format!("HTML body is not valid UTF-8: {e}")))?;
    let minified = minify_html(text);
    tracing::debug!(
        before = response.body().len(),
        after = minified.len(),
        "Minified HTML response"
    );
    response.set_body(minified);
    Ok(())
}

/// Minifies any [`Content`] shape.
pub fn minify(content: Content) -> Result<Content> {
    match content {
        Content::Text(text) => Ok(Content::Text(minify_html(&text))),
        Content::Bytes(bytes) => {
            let text = std::str::from_utf8(&bytes)
                .map_err(|e| Error::unsupported_content(format!("body is not valid UTF-8: {e}")))?;
            Ok(Content::Bytes(minify_html(text).into()))
        }
        Content::Response(mut response) => {
            minify_response(&mut response)?;
            Ok(Content::Response(response))
        }
        Content::WithStatus(inner, status) => {
            Ok(minify(inner.into_unnested()?)?.with_status(status))
        }
    }
}

fn is_conditional_comment(body: &[u8]) -> bool {
    body.starts_with(b"[if") || body.starts_with(b"[endif") || body.starts_with(b"<![endif")
}

/// Index just past the `>` closing the tag starting at `start`.
fn tag_end(src: &[u8], start: usize) -> usize {
    let mut quote = None;
    for (offset, &c) in src[start + 1..].iter().enumerate() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == b'"' || c == b'\'' => quote = Some(c),
            None if c == b'>' => return start + 1 + offset + 1,
            None => {}
        }
    }
    src.len()
}

fn raw_text_element(tag: &[u8]) -> Option<&'static str> {
    let name: Vec<u8> = tag
        .iter()
        .skip(1)
        .take_while(|c| c.is_ascii_alphanumeric())
        .map(u8::to_ascii_lowercase)
        .collect();
    RAW_TEXT_ELEMENTS
        .into_iter()
        .find(|element| element.as_bytes() == name.as_slice())
}

fn minify_tag(tag: &[u8], out: &mut Vec<u8>) {
    let mut quote = None;
    let mut pending_space = false;
    let mut k = 0;

    while k < tag.len() {
        let c = tag[k];
        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            k += 1;
            continue;
        }

        match c {
            c if c.is_ascii_whitespace() => pending_space = true,
            b'=' => {
                pending_space = false;
                let mut value = k + 1;
                while value < tag.len() && tag[value].is_ascii_whitespace() {
                    value += 1;
                }
                if tag[value..].starts_with(b"\"\"") || tag[value..].starts_with(b"''") {
                    k = value + 2;
                } else {
                    out.push(b'=');
                    k = value;
                }
                continue;
            }
            _ => {
                let self_closing = c == b'/' && tag.get(k + 1) == Some(&b'>');
                if pending_space && c != b'>' && !self_closing {
                    out.push(b' ');
                }
                pending_space = false;
                if c == b'"' || c == b'\'' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
        k += 1;
    }
}

fn find(src: &[u8], from: usize, pattern: &[u8]) -> Option<usize> {
    src.get(from..)?
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map(|pos| pos + from)
}

fn find_ignore_case(src: &[u8], from: usize, pattern: &[u8]) -> Option<usize> {
    src.get(from..)?
        .windows(pattern.len())
        .position(|window| window.eq_ignore_ascii_case(pattern))
        .map(|pos| pos + from)
}
