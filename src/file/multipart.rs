//! Multipart/form-data decoder.
//!
//! A byte-oriented scanner over a fully buffered request body. The body of a
//! part ends only at `\r\n--<boundary>`, so binary payloads (including bytes
//! that happen to spell the boundary token) come through unchanged. Part
//! contents are slices of the request buffer, not copies.
//!
//! ```text
//! --XyZ\r\n
//! Content-Disposition: form-data; name="file"; filename="a.txt"\r\n
//! Content-Type: text/plain\r\n
//! \r\n
//! <content>\r\n
//! --XyZ--\r\n
//! ```

use bytes::Bytes;
use thiserror::Error;

/// RFC 2046 limit on boundary length.
pub const MAX_BOUNDARY_LENGTH: usize = 70;

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Errors produced while decoding a multipart body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultipartError {
    /// The request is not `multipart/form-data`.
    #[error("unsupported content type")]
    UnsupportedContentType,

    /// The content type has no `boundary` parameter.
    #[error("missing multipart boundary")]
    MissingBoundary,

    /// The boundary is empty or longer than 70 bytes.
    #[error("invalid multipart boundary")]
    InvalidBoundary,

    /// The body does not follow the multipart framing.
    #[error("malformed multipart body: {0}")]
    Malformed(&'static str),
}

/// A decoded file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Filename from the part's `Content-Disposition` header.
    pub filename: String,
    /// Raw part content, sharing the request buffer.
    pub content: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekingBoundary,
    ReadingHeaders,
    ReadingBody,
    Done,
}

/// Extract the boundary token from a `Content-Type` header value.
pub fn parse_boundary(content_type: &str) -> Result<String, MultipartError> {
    let mut params = split_params(content_type).into_iter();

    let mime = params.next().unwrap_or_default();
    if !mime.trim().eq_ignore_ascii_case("multipart/form-data") {
        return Err(MultipartError::UnsupportedContentType);
    }

    let boundary = params
        .filter_map(|p| parse_param(&p))
        .find(|(k, _)| k == "boundary")
        .map(|(_, v)| v)
        .ok_or(MultipartError::MissingBoundary)?;

    if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LENGTH {
        return Err(MultipartError::InvalidBoundary);
    }

    Ok(boundary)
}

/// Decode every file part in `body`.
///
/// Parts without a `filename` (plain form fields) and parts with an empty
/// filename are skipped. An empty result is not an error here.
pub fn decode(body: &Bytes, boundary: &str) -> Result<Vec<FilePart>, MultipartError> {
    if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LENGTH {
        return Err(MultipartError::InvalidBoundary);
    }

    let delimiter = [b"--".as_slice(), boundary.as_bytes()].concat();
    let body_delimiter = [CRLF, delimiter.as_slice()].concat();

    let mut files = Vec::new();
    let mut pos = 0;
    let mut filename: Option<String> = None;
    let mut state = State::SeekingBoundary;

    while state != State::Done {
        state = match state {
            State::SeekingBoundary => {
                // The first delimiter may open the body or follow a preamble.
                let start = if body.starts_with(&delimiter) {
                    0
                } else {
                    find(body, &body_delimiter)
                        .map(|i| i + CRLF.len())
                        .ok_or(MultipartError::Malformed("missing opening boundary"))?
                };
                pos = start + delimiter.len();
                after_delimiter(body, &mut pos)?
            }
            State::ReadingHeaders => {
                let rest = &body[pos..];
                let headers = if rest.starts_with(CRLF) {
                    pos += CRLF.len();
                    &rest[..0]
                } else {
                    let end = find(rest, HEADER_END)
                        .ok_or(MultipartError::Malformed("unterminated part headers"))?;
                    pos += end + HEADER_END.len();
                    &rest[..end]
                };
                filename = disposition_filename(headers);
                State::ReadingBody
            }
            State::ReadingBody => {
                let rest = &body[pos..];
                let end = find(rest, &body_delimiter)
                    .ok_or(MultipartError::Malformed("unterminated part body"))?;

                if let Some(name) = filename.take().filter(|n| !n.is_empty()) {
                    files.push(FilePart {
                        filename: name,
                        content: body.slice(pos..pos + end),
                    });
                }

                pos += end + body_delimiter.len();
                after_delimiter(body, &mut pos)?
            }
            State::Done => State::Done,
        };
    }

    Ok(files)
}

/// Decide what follows a delimiter: the close marker or another part.
fn after_delimiter(body: &[u8], pos: &mut usize) -> Result<State, MultipartError> {
    let rest = &body[*pos..];
    if rest.starts_with(b"--") {
        return Ok(State::Done);
    }

    // Transport padding is allowed between the delimiter and its CRLF.
    let padding = rest
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t')
        .count();
    if rest[padding..].starts_with(CRLF) {
        *pos += padding + CRLF.len();
        Ok(State::ReadingHeaders)
    } else {
        Err(MultipartError::Malformed("boundary not followed by CRLF"))
    }
}

/// Pull the filename out of a part's `Content-Disposition` header, if any.
fn disposition_filename(headers: &[u8]) -> Option<String> {
    let headers = String::from_utf8_lossy(headers);

    let value = headers.split("\r\n").find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-disposition")
            .then(|| value.trim().to_string())
    })?;

    let params: Vec<(String, String)> = split_params(&value)
        .into_iter()
        .skip(1)
        .filter_map(|p| parse_param(&p))
        .collect();

    if let Some((_, name)) = params.iter().find(|(k, _)| k == "filename") {
        return Some(name.clone());
    }

    // RFC 5987 form: filename*=UTF-8''percent%20encoded
    params
        .iter()
        .find(|(k, _)| k == "filename*")
        .and_then(|(_, v)| {
            let encoded = v.split_once("''").map_or(v.as_str(), |(_, rest)| rest);
            urlencoding::decode(encoded).ok().map(|s| s.into_owned())
        })
}

/// Split a header value on `;`, ignoring separators inside quoted strings.
fn split_params(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for c in value.chars() {
        match c {
            _ if escaped => {
                current.push(c);
                escaped = false;
            }
            '\\' if in_quotes => {
                current.push(c);
                escaped = true;
            }
            '"' => {
                current.push(c);
                in_quotes = !in_quotes;
            }
            ';' if !in_quotes => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);

    parts
}

/// Parse `key=value` or `key="quoted value"`. Keys are lowercased.
fn parse_param(param: &str) -> Option<(String, String)> {
    let (key, value) = param.split_once('=')?;
    let key = key.trim().to_ascii_lowercase();
    let value = value.trim();

    let value = match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(quoted) => {
            let mut out = String::with_capacity(quoted.len());
            let mut chars = quoted.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                } else {
                    out.push(c);
                }
            }
            out
        }
        None => value.to_string(),
    };

    Some((key, value))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

    fn file_part(filename: &str, content: &[u8]) -> Vec<u8> {
        let mut part = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        part.extend_from_slice(content);
        part.extend_from_slice(b"\r\n");
        part
    }

    fn field_part(name: &str, value: &str) -> Vec<u8> {
        format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
            .into_bytes()
    }

    fn closing() -> Vec<u8> {
        format!("--{BOUNDARY}--\r\n").into_bytes()
    }

    fn body(parts: &[Vec<u8>]) -> Vec<u8> {
        let mut body: Vec<u8> = parts.concat();
        body.extend(closing());
        body
    }

    #[test]
    fn test_parse_boundary() {
        let ct = format!("multipart/form-data; boundary={BOUNDARY}");
        assert_eq!(parse_boundary(&ct).unwrap(), BOUNDARY);
    }

    #[test]
    fn test_parse_boundary_quoted_and_case_insensitive() {
        let ct = "Multipart/Form-Data; charset=utf-8; BOUNDARY=\"abc; def\"";
        assert_eq!(parse_boundary(ct).unwrap(), "abc; def");
    }

    #[test]
    fn test_parse_boundary_errors() {
        assert_eq!(
            parse_boundary("application/json"),
            Err(MultipartError::UnsupportedContentType)
        );
        assert_eq!(
            parse_boundary("multipart/form-data"),
            Err(MultipartError::MissingBoundary)
        );
        assert_eq!(
            parse_boundary("multipart/form-data; boundary="),
            Err(MultipartError::InvalidBoundary)
        );
        let long = format!("multipart/form-data; boundary={}", "x".repeat(71));
        assert_eq!(parse_boundary(&long), Err(MultipartError::InvalidBoundary));
    }

    #[test]
    fn test_decode_single_file() {
        let body = body(&[file_part("a.txt", b"hello world")]);

        let files = decode(&Bytes::from(body), BOUNDARY).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "a.txt");
        assert_eq!(&files[0].content[..], b"hello world");
    }

    #[test]
    fn test_decode_multiple_files_in_order() {
        let body = body(&[
            file_part("one.txt", b"1"),
            field_part("description", "ignored"),
            file_part("two.png", b"\x89PNG"),
        ]);

        let files = decode(&Bytes::from(body), BOUNDARY).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "one.txt");
        assert_eq!(files[1].filename, "two.png");
        assert_eq!(&files[1].content[..], b"\x89PNG");
    }

    #[test]
    fn test_decode_no_file_parts() {
        let body = body(&[field_part("note", "just text")]);
        assert!(decode(&Bytes::from(body), BOUNDARY).unwrap().is_empty());
    }

    #[test]
    fn test_decode_close_delimiter_only() {
        let body = closing();
        assert!(decode(&Bytes::from(body), BOUNDARY).unwrap().is_empty());
    }

    #[test]
    fn test_decode_empty_filename_skipped() {
        let body = body(&[file_part("", b"")]);
        assert!(decode(&Bytes::from(body), BOUNDARY).unwrap().is_empty());
    }

    #[test]
    fn test_decode_empty_file_content() {
        let body = body(&[file_part("empty.bin", b"")]);

        let files = decode(&Bytes::from(body), BOUNDARY).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].content.is_empty());
    }

    #[test]
    fn test_decode_binary_content_preserved() {
        // Boundary-like bytes that are not preceded by CRLF are plain content.
        let mut content: Vec<u8> = (0..=255).collect();
        content.extend_from_slice(b"--");
        content.extend_from_slice(BOUNDARY.as_bytes());
        content.extend_from_slice(b"\r\n\r\n");
        content.extend_from_slice(b"\n--");
        content.extend_from_slice(BOUNDARY.as_bytes());
        content.extend_from_slice(b"\r--");
        content.extend_from_slice(BOUNDARY.as_bytes());
        content.extend_from_slice(b"--");

        let body = body(&[file_part("blob.bin", &content)]);

        let files = decode(&Bytes::from(body), BOUNDARY).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content, content);
    }

    #[test]
    fn test_decode_preamble_and_epilogue() {
        let mut raw = b"This is a preamble.\r\n".to_vec();
        raw.extend(body(&[file_part("a.txt", b"x")]));
        raw.extend_from_slice(b"epilogue text");

        let files = decode(&Bytes::from(raw), BOUNDARY).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(&files[0].content[..], b"x");
    }

    #[test]
    fn test_decode_header_case_and_quoted_semicolon() {
        let raw = format!(
            "--{BOUNDARY}\r\ncontent-disposition: form-data; name=\"file\"; FILENAME=\"a;b \\\"c\\\".txt\"\r\n\r\ndata\r\n--{BOUNDARY}--"
        );

        let files = decode(&Bytes::from(raw), BOUNDARY).unwrap();

        assert_eq!(files[0].filename, "a;b \"c\".txt");
    }

    #[test]
    fn test_decode_rfc5987_filename() {
        let raw = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename*=UTF-8''%E6%97%A5%E6%9C%AC.txt\r\n\r\ndata\r\n--{BOUNDARY}--"
        );

        let files = decode(&Bytes::from(raw), BOUNDARY).unwrap();

        assert_eq!(files[0].filename, "日本.txt");
    }

    #[test]
    fn test_decode_part_without_headers_skipped() {
        let raw = format!("--{BOUNDARY}\r\n\r\nnaked\r\n--{BOUNDARY}--");
        assert!(decode(&Bytes::from(raw), BOUNDARY).unwrap().is_empty());
    }

    #[test]
    fn test_decode_missing_opening_boundary() {
        let result = decode(&Bytes::from_static(b"no delimiters here"), BOUNDARY);
        assert_eq!(
            result,
            Err(MultipartError::Malformed("missing opening boundary"))
        );
    }

    #[test]
    fn test_decode_wrong_boundary() {
        let body = body(&[file_part("a.txt", b"x")]);
        assert!(decode(&Bytes::from(body), "other-boundary").is_err());
    }

    #[test]
    fn test_decode_unterminated_body() {
        let raw = file_part("a.txt", b"truncated");
        assert_eq!(
            decode(&Bytes::from(raw), BOUNDARY),
            Err(MultipartError::Malformed("unterminated part body"))
        );
    }

    #[test]
    fn test_decode_unterminated_headers() {
        let raw = format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"f\"");
        assert_eq!(
            decode(&Bytes::from(raw), BOUNDARY),
            Err(MultipartError::Malformed("unterminated part headers"))
        );
    }

    #[test]
    fn test_decode_garbage_after_delimiter() {
        let raw = format!("--{BOUNDARY}garbage\r\n");
        assert_eq!(
            decode(&Bytes::from(raw), BOUNDARY),
            Err(MultipartError::Malformed("boundary not followed by CRLF"))
        );
    }

    #[test]
    fn test_decode_transport_padding() {
        let raw = format!(
            "--{BOUNDARY}  \r\nContent-Disposition: form-data; name=\"file\"; filename=\"p.txt\"\r\n\r\npadded\r\n--{BOUNDARY}--"
        );

        let files = decode(&Bytes::from(raw), BOUNDARY).unwrap();
        assert_eq!(&files[0].content[..], b"padded");
    }

    #[test]
    fn test_decode_rejects_empty_boundary() {
        assert_eq!(
            decode(&Bytes::from_static(b"--\r\n"), ""),
            Err(MultipartError::InvalidBoundary)
        );
    }

    #[test]
    fn test_decode_content_shares_request_buffer() {
        let body = Bytes::from(body(&[file_part("a.txt", b"shared"), file_part("b.txt", b"too")]));
        let range = body.as_ptr_range();

        let files = decode(&body, BOUNDARY).unwrap();

        for file in &files {
            assert!(range.contains(&file.content.as_ptr()));
        }
        assert_eq!(&files[1].content[..], b"too");
    }

    #[test]
    fn test_find() {
        assert_eq!(find(b"abcdef", b"cd"), Some(2));
        assert_eq!(find(b"abc", b"abcd"), None);
        assert_eq!(find(b"abc", b""), None);
    }
}
