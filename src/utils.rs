use std::path::Path;

use axum::http::HeaderValue;

/// Extracts the file extension from a filename and converts it to lowercase.
pub fn get_file_extension(filename: &str) -> Option<String> {
    Path::new(filename) // treats string as filesystem path.
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_lowercase())
}

/// Parses a client-supplied numeric id, rejecting signs and whitespace.
pub fn parse_id(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Builds a `Content-Disposition` header that forces a download under `name`.
pub fn attachment_header(name: &str) -> HeaderValue {
    let fallback: String = name
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' { c } else { '_' })
        .collect();

    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        percent_encode(name)
    );

    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

// RFC 5987 attr-char encoding.
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(get_file_extension("Setup.ZIP").as_deref(), Some("zip"));
        assert_eq!(get_file_extension("noext"), None);
        assert_eq!(get_file_extension(".zip"), None);
    }

    #[test]
    fn parse_id_accepts_only_plain_digits() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id(""), None);
        assert_eq!(parse_id("-1"), None);
        assert_eq!(parse_id("+1"), None);
        assert_eq!(parse_id("1a"), None);
        assert_eq!(parse_id(" 1"), None);
    }

    #[test]
    fn attachment_header_escapes_quotes_and_unicode() {
        let header = attachment_header("my \"tools\" архив.zip");
        let text = header.to_str().unwrap();
        assert!(text.starts_with("attachment; filename=\"my _tools_ _____.zip\""));
        assert!(text.contains("filename*=UTF-8''my%20%22tools%22%20%D0%B0"));
    }
}
