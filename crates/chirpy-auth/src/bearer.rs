//! Bearer credential extraction

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use crate::error::CredentialError;

const BEARER_PREFIX: &str = "Bearer ";
const API_KEY_PREFIX: &str = "ApiKey ";

/// Extract the bearer credential from the `Authorization` header.
///
/// Header names are matched case-insensitively by [`HeaderMap`]; when the
/// field repeats, the first value is used. The remainder after the prefix is
/// returned verbatim, so `"Bearer "` yields an empty token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, CredentialError> {
    strip_bearer_prefix(authorization_value(headers)?)
}

/// Extract an `ApiKey <key>` credential from the `Authorization` header
pub fn extract_api_key(headers: &HeaderMap) -> Result<&str, CredentialError> {
    authorization_value(headers)?
        .strip_prefix(API_KEY_PREFIX)
        .ok_or(CredentialError::MalformedCredential)
}

/// Compare a presented key with the expected one.
///
/// Every byte is examined regardless of where the first difference is; only
/// the length comparison returns early.
pub fn api_key_matches(presented: &str, expected: &str) -> bool {
    let (presented, expected) = (presented.as_bytes(), expected.as_bytes());
    if presented.len() != expected.len() {
        return false;
    }
    presented
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Strip the exact `"Bearer "` prefix from a raw header value
pub fn strip_bearer_prefix(value: &str) -> Result<&str, CredentialError> {
    if value.is_empty() {
        return Err(CredentialError::MissingCredential);
    }
    value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(CredentialError::MalformedCredential)
}

fn authorization_value(headers: &HeaderMap) -> Result<&str, CredentialError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(CredentialError::MissingCredential)?;

    if value.is_empty() {
        return Err(CredentialError::MissingCredential);
    }

    // `HeaderValue::to_str` rejects non-ASCII, but tokens may carry UTF-8
    std::str::from_utf8(value.as_bytes()).map_err(|_| CredentialError::MalformedCredential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    fn headers_with(value: &'static [u8]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_bytes(value).unwrap());
        headers
    }

    #[test]
    fn test_valid_bearer_token() {
        let headers = headers_with(b"Bearer abc123");
        assert_eq!(extract_bearer_token(&headers), Ok("abc123"));
    }

    #[test]
    fn test_missing_header() {
        let headers = HeaderMap::new();
        assert_eq!(
            extract_bearer_token(&headers),
            Err(CredentialError::MissingCredential)
        );
    }

    #[test]
    fn test_empty_header() {
        let headers = headers_with(b"");
        assert_eq!(
            extract_bearer_token(&headers),
            Err(CredentialError::MissingCredential)
        );
    }

    #[test]
    fn test_header_name_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        let name = HeaderName::from_bytes(b"AuThOrIzAtIoN").unwrap();
        headers.insert(name, HeaderValue::from_static("Bearer valid-token"));
        assert_eq!(extract_bearer_token(&headers), Ok("valid-token"));
    }

    #[test]
    fn test_first_of_multiple_headers_wins() {
        let mut headers = HeaderMap::new();
        headers.append(AUTHORIZATION, HeaderValue::from_static("Bearer valid-token"));
        headers.append(AUTHORIZATION, HeaderValue::from_static("Bearer another-token"));
        assert_eq!(extract_bearer_token(&headers), Ok("valid-token"));
    }

    #[test]
    fn test_wrong_prefixes_are_malformed() {
        let cases = [
            "bearer token123",
            "BEARER token123",
            "Bearer",
            "Bearer\ttoken123",
            "Bearer\ntoken123",
            "Bearer\rtoken123",
            "BeArEr token123",
            "Bearer123 token123",
            "Bearer! token123",
            "Basic dXNlcjpwYXNz",
            "B",
        ];

        for value in cases {
            assert_eq!(
                strip_bearer_prefix(value),
                Err(CredentialError::MalformedCredential),
                "value {:?}",
                value
            );
        }
    }

    #[test]
    fn test_remainder_is_returned_verbatim() {
        let cases = [
            ("Bearer ", ""),
            ("Bearer a", "a"),
            ("Bearer token with spaces", "token with spaces"),
            ("Bearer  leading", " leading"),
            ("Bearer trailing ", "trailing "),
            (
                "Bearer !@#$%^&*()_+-=[]{}|;':\",./<>?",
                "!@#$%^&*()_+-=[]{}|;':\",./<>?",
            ),
            ("Bearer \u{1F680}\u{1F389}\u{2728}", "\u{1F680}\u{1F389}\u{2728}"),
            ("Bearer line1\nline2\r\nline3", "line1\nline2\r\nline3"),
            ("Bearer tab1\ttab2\t\t\ttab3", "tab1\ttab2\t\t\ttab3"),
        ];

        for (value, expected) in cases {
            assert_eq!(strip_bearer_prefix(value), Ok(expected), "value {:?}", value);
        }
    }

    #[test]
    fn test_unicode_token_through_header_map() {
        let headers = headers_with("Bearer t\u{00F6}ken".as_bytes());
        assert_eq!(extract_bearer_token(&headers), Ok("t\u{00F6}ken"));
    }

    #[test]
    fn test_bare_prefix_is_empty_token() {
        let headers = headers_with(b"Bearer ");
        assert_eq!(extract_bearer_token(&headers), Ok(""));
    }

    #[test]
    fn test_long_token() {
        let token = "x".repeat(1000);
        let value = format!("Bearer {}", token);
        assert_eq!(strip_bearer_prefix(&value), Ok(token.as_str()));
    }

    #[test]
    fn test_api_key() {
        let headers = headers_with(b"ApiKey f271c81ff7084ee5b99a5091b42d486e");
        assert_eq!(
            extract_api_key(&headers),
            Ok("f271c81ff7084ee5b99a5091b42d486e")
        );

        let headers = headers_with(b"Bearer f271c81ff7084ee5b99a5091b42d486e");
        assert_eq!(
            extract_api_key(&headers),
            Err(CredentialError::MalformedCredential)
        );

        assert_eq!(
            extract_api_key(&HeaderMap::new()),
            Err(CredentialError::MissingCredential)
        );
    }

    #[test]
    fn test_api_key_matches() {
        let key = "f271c81ff7084ee5b99a5091b42d486e";
        assert!(api_key_matches(key, key));
        assert!(!api_key_matches("f271c81ff7084ee5b99a5091b42d486f", key));
        assert!(!api_key_matches("0271c81ff7084ee5b99a5091b42d486e", key));
        assert!(!api_key_matches("f271c81f", key));
        assert!(!api_key_matches("", key));
        assert!(api_key_matches("", ""));
    }
}
