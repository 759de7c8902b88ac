use http::{HeaderMap, HeaderName, HeaderValue};

/// Prefix every provider adapter forwards verbatim, matched case-insensitively.
pub const FORWARD_PREFIX: &str = "anthropic-";

/// Client-supplied credential headers, stripped before a managed-auth adapter applies its own.
pub const CLIENT_AUTH_HEADERS: [&str; 2] = ["authorization", "x-api-key"];

/// Copies every header whose name begins with `anthropic-` (case-insensitive) from `incoming`
/// into a fresh `HeaderMap`, preserving multi-value semantics. `host` and client auth headers
/// never carry this prefix so they are excluded implicitly.
#[must_use]
pub fn forward_anthropic_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in incoming {
        if has_forward_prefix(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

#[must_use]
pub fn has_forward_prefix(name: &HeaderName) -> bool {
    name.as_str().len() >= FORWARD_PREFIX.len() && name.as_str()[..FORWARD_PREFIX.len()].eq_ignore_ascii_case(FORWARD_PREFIX)
}

/// Inserts `anthropic-version` with `default_version` if the forwarded set doesn't already
/// carry one.
pub fn ensure_anthropic_version(headers: &mut HeaderMap, default_version: &str) {
    if !headers.contains_key("anthropic-version")
        && let Ok(value) = HeaderValue::from_str(default_version)
    {
        headers.insert(HeaderName::from_static("anthropic-version"), value);
    }
}

/// Returns the client-supplied credential, if any, from either `x-api-key` or a `Bearer`
/// `Authorization` header.
#[must_use]
pub fn client_credential(headers: &HeaderMap) -> Option<String> {
    if let Some(v) = headers.get("x-api-key")
        && let Ok(s) = v.to_str()
    {
        return Some(s.to_owned());
    }
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_map(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(HeaderName::from_bytes(k.as_bytes()).unwrap(), HeaderValue::from_str(v).unwrap());
        }
        map
    }

    #[test]
    fn forwards_only_anthropic_prefixed_headers() {
        let incoming = header_map(&[
            ("anthropic-version", "2023-06-01"),
            ("anthropic-beta", "tools-2024-05-16"),
            ("authorization", "Bearer secret"),
            ("host", "client.example.com"),
            ("content-type", "application/json"),
        ]);
        let forwarded = forward_anthropic_headers(&incoming);
        assert_eq!(forwarded.len(), 2);
        assert!(forwarded.contains_key("anthropic-version"));
        assert!(forwarded.contains_key("anthropic-beta"));
        assert!(!forwarded.contains_key("authorization"));
        assert!(!forwarded.contains_key("host"));
    }

    #[test]
    fn prefix_match_is_case_insensitive() {
        let incoming = header_map(&[("Anthropic-Version", "2023-06-01")]);
        let forwarded = forward_anthropic_headers(&incoming);
        assert_eq!(forwarded.len(), 1);
    }

    #[test]
    fn ensure_version_only_when_absent() {
        let mut headers = HeaderMap::new();
        ensure_anthropic_version(&mut headers, "2023-06-01");
        assert_eq!(headers.get("anthropic-version").unwrap(), "2023-06-01");

        let mut present = header_map(&[("anthropic-version", "2024-01-01")]);
        ensure_anthropic_version(&mut present, "2023-06-01");
        assert_eq!(present.get("anthropic-version").unwrap(), "2024-01-01");
    }

    #[test]
    fn extracts_client_credential_from_either_header() {
        let via_key = header_map(&[("x-api-key", "sk-1")]);
        assert_eq!(client_credential(&via_key).as_deref(), Some("sk-1"));

        let via_bearer = header_map(&[("authorization", "Bearer sk-2")]);
        assert_eq!(client_credential(&via_bearer).as_deref(), Some("sk-2"));

        let none = HeaderMap::new();
        assert!(client_credential(&none).is_none());
    }
}
