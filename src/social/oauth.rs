// src/social/oauth.rs
//! OAuth 1.0a (HMAC-SHA1) request signing for the v1.1 REST endpoints.

use anyhow::{anyhow, Result};
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::distr::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

use crate::config::Credentials;

/// RFC 3986 encoding: everything except `A-Z a-z 0-9 - . _ ~`.
pub fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Build the signature base string: `METHOD&url&sorted-params`.
pub fn signature_base(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let joined = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(url),
        percent_encode(&joined)
    )
}

pub fn sign(base: &str, consumer_secret: &str, token_secret: &str) -> Result<String> {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|e| anyhow!("hmac key rejected: {e}"))?;
    mac.update(base.as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

fn nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// `Authorization` header value for a request with the given query/form params.
pub fn authorization_header(
    creds: &Credentials,
    method: &str,
    url: &str,
    request_params: &[(&str, &str)],
) -> Result<String> {
    let ts = chrono::Utc::now().timestamp().max(0).to_string();
    authorization_header_with(creds, method, url, request_params, &nonce(), &ts)
}

/// Deterministic variant of [`authorization_header`].
pub fn authorization_header_with(
    creds: &Credentials,
    method: &str,
    url: &str,
    request_params: &[(&str, &str)],
    nonce: &str,
    timestamp: &str,
) -> Result<String> {
    let mut oauth: Vec<(String, String)> = vec![
        ("oauth_consumer_key".into(), creds.api_key.clone()),
        ("oauth_nonce".into(), nonce.to_string()),
        ("oauth_signature_method".into(), "HMAC-SHA1".into()),
        ("oauth_timestamp".into(), timestamp.to_string()),
        ("oauth_token".into(), creds.access_token.clone()),
        ("oauth_version".into(), "1.0".into()),
    ];

    let mut all = oauth.clone();
    all.extend(
        request_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
    );

    let base = signature_base(method, url, &all);
    let signature = sign(&base, &creds.api_secret, &creds.access_token_secret)?;
    oauth.push(("oauth_signature".into(), signature));

    let fields = oauth
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {fields}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials {
            api_key: "ck".into(),
            api_secret: "cs".into(),
            access_token: "at".into(),
            access_token_secret: "ats".into(),
        }
    }

    #[test]
    fn percent_encoding_matches_rfc3986() {
        assert_eq!(percent_encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(percent_encode("An encoded string!"), "An%20encoded%20string%21");
        assert_eq!(percent_encode("Dogs, Cats & Mice"), "Dogs%2C%20Cats%20%26%20Mice");
        assert_eq!(percent_encode("☃"), "%E2%98%83");
        assert_eq!(percent_encode("a-b.c_d~e"), "a-b.c_d~e");
    }

    #[test]
    fn base_string_sorts_and_double_encodes() {
        let params = vec![
            ("q".to_string(), "#A OR #B".to_string()),
            ("count".to_string(), "5".to_string()),
        ];
        let base = signature_base("get", "https://api.example.com/1.1/search.json", &params);
        assert_eq!(
            base,
            "GET&https%3A%2F%2Fapi.example.com%2F1.1%2Fsearch.json&count%3D5%26q%3D%2523A%2520OR%2520%2523B"
        );
    }

    #[test]
    fn header_is_deterministic_and_complete() {
        let a = authorization_header_with(&creds(), "GET", "https://x/y", &[("a", "1")], "n", "1").unwrap();
        let b = authorization_header_with(&creds(), "GET", "https://x/y", &[("a", "1")], "n", "1").unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("OAuth "));
        for key in [
            "oauth_consumer_key=\"ck\"",
            "oauth_nonce=\"n\"",
            "oauth_signature_method=\"HMAC-SHA1\"",
            "oauth_timestamp=\"1\"",
            "oauth_token=\"at\"",
            "oauth_version=\"1.0\"",
            "oauth_signature=",
        ] {
            assert!(a.contains(key), "missing {key} in {a}");
        }
        // request params are signed but not echoed in the header
        assert!(!a.contains("a=\"1\""));
    }

    #[test]
    fn signature_depends_on_params() {
        let a = authorization_header_with(&creds(), "GET", "https://x/y", &[("a", "1")], "n", "1").unwrap();
        let b = authorization_header_with(&creds(), "GET", "https://x/y", &[("a", "2")], "n", "1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn nonce_is_alphanumeric() {
        let n = nonce();
        assert_eq!(n.len(), 32);
        assert!(n.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
