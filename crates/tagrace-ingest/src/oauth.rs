//! OAuth 1.0a request signing (HMAC-SHA1), as required by the stream provider.
//!
//! Every parameter name and value is percent-encoded per RFC 3986 (only
//! `ALPHA / DIGIT / - . _ ~` pass through) before sorting and joining.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::{distributions::Alphanumeric, Rng};
use sha1::Sha1;

use tagrace_core::{Result, TagRaceError};

use crate::config::Credentials;

type HmacSha1 = Hmac<Sha1>;

fn enc(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Per-request values; random in production, fixed in tests.
#[derive(Debug, Clone)]
pub struct Nonce {
    pub nonce: String,
    pub timestamp: u64,
}

impl Nonce {
    pub fn generate() -> Self {
        let nonce = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self { nonce, timestamp }
    }
}

fn oauth_params(creds: &Credentials, nonce: &Nonce) -> Vec<(&'static str, String)> {
    vec![
        ("oauth_consumer_key", creds.consumer_key.clone()),
        ("oauth_nonce", nonce.nonce.clone()),
        ("oauth_signature_method", "HMAC-SHA1".to_string()),
        ("oauth_timestamp", nonce.timestamp.to_string()),
        ("oauth_token", creds.access_token.clone()),
        ("oauth_version", "1.0".to_string()),
    ]
}

/// `METHOD&enc(url)&enc(sorted params)`. `url` must not carry a query string;
/// pass query and form parameters through `params`.
pub fn signature_base_string(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    creds: &Credentials,
    nonce: &Nonce,
) -> String {
    let oauth = oauth_params(creds, nonce);
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (enc(k), enc(v)))
        .chain(oauth.iter().map(|(k, v)| (enc(k), enc(v))))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        enc(url),
        enc(&param_string)
    )
}

pub fn signing_key(creds: &Credentials) -> String {
    format!("{}&{}", enc(&creds.consumer_secret), enc(&creds.access_secret))
}

pub fn sign(base: &str, key: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| TagRaceError::Internal(format!("hmac key rejected: {e}")))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Value for the `Authorization` header of one request.
pub fn authorization_header(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    creds: &Credentials,
    nonce: &Nonce,
) -> Result<String> {
    let base = signature_base_string(method, url, params, creds, nonce);
    let signature = sign(&base, &signing_key(creds))?;

    let mut fields = oauth_params(creds, nonce);
    fields.push(("oauth_signature", signature));
    fields.sort();

    let header = fields
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", enc(k), enc(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {header}"))
}
