//! BCE auth v1 request signing, used to exchange an application key pair for a
//! bearer token.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Validity window of the signature itself, not of the token being requested.
pub const SIGNATURE_EXPIRATION_SECONDS: u32 = 1800;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub bce_date: String,
}

/// Sign a request over the `host` and `x-bce-date` headers.
pub fn sign_request(
    access_key: &str,
    secret_key: &str,
    method: &str,
    host: &str,
    path: &str,
    query: &[(&str, String)],
    now: DateTime<Utc>,
) -> SignedHeaders {
    let bce_date = now.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let auth_prefix = format!(
        "bce-auth-v1/{access_key}/{bce_date}/{SIGNATURE_EXPIRATION_SECONDS}"
    );

    let canonical_request = format!(
        "{}\n{}\n{}\nhost:{}\nx-bce-date:{}",
        method.to_uppercase(),
        canonical_uri(path),
        canonical_query(query),
        uri_encode(host),
        uri_encode(&bce_date),
    );

    let signing_key = hmac_hex(secret_key.as_bytes(), &auth_prefix);
    let signature = hmac_hex(signing_key.as_bytes(), &canonical_request);

    SignedHeaders {
        authorization: format!("{auth_prefix}/host;x-bce-date/{signature}"),
        bce_date,
    }
}

fn canonical_uri(path: &str) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    uri_encode(&path).replace("%2F", "/")
}

fn canonical_query(query: &[(&str, String)]) -> String {
    let mut pairs: Vec<String> = query
        .iter()
        .map(|(key, value)| format!("{}={}", uri_encode(key), uri_encode(value)))
        .collect();
    pairs.sort();
    pairs.join("&")
}

fn uri_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn hmac_hex(key: &[u8], message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take keys of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
