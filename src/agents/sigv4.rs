//! AWS Signature Version 4 request signing.
//!
//! Just enough of SigV4 to sign a single JSON POST to a regional AWS
//! endpoint: no query strings, no chunked payloads.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::AgentError;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Credentials and region for signing.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub region: String,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .finish()
    }
}

impl AwsCredentials {
    /// Read `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_REGION`
    /// (plus `AWS_SESSION_TOKEN` when present).
    pub fn from_env() -> Result<Self, AgentError> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AgentError::BackendUnavailable(format!("{} env var not set", name)))
        };

        Ok(Self {
            access_key_id: var("AWS_ACCESS_KEY_ID")?,
            secret_access_key: var("AWS_SECRET_ACCESS_KEY")?,
            session_token: std::env::var("AWS_SESSION_TOKEN")
                .ok()
                .filter(|v| !v.is_empty()),
            region: var("AWS_REGION")?,
        })
    }
}

/// A request to be signed.
#[derive(Debug, Clone)]
pub struct SigningRequest<'a> {
    pub method: &'a str,
    pub host: &'a str,
    /// Path as sent on the wire (already percent-encoded once).
    pub path: &'a str,
    pub content_type: &'a str,
    pub payload: &'a [u8],
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Percent-encode one path segment, leaving RFC 3986 unreserved characters.
pub fn uri_encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Canonical URI: every segment of the wire path encoded again.
pub fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

/// Derive the per-day signing key.
pub fn signing_key(secret: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// Sign `request` and return the headers to attach to it.
pub fn sign(
    credentials: &AwsCredentials,
    service: &str,
    request: &SigningRequest<'_>,
    now: DateTime<Utc>,
) -> Vec<(&'static str, String)> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();

    let mut canonical_headers = vec![
        ("content-type", request.content_type.to_string()),
        ("host", request.host.to_string()),
        ("x-amz-date", amz_date.clone()),
    ];
    if let Some(token) = &credentials.session_token {
        canonical_headers.push(("x-amz-security-token", token.clone()));
    }

    let signed_headers = canonical_headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");
    let header_block: String = canonical_headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();

    let canonical_request = format!(
        "{}\n{}\n\n{}\n{}\n{}",
        request.method,
        canonical_uri(request.path),
        header_block,
        signed_headers,
        sha256_hex(request.payload)
    );

    let scope = format!(
        "{}/{}/{}/aws4_request",
        date_stamp, credentials.region, service
    );
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let key = signing_key(
        &credentials.secret_access_key,
        &date_stamp,
        &credentials.region,
        service,
    );
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credentials.access_key_id, scope, signed_headers, signature
    );

    let mut headers = vec![("x-amz-date", amz_date), ("authorization", authorization)];
    if let Some(token) = &credentials.session_token {
        headers.push(("x-amz-security-token", token.clone()));
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn credentials() -> AwsCredentials {
        AwsCredentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string(),
            session_token: None,
            region: "us-east-1".to_string(),
        }
    }

    #[test]
    fn test_signing_key_known_vector() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_uri_encode() {
        assert_eq!(uri_encode("v1:0"), "v1%3A0");
        assert_eq!(uri_encode("a b"), "a%20b");
        assert_eq!(uri_encode("safe-_.~"), "safe-_.~");
    }

    #[test]
    fn test_canonical_uri_double_encodes() {
        let wire = format!("/model/{}/invoke", uri_encode("claude-v1:0"));
        assert_eq!(wire, "/model/claude-v1%3A0/invoke");
        assert_eq!(canonical_uri(&wire), "/model/claude-v1%253A0/invoke");
    }

    #[test]
    fn test_sign_headers() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let request = SigningRequest {
            method: "POST",
            host: "bedrock-runtime.us-east-1.amazonaws.com",
            path: "/model/x/invoke",
            content_type: "application/json",
            payload: b"{}",
        };

        let headers = sign(&credentials(), "bedrock", &request, now);
        assert_eq!(headers[0], ("x-amz-date", "20240101T120000Z".to_string()));

        let auth = &headers[1].1;
        assert!(auth.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240101/us-east-1/bedrock/aws4_request, \
             SignedHeaders=content-type;host;x-amz-date, Signature="
        ));
        let signature = auth.rsplit('=').next().unwrap();
        assert_eq!(signature.len(), 64);

        // Deterministic for identical input.
        let again = sign(&credentials(), "bedrock", &request, now);
        assert_eq!(headers, again);
    }

    #[test]
    fn test_sign_with_session_token() {
        let mut creds = credentials();
        creds.session_token = Some("token".to_string());
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let request = SigningRequest {
            method: "POST",
            host: "example.amazonaws.com",
            path: "/",
            content_type: "application/json",
            payload: b"",
        };

        let headers = sign(&creds, "bedrock", &request, now);
        assert_eq!(headers.len(), 3);
        assert!(headers[1].1.contains("x-amz-date;x-amz-security-token"));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("EXAMPLEKEY"));
        assert!(rendered.contains("AKIDEXAMPLE"));
    }
}
