use std::collections::BTreeMap;

use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use strum::{Display, EnumString};

/// Digest used to sign upload requests. Accounts sign with SHA-1 unless
/// they have been switched to SHA-256.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    #[default]
    #[strum(ascii_case_insensitive, serialize = "sha1")]
    Sha1,
    #[strum(ascii_case_insensitive, serialize = "sha256")]
    Sha256,
}

/// Parameters that are sent with the request but never part of the signature.
const UNSIGNED_PARAMS: [&str; 5] = ["file", "api_key", "resource_type", "cloud_name", "signature"];

/// Builds the `key=value&key=value` string Cloudinary expects, sorted by key
/// and without the unsigned parameters or empty values.
pub fn string_to_sign(params: &BTreeMap<&str, String>) -> String {
    params
        .iter()
        .filter(|(key, value)| !UNSIGNED_PARAMS.contains(*key) && !value.is_empty())
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Signs the given parameters with the account secret.
pub fn sign(
    params: &BTreeMap<&str, String>,
    api_secret: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    let payload = format!("{}{}", string_to_sign(params), api_secret);

    match algorithm {
        SignatureAlgorithm::Sha1 => {
            let mut hasher = Sha1::new();
            hasher.update(payload.as_bytes());
            format!("{:x}", hasher.finalize())
        }
        SignatureAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(payload.as_bytes());
            format!("{:x}", hasher.finalize())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn string_to_sign_sorts_and_skips_unsigned_params() {
        let params = BTreeMap::from([
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample_image".to_string()),
            ("folder", "profile_images".to_string()),
            ("api_key", "1234".to_string()),
            ("file", "https://example.com/a.png".to_string()),
            ("overwrite", "true".to_string()),
        ]);

        assert_eq!(
            string_to_sign(&params),
            "folder=profile_images&overwrite=true&public_id=sample_image&timestamp=1315060510"
        );
    }

    #[test]
    fn string_to_sign_skips_empty_values() {
        let params = BTreeMap::from([
            ("timestamp", "42".to_string()),
            ("public_id", String::new()),
        ]);

        assert_eq!(string_to_sign(&params), "timestamp=42");
    }

    #[test]
    fn sign_appends_secret_before_hashing() {
        // With no signed params the digest covers only the secret.
        let params = BTreeMap::new();

        assert_eq!(
            sign(&params, "abc", SignatureAlgorithm::Sha1),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            sign(&params, "abc", SignatureAlgorithm::Sha256),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn algorithm_parses_case_insensitively() {
        assert_eq!(
            SignatureAlgorithm::from_str("SHA256").unwrap(),
            SignatureAlgorithm::Sha256
        );
        assert_eq!(SignatureAlgorithm::default().to_string(), "sha1");
    }
}
