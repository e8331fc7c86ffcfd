//! Loading a single value layer from disk
//!
//! Plaintext YAML/JSON parse failures are hard errors. Encrypted envelope
//! files are recognized by their reserved suffix; a decryption failure is a
//! deliberate soft-fail: warn and parse the raw ciphertext bytes, so a
//! missing key does not abort an otherwise successful run. The envelope's
//! top-level marker key is left in place here; the merge step prunes it.

use std::path::Path;

use flock_core::Values;

use crate::error::Result;
use crate::secrets::SecretDecryptor;

/// Reserved top-level key the envelope format uses to mark its key metadata
pub const ENVELOPE_MARKER_KEY: &str = "sops";

/// Keys always removed while finalizing a merge
pub const PRUNE_KEYS: &[&str] = &[ENVELOPE_MARKER_KEY];

/// Whether a path names an encrypted envelope file, by reserved suffix
pub fn is_envelope(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    name.ends_with(".sops.yaml") || name.ends_with(".sops.yml") || name.ends_with(".sops.json")
}

/// Whether a path names a structured value file
pub fn is_value_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    )
}

/// Load one file into a tree, decrypting envelopes when a decryptor is given
///
/// `decryptor: None` means decryption is skipped outright: envelope files
/// parse as their raw bytes.
pub fn load_layer(path: &Path, decryptor: Option<&dyn SecretDecryptor>) -> Result<Values> {
    let bytes = std::fs::read(path)?;

    if is_envelope(path) {
        if let Some(decryptor) = decryptor {
            match decryptor.decrypt(&bytes) {
                Ok(plaintext) => return parse_bytes(path, &plaintext),
                Err(e) => {
                    tracing::warn!(
                        "could not decrypt {}, keeping ciphertext: {}",
                        path.display(),
                        e
                    );
                }
            }
        }
    }

    parse_bytes(path, &bytes)
}

fn parse_bytes(path: &Path, bytes: &[u8]) -> Result<Values> {
    if path.extension().is_some_and(|e| e == "json") {
        Ok(Values(serde_json::from_slice(bytes)?))
    } else {
        Ok(Values(serde_yaml::from_slice(bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::DecryptError;

    struct FixedDecryptor(&'static str);

    impl SecretDecryptor for FixedDecryptor {
        fn decrypt(&self, _ciphertext: &[u8]) -> std::result::Result<Vec<u8>, DecryptError> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    struct FailingDecryptor;

    impl SecretDecryptor for FailingDecryptor {
        fn decrypt(&self, _ciphertext: &[u8]) -> std::result::Result<Vec<u8>, DecryptError> {
            Err(DecryptError::new("no key material"))
        }
    }

    #[test]
    fn test_envelope_suffix_detection() {
        assert!(is_envelope(Path::new("/v/prod.sops.yaml")));
        assert!(is_envelope(Path::new("prod.sops.json")));
        assert!(!is_envelope(Path::new("prod.yaml")));
        assert!(!is_envelope(Path::new("sops.yaml")));
    }

    #[test]
    fn test_value_file_detection() {
        assert!(is_value_file(Path::new("a.yaml")));
        assert!(is_value_file(Path::new("a.yml")));
        assert!(is_value_file(Path::new("a.json")));
        assert!(!is_value_file(Path::new("a.txt")));
        assert!(!is_value_file(Path::new("a")));
    }

    #[test]
    fn test_plaintext_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.yaml");
        std::fs::write(&path, "replicas: 2").unwrap();

        let layer = load_layer(&path, None).unwrap();
        assert_eq!(layer.get("replicas").unwrap(), 2);
    }

    #[test]
    fn test_plaintext_parse_failure_is_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.yaml");
        std::fs::write(&path, "replicas: [unclosed").unwrap();

        assert!(load_layer(&path, None).is_err());
    }

    #[test]
    fn test_envelope_decrypted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prod.sops.yaml");
        std::fs::write(&path, "token: ENC[AES256_GCM,data:xxxx]\nsops: {mac: m}").unwrap();

        let decryptor = FixedDecryptor("token: plain-secret");
        let layer = load_layer(&path, Some(&decryptor)).unwrap();
        assert_eq!(layer.get("token").unwrap(), "plain-secret");
    }

    #[test]
    fn test_envelope_decrypt_failure_falls_back_to_ciphertext() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prod.sops.yaml");
        std::fs::write(&path, "token: ENC[AES256_GCM,data:xxxx]\nsops: {mac: m}").unwrap();

        let layer = load_layer(&path, Some(&FailingDecryptor)).unwrap();
        assert_eq!(layer.get("token").unwrap(), "ENC[AES256_GCM,data:xxxx]");
        // Marker key is not stripped here
        assert!(layer.get(ENVELOPE_MARKER_KEY).is_some());
    }

    #[test]
    fn test_envelope_skipped_parses_raw() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prod.sops.yaml");
        std::fs::write(&path, "token: ENC[data]").unwrap();

        let layer = load_layer(&path, None).unwrap();
        assert_eq!(layer.get("token").unwrap(), "ENC[data]");
    }
}
