//! Secret decryption integration
//!
//! Layer loading consumes decryption through the `SecretDecryptor` trait and
//! never sees key material. `SopsDecryptor` is the bundled implementation:
//! it stages ciphertext to a temporary file and shells out to the `sops`
//! binary, passing key settings through the environment. The staged file is
//! removed on every exit path by the tempfile RAII guard.

use std::path::PathBuf;
use std::process::Command;
use thiserror::Error as ThisError;

/// Failure reported by a secret decryptor
#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct DecryptError {
    pub message: String,
}

impl DecryptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The external secret decryptor contract
///
/// Implementations must be stateless from the resolver's point of view: the
/// same ciphertext always yields the same plaintext or the same error.
pub trait SecretDecryptor: Send + Sync {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, DecryptError>;
}

/// Key settings for the sops subprocess, opaque to layer loading
#[derive(Debug, Clone, Default)]
pub struct SecretSettings {
    /// Private age key file, exported as SOPS_AGE_KEY_FILE
    pub age_key_file: Option<PathBuf>,

    /// GnuPG home directory, exported as GNUPGHOME
    pub gnupg_home: Option<PathBuf>,
}

/// Decryptor shelling out to the `sops` binary
pub struct SopsDecryptor {
    binary: PathBuf,
    settings: SecretSettings,
}

impl SopsDecryptor {
    pub fn new(settings: SecretSettings) -> Self {
        Self {
            binary: PathBuf::from("sops"),
            settings,
        }
    }

    /// Use a specific sops binary instead of resolving via PATH
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }
}

impl SecretDecryptor for SopsDecryptor {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, DecryptError> {
        use std::io::Write;

        // sops wants a file; stage the ciphertext and let the guard clean up
        let mut staged = tempfile::Builder::new()
            .prefix(".flock-secret-")
            .suffix(".yaml")
            .tempfile()
            .map_err(|e| DecryptError::new(format!("failed to stage ciphertext: {}", e)))?;
        staged
            .write_all(ciphertext)
            .and_then(|_| staged.flush())
            .map_err(|e| DecryptError::new(format!("failed to stage ciphertext: {}", e)))?;

        let mut command = Command::new(&self.binary);
        command.arg("--decrypt").arg(staged.path());
        if let Some(key_file) = &self.settings.age_key_file {
            command.env("SOPS_AGE_KEY_FILE", key_file);
        }
        if let Some(gnupg_home) = &self.settings.gnupg_home {
            command.env("GNUPGHOME", gnupg_home);
        }

        let output = command.output().map_err(|e| {
            DecryptError::new(format!("failed to run {}: {}", self.binary.display(), e))
        })?;

        if !output.status.success() {
            return Err(DecryptError::new(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_error() {
        let decryptor =
            SopsDecryptor::new(SecretSettings::default()).with_binary("flock-no-such-binary");
        let err = decryptor.decrypt(b"payload").unwrap_err();
        assert!(err.message.contains("failed to run"));
    }

    #[test]
    fn test_settings_default_empty() {
        let settings = SecretSettings::default();
        assert!(settings.age_key_file.is_none());
        assert!(settings.gnupg_home.is_none());
    }
}
