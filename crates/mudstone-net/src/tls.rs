//! TLS configuration.
//!
//! Builds a rustls server config from PEM files. The record layer is
//! invisible above the framing: a TLS descriptor exposes the same
//! byte-oriented read/write surface as a plain one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::prelude::*;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;

use crate::error::{NetError, NetResult};

/// TLS listener configuration.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Certificate chain file (PEM).
    pub cert_path: PathBuf,
    /// Private key file (PEM, PKCS#8 or PKCS#1).
    pub key_path: PathBuf,
}

impl TlsConfig {
    pub fn new(cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> Self {
        TlsConfig {
            cert_path: cert_path.as_ref().to_path_buf(),
            key_path: key_path.as_ref().to_path_buf(),
        }
    }

    /// Builds the rustls server config.
    pub fn build(&self) -> NetResult<Arc<ServerConfig>> {
        let certs = load_certs(&self.cert_path)?;
        let key = load_private_key(&self.key_path)?;
        let config = ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(|e| NetError::Tls(e.to_string()))?;
        Ok(Arc::new(config))
    }
}

fn load_certs(path: &Path) -> NetResult<Vec<CertificateDer<'static>>> {
    let pem = std::fs::read(path)
        .map_err(|e| NetError::Tls(format!("read {}: {e}", path.display())))?;
    let certs: Vec<CertificateDer<'static>> = pem_blocks(&pem, "CERTIFICATE")
        .into_iter()
        .map(CertificateDer::from)
        .collect();
    if certs.is_empty() {
        return Err(NetError::Tls(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> NetResult<PrivateKeyDer<'static>> {
    let pem = std::fs::read(path)
        .map_err(|e| NetError::Tls(format!("read {}: {e}", path.display())))?;
    if let Some(der) = pem_blocks(&pem, "PRIVATE KEY").into_iter().next() {
        return PrivateKeyDer::try_from(der).map_err(|e| NetError::Tls(e.to_string()));
    }
    if let Some(der) = pem_blocks(&pem, "RSA PRIVATE KEY").into_iter().next() {
        return Ok(PrivateKeyDer::Pkcs1(der.into()));
    }
    Err(NetError::Tls(format!(
        "no private key found in {}",
        path.display()
    )))
}

/// Decodes every PEM block with the given label.
fn pem_blocks(pem: &[u8], label: &str) -> Vec<Vec<u8>> {
    let text = String::from_utf8_lossy(pem);
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");
    let mut blocks = Vec::new();
    let mut rest = text.as_ref();
    while let Some(start) = rest.find(&begin) {
        let after = &rest[start + begin.len()..];
        let Some(stop) = after.find(&end) else { break };
        let body: String = after[..stop].chars().filter(|c| !c.is_whitespace()).collect();
        if let Ok(bytes) = BASE64_STANDARD.decode(&body) {
            blocks.push(bytes);
        }
        rest = &after[stop + end.len()..];
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pem_blocks_extracts_label() {
        let pem = b"-----BEGIN CERTIFICATE-----\naGVsbG8=\n-----END CERTIFICATE-----\n";
        let blocks = pem_blocks(pem, "CERTIFICATE");
        assert_eq!(blocks, vec![b"hello".to_vec()]);
    }

    #[test]
    fn garbage_blocks_are_skipped() {
        let pem = b"-----BEGIN CERTIFICATE-----\n!!not base64!!\n-----END CERTIFICATE-----\n";
        assert!(pem_blocks(pem, "CERTIFICATE").is_empty());
    }

    #[test]
    fn missing_cert_file_is_a_tls_error() {
        let config = TlsConfig::new("/nonexistent/cert.pem", "/nonexistent/key.pem");
        assert!(matches!(config.build(), Err(NetError::Tls(_))));
    }
}
