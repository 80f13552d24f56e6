//! Builds a `rustls::ClientConfig` from a [`Tls`] trust policy.

use crate::conn::params::{ServerCerts, Tls};
use crate::error::{HdbError, HdbResult};
use rustls::client::{ServerCertVerified, ServerCertVerifier, ServerName};
use rustls::{Certificate, ClientConfig, OwnedTrustAnchor, RootCertStore};
use std::sync::Arc;

pub(crate) fn client_config(tls: &Tls) -> HdbResult<ClientConfig> {
    match tls {
        Tls::Off => Err(HdbError::TlsInit(
            "client_config called with Tls::Off".to_string(),
        )),
        Tls::Secure(server_certs) => {
            let mut root_store = RootCertStore::empty();
            for server_cert in server_certs {
                add_server_cert(&mut root_store, server_cert)?;
            }
            Ok(ClientConfig::builder()
                .with_safe_defaults()
                .with_root_certificates(root_store)
                .with_no_client_auth())
        }
        Tls::Insecure => Ok(ClientConfig::builder()
            .with_safe_defaults()
            .with_custom_certificate_verifier(Arc::new(NoCertificateVerification))
            .with_no_client_auth()),
    }
}

fn add_server_cert(root_store: &mut RootCertStore, server_cert: &ServerCerts) -> HdbResult<()> {
    match server_cert {
        ServerCerts::RootCertificates => {
            root_store.add_server_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.0.iter().map(|ta| {
                OwnedTrustAnchor::from_subject_spki_name_constraints(
                    ta.subject,
                    ta.spki,
                    ta.name_constraints,
                )
            }));
            Ok(())
        }
        ServerCerts::Direct(pem) => parse_pem_into(root_store, pem.clone().into_bytes()),
        ServerCerts::Environment(env_var) => {
            let pem = std::env::var(env_var).map_err(|e| {
                HdbError::TlsInit(format!("environment variable {env_var} not found: {e}"))
            })?;
            parse_pem_into(root_store, pem.into_bytes())
        }
        ServerCerts::Directory(dir) => {
            for entry in std::fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().and_then(std::ffi::OsStr::to_str) == Some("pem") {
                    let bytes = std::fs::read(&path)?;
                    parse_pem_into(root_store, bytes)?;
                }
            }
            Ok(())
        }
    }
}

fn parse_pem_into(root_store: &mut RootCertStore, pem_bytes: Vec<u8>) -> HdbResult<()> {
    let der_certs = rustls_pemfile::certs(&mut pem_bytes.as_slice())
        .map_err(|e| HdbError::TlsInit(format!("failed to parse PEM certificate: {e}")))?;
    let (n_ok, n_err) = root_store.add_parsable_certificates(&der_certs);
    if n_ok == 0 {
        log::warn!("none of the provided server certificates were accepted");
    } else if n_err > 0 {
        log::warn!("not all of the provided server certificates were accepted");
    }
    Ok(())
}

struct NoCertificateVerification;

impl ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: std::time::SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }
}
