//! SSH local port forwarding.
//!
//! [`SshTunnel::open`] authenticates against the SSH endpoint with a private
//! key, binds an ephemeral port on `127.0.0.1`, and forwards every connection
//! accepted there to `remote_host:remote_port` as seen from the SSH server.
//! The database client then connects to the local port as if the database
//! were local.

use crate::config::TunnelSettings;
use crate::error::{DictError, Result, ResultExt as _};
use russh::client::{self, Handle};
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key, ssh_key};
use russh::Disconnect;
use secrecy::ExposeSecret as _;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const LOCAL_BIND_ADDR: &str = "127.0.0.1";

/// Session handler; only decides whether the server key is acceptable.
struct TunnelClient {
    expected_fingerprint: Option<String>,
}

impl client::Handler for TunnelClient {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let actual = server_public_key
            .fingerprint(ssh_key::HashAlg::Sha256)
            .to_string();
        match &self.expected_fingerprint {
            Some(expected) => {
                let accepted = fingerprint_matches(expected, &actual);
                if !accepted {
                    tracing::error!("SSH host key mismatch: expected {expected}, server offered {actual}");
                }
                Ok(accepted)
            }
            None => {
                tracing::warn!("Accepting SSH host key {actual} without verification");
                Ok(true)
            }
        }
    }
}

/// Compare fingerprints, ignoring surrounding whitespace and an optional
/// `SHA256:` prefix on the expected value.
pub fn fingerprint_matches(expected: &str, actual: &str) -> bool {
    let strip = |s: &str| s.trim().trim_start_matches("SHA256:").to_owned();
    strip(expected) == strip(actual)
}

/// An open SSH session forwarding a local port to a remote address.
pub struct SshTunnel {
    session: Arc<Handle<TunnelClient>>,
    local_addr: SocketAddr,
    forwarder: JoinHandle<()>,
}

impl SshTunnel {
    /// Connect, authenticate, and start forwarding.
    ///
    /// # Errors
    ///
    /// Returns `DictError::Tunnel` if the endpoint is unreachable within
    /// `timeout`, the key cannot be loaded, the host key is rejected, or
    /// authentication fails. Returns `DictError::Io` if the local port
    /// cannot be bound.
    pub async fn open(
        settings: &TunnelSettings,
        remote_host: &str,
        remote_port: u16,
        timeout: Duration,
    ) -> Result<Self> {
        let key = load_secret_key(
            &settings.private_key_path,
            settings
                .private_key_passphrase
                .as_ref()
                .map(|p| p.expose_secret()),
        )
        .with_context(|| {
            format!(
                "Failed to load private key {}",
                settings.private_key_path.display()
            )
        })?;

        let config = Arc::new(client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(Duration::from_secs(30)),
            ..Default::default()
        });
        let handler = TunnelClient {
            expected_fingerprint: settings.host_key_fingerprint.clone(),
        };

        tracing::info!(
            "Opening SSH tunnel via {}@{}:{}",
            settings.username,
            settings.host,
            settings.port
        );

        let connect = client::connect(config, (settings.host.as_str(), settings.port), handler);
        let mut session = tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| {
                DictError::Tunnel(format!(
                    "Timed out after {}s connecting to {}:{}",
                    timeout.as_secs(),
                    settings.host,
                    settings.port
                ))
            })?
            .with_context(|| format!("Failed to connect to {}:{}", settings.host, settings.port))?;

        let hash_alg = session.best_supported_rsa_hash().await?.flatten();
        let auth = session
            .authenticate_publickey(
                settings.username.clone(),
                PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
            )
            .await?;
        if !auth.success() {
            return Err(DictError::Tunnel(format!(
                "Public key authentication rejected for user '{}'",
                settings.username
            )));
        }

        let listener = TcpListener::bind((LOCAL_BIND_ADDR, 0))
            .await
            .context("Failed to bind local tunnel port")?;
        let local_addr = listener.local_addr()?;

        let session = Arc::new(session);
        let forwarder = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&session),
            remote_host.to_owned(),
            remote_port,
        ));

        tracing::info!(
            "Tunnel ready: {local_addr} -> {remote_host}:{remote_port} (via {})",
            settings.host
        );

        Ok(Self {
            session,
            local_addr,
            forwarder,
        })
    }

    /// Local port the remote address is reachable on.
    pub fn local_port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Stop forwarding and disconnect the SSH session.
    pub async fn close(self) {
        self.forwarder.abort();
        if let Err(e) = self
            .session
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
        {
            tracing::debug!("SSH disconnect: {e}");
        }
        tracing::info!("SSH tunnel closed");
    }
}

async fn accept_loop(
    listener: TcpListener,
    session: Arc<Handle<TunnelClient>>,
    remote_host: String,
    remote_port: u16,
) {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::error!("Tunnel listener failed: {e}");
                return;
            }
        };
        tracing::debug!("Forwarding connection from {peer}");
        tokio::spawn(forward(
            socket,
            peer,
            Arc::clone(&session),
            remote_host.clone(),
            remote_port,
        ));
    }
}

async fn forward(
    mut socket: TcpStream,
    peer: SocketAddr,
    session: Arc<Handle<TunnelClient>>,
    remote_host: String,
    remote_port: u16,
) {
    let channel = match session
        .channel_open_direct_tcpip(
            remote_host.as_str(),
            u32::from(remote_port),
            peer.ip().to_string(),
            u32::from(peer.port()),
        )
        .await
    {
        Ok(channel) => channel,
        Err(e) => {
            tracing::error!("Failed to open forwarding channel to {remote_host}:{remote_port}: {e}");
            return;
        }
    };

    let mut stream = channel.into_stream();
    match tokio::io::copy_bidirectional(&mut socket, &mut stream).await {
        Ok((sent, received)) => {
            tracing::debug!("Connection from {peer} finished ({sent} bytes out, {received} bytes in)");
        }
        Err(e) => tracing::debug!("Connection from {peer} ended: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_matches_with_and_without_prefix() {
        let actual = "SHA256:nThbg6kXUpJWGl7E1IGOCspRomTxdCARLviKw6E5SY8";
        assert!(fingerprint_matches(actual, actual));
        assert!(fingerprint_matches(
            " nThbg6kXUpJWGl7E1IGOCspRomTxdCARLviKw6E5SY8 ",
            actual
        ));
        assert!(!fingerprint_matches("SHA256:somethingelse", actual));
    }
}
