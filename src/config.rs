// ABOUTME: Connection configuration: address, auth, timeouts, and optional TLS parameters.
// ABOUTME: Consuming `with_*` builder style throughout.

use std::time::Duration;

/// TLS parameters for a connection. Loading certificate/key material
/// from disk is the caller's job; this struct only carries the bytes.
#[derive(Clone, Debug, Default)]
pub struct TlsConfig {
    pub enabled: bool,
    /// Verify the server's certificate. Disabling this is only ever
    /// appropriate against a known-trusted host during development.
    pub verify_server_cert: bool,
    /// PEM-encoded CA certificate(s) to trust, in addition to (or instead
    /// of) the platform trust store.
    pub ca_cert: Option<Vec<u8>>,
    /// PEM-encoded client certificate, for mutual TLS.
    pub client_cert: Option<Vec<u8>>,
    /// PEM-encoded client private key, for mutual TLS.
    pub client_key: Option<Vec<u8>>,
}

impl TlsConfig {
    pub fn enabled() -> TlsConfig {
        TlsConfig {
            enabled: true,
            verify_server_cert: true,
            ..Default::default()
        }
    }

    pub fn without_server_verification(mut self) -> TlsConfig {
        self.verify_server_cert = false;
        self
    }

    pub fn with_ca_cert(mut self, pem: impl Into<Vec<u8>>) -> TlsConfig {
        self.ca_cert = Some(pem.into());
        self
    }

    pub fn with_client_identity(
        mut self,
        cert_pem: impl Into<Vec<u8>>,
        key_pem: impl Into<Vec<u8>>,
    ) -> TlsConfig {
        self.client_cert = Some(cert_pem.into());
        self.client_key = Some(key_pem.into());
        self
    }
}

/// Connection-level configuration: where to connect, how to authenticate,
/// and the timeouts that govern `connect`/`send`.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: Option<i64>,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    /// Interval between liveness `PING`s while connected. `None` disables
    /// the periodic check (default 30s).
    pub liveness_interval: Option<Duration>,
    pub tls: TlsConfig,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> ConnectionConfig {
        ConnectionConfig {
            host: host.into(),
            port,
            password: None,
            db: None,
            connect_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(5),
            liveness_interval: Some(Duration::from_secs(30)),
            tls: TlsConfig::default(),
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> ConnectionConfig {
        self.password = Some(password.into());
        self
    }

    pub fn with_db(mut self, db: i64) -> ConnectionConfig {
        self.db = Some(db);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> ConnectionConfig {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> ConnectionConfig {
        self.command_timeout = timeout;
        self
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> ConnectionConfig {
        self.tls = tls;
        self
    }

    pub fn with_liveness_interval(mut self, interval: Duration) -> ConnectionConfig {
        self.liveness_interval = Some(interval);
        self
    }

    pub fn without_liveness(mut self) -> ConnectionConfig {
        self.liveness_interval = None;
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_are_sane() {
        let cfg = ConnectionConfig::new("localhost", 6379);
        assert_eq!(cfg.addr(), "localhost:6379");
        assert!(cfg.password.is_none());
        assert!(!cfg.tls.enabled);
    }

    #[test]
    fn builder_chains_overrides() {
        let cfg = ConnectionConfig::new("db.internal", 6380)
            .with_password("hunter2")
            .with_db(3)
            .with_tls(TlsConfig::enabled().with_ca_cert(b"pem".to_vec()));
        assert_eq!(cfg.password.as_deref(), Some("hunter2"));
        assert_eq!(cfg.db, Some(3));
        assert!(cfg.tls.enabled);
        assert!(cfg.tls.verify_server_cert);
    }
}
