//! SFTP uploader.
//!
//! One session per file: TCP connect (bounded) → SSH handshake → host key
//! check against `known_hosts` → authenticate → SFTP channel → write.

use std::fs;
use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ssh2::{CheckResult, HostKeyType, KnownHostFileKind, KnownHostKeyFormat, Session};

use super::{DeliveryError, Uploader};

pub const DEFAULT_KNOWN_HOSTS: &str = "~/.ssh/known_hosts";

/// How the uploader proves itself to the mall's server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SftpAuth {
    Key { path: PathBuf, passphrase: Option<String> },
    Password(String),
    Agent,
}

impl SftpAuth {
    /// Label for log lines and errors; never includes the secret.
    pub fn describe(&self) -> String {
        match self {
            SftpAuth::Key { path, .. } => format!("key {}", path.display()),
            SftpAuth::Password(_) => "password".to_string(),
            SftpAuth::Agent => "ssh-agent".to_string(),
        }
    }
}

/// Everything needed to reach the mall's server, resolved at startup.
#[derive(Debug, Clone)]
pub struct SftpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: SftpAuth,
    /// Already tilde-expanded.
    pub known_hosts_path: String,
    pub trust_on_first_use: bool,
    pub timeout: Duration,
}

pub struct SftpUploader {
    config: SftpConfig,
}

impl SftpUploader {
    pub fn new(config: SftpConfig) -> Self {
        Self { config }
    }

    fn connect(&self) -> Result<Session, DeliveryError> {
        let cfg = &self.config;
        let addrs: Vec<_> = (cfg.host.as_str(), cfg.port)
            .to_socket_addrs()
            .map_err(|e| {
                DeliveryError::Connect(format!("cannot resolve {}:{}: {}", cfg.host, cfg.port, e))
            })?
            .collect();

        let mut last_err = None;
        let mut tcp = None;
        for addr in &addrs {
            match TcpStream::connect_timeout(addr, cfg.timeout) {
                Ok(stream) => {
                    tcp = Some(stream);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }
        let tcp = tcp.ok_or_else(|| {
            DeliveryError::Connect(format!(
                "TCP connection to {}:{} failed: {}",
                cfg.host,
                cfg.port,
                last_err.map(|e| e.to_string()).unwrap_or_else(|| "no address".into()),
            ))
        })?;

        let mut session = Session::new()
            .map_err(|e| DeliveryError::Connect(format!("failed to create SSH session: {}", e)))?;
        session.set_timeout(cfg.timeout.as_millis().min(u32::MAX as u128) as u32);
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| {
            DeliveryError::Connect(format!("SSH handshake with {}:{} failed: {}", cfg.host, cfg.port, e))
        })?;

        let fingerprint = verify_host_key(
            &session,
            &cfg.host,
            cfg.port,
            &cfg.known_hosts_path,
            cfg.trust_on_first_use,
        )?;
        tracing::debug!(host = %cfg.host, %fingerprint, "host key verified");

        login(&session, &cfg.username, &cfg.host, &cfg.auth)?;

        Ok(session)
    }
}

impl Uploader for SftpUploader {
    fn upload(&self, local_path: &Path, remote_path: &str) -> Result<(), DeliveryError> {
        let bytes = fs::read(local_path).map_err(|e| {
            DeliveryError::Transfer(format!("cannot read {}: {}", local_path.display(), e))
        })?;

        tracing::info!("connecting to remote sftp server {}:{}", self.config.host, self.config.port);
        let session = self.connect()?;

        let sftp = session
            .sftp()
            .map_err(|e| DeliveryError::Transfer(format!("failed to open SFTP channel: {}", e)))?;

        let mut remote = sftp
            .create(Path::new(remote_path))
            .map_err(|e| DeliveryError::Transfer(format!("cannot create {}: {}", remote_path, e)))?;
        remote
            .write_all(&bytes)
            .and_then(|()| remote.flush())
            .map_err(|e| DeliveryError::Transfer(format!("write to {} failed: {}", remote_path, e)))?;
        drop(remote);

        tracing::debug!(remote_path, size = bytes.len(), "remote file written");
        Ok(())
    }
}

// ── Auth resolution ─────────────────────────────────────────────────

/// Private key wins over password; neither means ssh-agent.
pub fn resolve_auth(
    private_key: Option<&Path>,
    passphrase: Option<&str>,
    password: Option<&str>,
) -> SftpAuth {
    match (private_key, password) {
        (Some(key_path), _) => SftpAuth::Key {
            path: PathBuf::from(expand_path(&key_path.to_string_lossy())),
            passphrase: passphrase.filter(|p| !p.is_empty()).map(str::to_string),
        },
        (None, Some(pw)) if !pw.is_empty() => SftpAuth::Password(pw.to_string()),
        (None, _) => SftpAuth::Agent,
    }
}

fn login(session: &Session, username: &str, host: &str, auth: &SftpAuth) -> Result<(), DeliveryError> {
    let attempt = match auth {
        SftpAuth::Key { path, passphrase } => {
            session.userauth_pubkey_file(username, None, path, passphrase.as_deref())
        }
        SftpAuth::Password(pw) => session.userauth_password(username, pw),
        SftpAuth::Agent => session.userauth_agent(username),
    };
    let rejected =
        |reason: String| DeliveryError::Auth(format!("{}@{} ({}): {}", username, host, auth.describe(), reason));

    attempt.map_err(|e| rejected(e.message().to_string()))?;
    if !session.authenticated() {
        return Err(rejected("server did not accept the session".to_string()));
    }
    tracing::debug!(user = username, method = %auth.describe(), "sftp login accepted");
    Ok(())
}

// ── Host key verification ───────────────────────────────────────────

fn verify_host_key(
    session: &Session,
    host: &str,
    port: u16,
    known_hosts_path: &str,
    trust_on_first_use: bool,
) -> Result<String, DeliveryError> {
    let (host_key, key_type) = session
        .host_key()
        .ok_or_else(|| DeliveryError::HostKey("server did not provide a host key".into()))?;
    let fingerprint = fingerprint(host_key);

    let mut known_hosts = session
        .known_hosts()
        .map_err(|e| DeliveryError::HostKey(format!("failed to init known_hosts: {}", e)))?;

    let kh_path = Path::new(known_hosts_path);
    if kh_path.exists() {
        known_hosts
            .read_file(kh_path, KnownHostFileKind::OpenSSH)
            .map_err(|e| {
                DeliveryError::HostKey(format!("failed to read {}: {}", known_hosts_path, e))
            })?;
    }

    match known_hosts.check_port(host, port, host_key) {
        CheckResult::Match => Ok(fingerprint),

        CheckResult::NotFound if trust_on_first_use => {
            let key_format = known_host_format(key_type)?;
            let entry = if port == 22 { host.to_string() } else { format!("[{}]:{}", host, port) };
            known_hosts
                .add(&entry, host_key, "", key_format)
                .map_err(|e| DeliveryError::HostKey(format!("failed to add host key: {}", e)))?;

            if let Some(parent) = kh_path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            known_hosts
                .write_file(kh_path, KnownHostFileKind::OpenSSH)
                .map_err(|e| {
                    DeliveryError::HostKey(format!(
                        "failed to write known_hosts to {}: {}",
                        known_hosts_path, e
                    ))
                })?;

            tracing::warn!(
                "host key for {}:{} accepted on first use ({}) and saved to {}",
                host,
                port,
                fingerprint,
                known_hosts_path,
            );
            Ok(fingerprint)
        }

        CheckResult::NotFound => Err(DeliveryError::HostKey(format!(
            "host key for {}:{} not found in {} (presented {}); \
             rerun with --trust-on-first-use to accept it",
            host, port, known_hosts_path, fingerprint,
        ))),

        CheckResult::Mismatch => Err(DeliveryError::HostKey(format!(
            "HOST KEY MISMATCH for {}:{} (presented {}); the entry in {} no longer matches",
            host, port, fingerprint, known_hosts_path,
        ))),

        CheckResult::Failure => Err(DeliveryError::HostKey(format!(
            "host key check failed for {}:{}: internal error",
            host, port,
        ))),
    }
}

fn known_host_format(key_type: HostKeyType) -> Result<KnownHostKeyFormat, DeliveryError> {
    match key_type {
        HostKeyType::Rsa => Ok(KnownHostKeyFormat::SshRsa),
        HostKeyType::Dss => Ok(KnownHostKeyFormat::SshDss),
        HostKeyType::Ed25519 => Ok(KnownHostKeyFormat::Ed25519),
        HostKeyType::Ecdsa256 => Ok(KnownHostKeyFormat::Ecdsa256),
        HostKeyType::Ecdsa384 => Ok(KnownHostKeyFormat::Ecdsa384),
        HostKeyType::Ecdsa521 => Ok(KnownHostKeyFormat::Ecdsa521),
        other => Err(DeliveryError::HostKey(format!("unsupported host key type: {:?}", other))),
    }
}

/// OpenSSH-style `SHA256:<base64>` fingerprint of raw key bytes.
fn fingerprint(key: &[u8]) -> String {
    use sha2::Digest;
    let hash = sha2::Sha256::digest(key);
    format!(
        "SHA256:{}",
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD_NO_PAD, hash),
    )
}

pub fn expand_path(path: &str) -> String {
    shellexpand::tilde(path).to_string()
}
