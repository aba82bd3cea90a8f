//! Delivery pipeline: local write → transfer → cleanup.
//!
//! ```text
//! Rendered → LocallyWritten → TransferAttempted → {Delivered, Failed} → Cleaned/Retained
//! ```
//!
//! Without an uploader (dry run) the file is written and kept as the
//! artifact of record. With one, the file is pushed and then, if
//! `remove_after` is set, deleted whether or not the push succeeded.

pub mod sftp;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mallfeed_core::SalesFile;

/// Pushes a local file to the mall's server.
pub trait Uploader {
    fn upload(&self, local_path: &Path, remote_path: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Local file could not be written; nothing was transferred.
    Export(String),
    /// TCP connect or SSH handshake failed.
    Connect(String),
    /// Server host key unknown or changed.
    HostKey(String),
    /// Server rejected our credentials.
    Auth(String),
    /// SFTP channel or file push failed.
    Transfer(String),
}

impl DeliveryError {
    /// Short label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Export(_) => "export",
            Self::Connect(_) => "connect",
            Self::HostKey(_) => "host_key",
            Self::Auth(_) => "auth",
            Self::Transfer(_) => "transfer",
        }
    }
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Export(msg) => write!(f, "export failed: {msg}"),
            Self::Connect(msg) => write!(f, "connection failed: {msg}"),
            Self::HostKey(msg) => write!(f, "host key rejected: {msg}"),
            Self::Auth(msg) => write!(f, "authentication failed: {msg}"),
            Self::Transfer(msg) => write!(f, "transfer failed: {msg}"),
        }
    }
}

impl std::error::Error for DeliveryError {}

#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    /// Directory the sales file is written to.
    pub work_dir: PathBuf,
    /// Remote directory; `None` pushes to the bare file name.
    pub remote_dir: Option<String>,
    /// Delete the local file after the transfer attempt.
    pub remove_after: bool,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self { work_dir: PathBuf::from("."), remote_dir: None, remove_after: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Delivered { remote_path: String },
    /// Dry run: written locally only.
    Retained,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleanup {
    Removed,
    AlreadyAbsent,
    Kept,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub local_path: PathBuf,
    pub outcome: Outcome,
    pub cleanup: Cleanup,
}

/// Write `file`, push it when an uploader is given, then apply cleanup.
pub fn deliver(
    file: &SalesFile,
    policy: &DeliveryPolicy,
    uploader: Option<&dyn Uploader>,
) -> Result<DeliveryReport, DeliveryError> {
    let local_path = write_local(&policy.work_dir, file)
        .inspect_err(|e| tracing::error!(kind = e.kind(), "{}: {}", file.name, e))?;

    let Some(uploader) = uploader else {
        return Ok(DeliveryReport { local_path, outcome: Outcome::Retained, cleanup: Cleanup::Kept });
    };

    let remote = remote_path(policy.remote_dir.as_deref(), &file.name);
    let pushed = uploader.upload(&local_path, &remote);
    match &pushed {
        Ok(()) => tracing::info!("submit {} to {}", local_path.display(), remote),
        Err(e @ DeliveryError::Auth(_)) => tracing::warn!(kind = e.kind(), "{}: {}", file.name, e),
        Err(e) => tracing::error!(kind = e.kind(), "{}: {}", file.name, e),
    }

    let cleanup = if policy.remove_after {
        match remove_local(&local_path) {
            Ok(cleanup) => cleanup,
            Err(e) => {
                tracing::error!("cannot delete {}: {}", local_path.display(), e);
                Cleanup::Kept
            }
        }
    } else {
        Cleanup::Kept
    };

    pushed.map(|()| DeliveryReport {
        local_path,
        outcome: Outcome::Delivered { remote_path: remote },
        cleanup,
    })
}

/// Write the sales file into `work_dir`, replacing any previous copy.
pub fn write_local(work_dir: &Path, file: &SalesFile) -> Result<PathBuf, DeliveryError> {
    let path = work_dir.join(&file.name);
    fs::write(&path, file.content.as_bytes())
        .map_err(|e| DeliveryError::Export(format!("cannot write {}: {}", path.display(), e)))?;
    tracing::info!("export {} to {}", file.content, path.display());
    Ok(path)
}

/// Delete a local sales file. A file that is already gone is not an error.
pub fn remove_local(path: &Path) -> io::Result<Cleanup> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::info!("delete {} in localpath", path.display());
            Ok(Cleanup::Removed)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("{} already absent", path.display());
            Ok(Cleanup::AlreadyAbsent)
        }
        Err(e) => Err(e),
    }
}

pub fn remote_path(remote_dir: Option<&str>, file_name: &str) -> String {
    match remote_dir.map(|d| d.trim_end_matches('/')) {
        None | Some("") => file_name.to_string(),
        Some(dir) => format!("{dir}/{file_name}"),
    }
}
