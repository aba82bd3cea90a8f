//! Command line and environment configuration.
//!
//! `.env` is loaded before parsing, so every flag with an `env` fallback can
//! also come from that file. `AppConfig::from_args` validates once and hands
//! typed settings to the POS client, the uploader and the delivery pipeline.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{Parser, ValueEnum};

use mallfeed_core::tenants::DEFAULT_TENANT_FILE;
use mallfeed_pos_client::window::{parse_timezone, today, DEFAULT_TIMEZONE};
use mallfeed_pos_client::{ApiConfig, DEFAULT_API_BASE};

use crate::delivery::sftp::{expand_path, resolve_auth, SftpConfig, DEFAULT_KNOWN_HOSTS};
use crate::delivery::DeliveryPolicy;
use crate::exit_codes::{EXIT_MISSING_SFTP_CREDENTIALS, EXIT_MISSING_TOKEN};
use crate::CliError;

#[derive(Parser, Debug, Clone)]
#[command(name = "mallfeed")]
#[command(about = "Daily sales data submission program")]
#[command(long_version = crate::long_version())]
#[command(version)]
#[command(after_help = "\
Examples:
  mallfeed                          write today's files, keep them locally
  mallfeed --date 2024-12-25 -s     submit Christmas Day, then delete local files
  mallfeed --date -s                submit today (bare --date means today)
  mallfeed -s -k                    submit today and keep the local copies

Thank you!")]
pub struct Args {
    /// Business date to summarize, default is today
    #[arg(long, value_name = "YYYY-MM-DD", num_args = 0..=1)]
    pub date: Option<Option<String>>,

    /// Do not remove sale file after submit
    #[arg(short = 'k', long)]
    pub keep: bool,

    /// Submit sale file to mall's server
    #[arg(short = 's', long)]
    pub submit: bool,

    /// Tenant list, one `tenantName|lotCode` per line
    #[arg(long, value_name = "PATH", default_value = DEFAULT_TENANT_FILE)]
    pub tenants: String,

    /// Directory the sales files are written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub work_dir: String,

    /// Directory on the mall's server to upload into
    #[arg(long, value_name = "DIR", env = "REMOTE_DIR")]
    pub remote_dir: Option<String>,

    /// IANA timezone the business day is counted in
    #[arg(long, value_name = "ZONE", default_value = DEFAULT_TIMEZONE)]
    pub timezone: String,

    /// POS environment; selects TOKEN or TEST_TOKEN
    #[arg(long, value_enum, env = "POS_ENV", default_value = "production")]
    pub api_env: ApiEnv,

    /// POS API base URL
    #[arg(long, value_name = "URL", env = "POS_API_BASE")]
    pub api_base: Option<String>,

    /// POS API token (production)
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// POS API token (test)
    #[arg(long, env = "TEST_TOKEN", hide_env_values = true)]
    pub test_token: Option<String>,

    #[arg(long, env = "FTP_HOST", default_value = "localhost")]
    pub sftp_host: String,

    #[arg(long, env = "PORT", default_value_t = 22)]
    pub sftp_port: u16,

    #[arg(long, env = "FTP_USERNAME")]
    pub sftp_user: Option<String>,

    #[arg(long, env = "FTP_PASSWORD", hide_env_values = true)]
    pub sftp_password: Option<String>,

    /// Private key for SFTP; takes priority over the password
    #[arg(long, value_name = "PATH", env = "FTP_PRIVATE_KEY")]
    pub sftp_key: Option<PathBuf>,

    #[arg(long, env = "FTP_KEY_PASSPHRASE", hide_env_values = true)]
    pub sftp_passphrase: Option<String>,

    #[arg(long, value_name = "PATH", default_value = DEFAULT_KNOWN_HOSTS)]
    pub known_hosts: String,

    /// Accept and save the server's host key if it is not yet known
    #[arg(long)]
    pub trust_on_first_use: bool,

    /// Extra attempts for rate-limited or failed API requests
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub max_retries: u32,

    /// Network timeout in seconds (HTTP requests and SFTP session)
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Log level or filter directives (e.g. `debug`, `info,mallfeed_cli=debug`)
    #[arg(long, value_name = "LEVEL", env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApiEnv {
    Production,
    Test,
}

impl ApiEnv {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiEnv::Production => "production",
            ApiEnv::Test => "test",
        }
    }

    fn token_var(self) -> &'static str {
        match self {
            ApiEnv::Production => "TOKEN",
            ApiEnv::Test => "TEST_TOKEN",
        }
    }
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub business_date: NaiveDate,
    pub timezone: Tz,
    pub tenant_file: PathBuf,
    pub api_env: ApiEnv,
    pub api: ApiConfig,
    /// `None` means dry run.
    pub sftp: Option<SftpConfig>,
    pub policy: DeliveryPolicy,
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Result<Self, CliError> {
        let timezone = parse_timezone(&args.timezone).map_err(CliError::args)?;

        let business_date = match args.date.as_ref().and_then(|d| d.as_deref()) {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                CliError::args(format!("invalid date {:?}", raw)).with_hint("use YYYY-MM-DD")
            })?,
            None => today(timezone),
        };

        let token = match args.api_env {
            ApiEnv::Production => args.token.as_deref(),
            ApiEnv::Test => args.test_token.as_deref(),
        }
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            CliError {
                code: EXIT_MISSING_TOKEN,
                message: format!("no POS API token for the {} environment", args.api_env.as_str()),
                hint: None,
            }
            .with_hint(format!(
                "set {} in the environment or .env",
                args.api_env.token_var()
            ))
        })?;

        let timeout = Duration::from_secs(args.timeout);
        let mut api = ApiConfig::new(token)
            .with_api_base(args.api_base.as_deref().unwrap_or(DEFAULT_API_BASE));
        api.timeout = timeout;
        api.max_retries = args.max_retries;

        let sftp = if args.submit {
            Some(sftp_config(args, timeout)?)
        } else {
            None
        };

        let policy = DeliveryPolicy {
            work_dir: PathBuf::from(expand_path(&args.work_dir)),
            remote_dir: args.remote_dir.clone().filter(|d| !d.trim().is_empty()),
            remove_after: !args.keep,
        };

        Ok(Self {
            business_date,
            timezone,
            tenant_file: PathBuf::from(expand_path(&args.tenants)),
            api_env: args.api_env,
            api,
            sftp,
            policy,
        })
    }

    pub fn submit(&self) -> bool {
        self.sftp.is_some()
    }
}

fn sftp_config(args: &Args, timeout: Duration) -> Result<SftpConfig, CliError> {
    let username = args
        .sftp_user
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| {
            CliError {
                code: EXIT_MISSING_SFTP_CREDENTIALS,
                message: "--submit needs an SFTP username".to_string(),
                hint: None,
            }
            .with_hint("set FTP_USERNAME (and FTP_PASSWORD or FTP_PRIVATE_KEY)")
        })?;

    Ok(SftpConfig {
        host: args.sftp_host.trim().to_string(),
        port: args.sftp_port,
        username: username.to_string(),
        auth: resolve_auth(
            args.sftp_key.as_deref(),
            args.sftp_passphrase.as_deref(),
            args.sftp_password.as_deref(),
        ),
        known_hosts_path: expand_path(&args.known_hosts),
        trust_on_first_use: args.trust_on_first_use,
        timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::sftp::SftpAuth;
    use crate::exit_codes::EXIT_USAGE;

    /// Flags only; never reads the process environment.
    fn base_args() -> Args {
        Args {
            date: Some(Some("2024-12-25".into())),
            keep: false,
            submit: false,
            tenants: DEFAULT_TENANT_FILE.into(),
            work_dir: ".".into(),
            remote_dir: None,
            timezone: DEFAULT_TIMEZONE.into(),
            api_env: ApiEnv::Production,
            api_base: None,
            token: Some("prod-token".into()),
            test_token: None,
            sftp_host: "localhost".into(),
            sftp_port: 22,
            sftp_user: None,
            sftp_password: None,
            sftp_key: None,
            sftp_passphrase: None,
            known_hosts: "/tmp/known_hosts".into(),
            trust_on_first_use: false,
            max_retries: 0,
            timeout: 30,
            log_level: "info".into(),
            log_json: false,
        }
    }

    #[test]
    fn test_dry_run_defaults() {
        let config = AppConfig::from_args(&base_args()).unwrap();

        assert_eq!(config.business_date, NaiveDate::from_ymd_opt(2024, 12, 25).unwrap());
        assert_eq!(config.timezone, chrono_tz::Asia::Kuala_Lumpur);
        assert_eq!(config.api.max_retries, 0);
        assert_eq!(config.api.token, "prod-token");
        assert_eq!(config.api.api_base, DEFAULT_API_BASE);
        assert!(!config.submit());
        assert!(config.policy.remove_after);
        assert_eq!(config.tenant_file, PathBuf::from("tenant.txt"));
    }

    #[test]
    fn test_keep_disables_remove_after() {
        let mut args = base_args();
        args.keep = true;
        assert!(!AppConfig::from_args(&args).unwrap().policy.remove_after);
    }

    #[test]
    fn test_bad_date_is_usage_error() {
        let mut args = base_args();
        args.date = Some(Some("25/12/2024".into()));
        let err = AppConfig::from_args(&args).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(err.message.contains("25/12/2024"));
    }

    #[test]
    fn test_bad_timezone_is_usage_error() {
        let mut args = base_args();
        args.timezone = "+08:00".into();
        let err = AppConfig::from_args(&args).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(err.message.contains("timezone"), "{}", err.message);
    }

    #[test]
    fn test_dst_timezone_accepted() {
        let mut args = base_args();
        args.timezone = "America/New_York".into();
        let config = AppConfig::from_args(&args).unwrap();
        assert_eq!(config.timezone, chrono_tz::America::New_York);
    }

    #[test]
    fn test_bare_date_flag_means_today() {
        let args = Args::try_parse_from(["mallfeed", "--date", "--token", "t"]).unwrap();
        assert_eq!(args.date, Some(None));

        let config = AppConfig::from_args(&args).unwrap();
        assert_eq!(config.business_date, today(config.timezone));
    }

    #[test]
    fn test_missing_date_flag_means_today() {
        let mut args = base_args();
        args.date = None;
        let config = AppConfig::from_args(&args).unwrap();
        assert_eq!(config.business_date, today(config.timezone));
    }

    #[test]
    fn test_missing_token() {
        let mut args = base_args();
        args.token = Some("   ".into());
        let err = AppConfig::from_args(&args).unwrap_err();
        assert_eq!(err.code, EXIT_MISSING_TOKEN);
        assert!(err.hint.unwrap().contains("TOKEN"));
    }

    #[test]
    fn test_test_env_uses_test_token() {
        let mut args = base_args();
        args.api_env = ApiEnv::Test;
        let err = AppConfig::from_args(&args).unwrap_err();
        assert!(err.hint.unwrap().contains("TEST_TOKEN"));

        args.test_token = Some("sandbox".into());
        assert_eq!(AppConfig::from_args(&args).unwrap().api.token, "sandbox");
    }

    #[test]
    fn test_submit_requires_username() {
        let mut args = base_args();
        args.submit = true;
        let err = AppConfig::from_args(&args).unwrap_err();
        assert_eq!(err.code, EXIT_MISSING_SFTP_CREDENTIALS);
    }

    #[test]
    fn test_submit_with_password() {
        let mut args = base_args();
        args.submit = true;
        args.sftp_user = Some("mall".into());
        args.sftp_password = Some("secret".into());
        args.sftp_port = 2222;
        args.timeout = 5;

        let config = AppConfig::from_args(&args).unwrap();
        let sftp = config.sftp.unwrap();
        assert_eq!(sftp.username, "mall");
        assert_eq!(sftp.port, 2222);
        assert_eq!(sftp.auth, SftpAuth::Password("secret".into()));
        assert_eq!(sftp.timeout, Duration::from_secs(5));
        assert_eq!(config.api.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_blank_remote_dir_is_none() {
        let mut args = base_args();
        args.remote_dir = Some("  ".into());
        assert_eq!(AppConfig::from_args(&args).unwrap().policy.remote_dir, None);
    }

    #[test]
    fn test_api_base_override() {
        let mut args = base_args();
        args.api_base = Some("http://127.0.0.1:9000/v1.0/".into());
        assert_eq!(
            AppConfig::from_args(&args).unwrap().api.api_base,
            "http://127.0.0.1:9000/v1.0"
        );
    }

    #[test]
    fn test_cli_flags_parse() {
        let args = Args::try_parse_from([
            "mallfeed",
            "--date",
            "2024-12-25",
            "-k",
            "-s",
            "--timezone",
            "America/New_York",
            "--api-env",
            "test",
        ])
        .unwrap();
        assert_eq!(args.date, Some(Some("2024-12-25".to_string())));
        assert!(args.keep);
        assert!(args.submit);
        assert_eq!(args.timezone, "America/New_York");
        assert_eq!(args.api_env, ApiEnv::Test);
    }
}
