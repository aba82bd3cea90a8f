// mallfeed - daily per-outlet sales submission to the mall's SFTP server

use std::process::ExitCode;

use clap::Parser;

use mallfeed_cli::config::{AppConfig, Args};
use mallfeed_cli::delivery::sftp::SftpUploader;
use mallfeed_cli::delivery::Uploader;
use mallfeed_cli::exit_codes::EXIT_SUCCESS;
use mallfeed_cli::logging::setup_logging;
use mallfeed_cli::run::run_outlets;
use mallfeed_cli::CliError;
use mallfeed_core::load_tenants;
use mallfeed_pos_client::PosClient;

fn main() -> ExitCode {
    // A missing .env is fine; the process environment may already be set.
    dotenvy::dotenv().ok();
    let args = Args::parse();
    setup_logging(&args.log_level, args.log_json);

    match run(&args) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e.message);
            if let Some(hint) = &e.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(e.code)
        }
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let config = AppConfig::from_args(args)?;
    let tenants = load_tenants(&config.tenant_file).map_err(|e| {
        CliError::tenants(e).with_hint("one `tenantName|lotCode` per line; see --tenants")
    })?;

    tracing::info!(
        date = %config.business_date,
        env = config.api_env.as_str(),
        tenants = tenants.len(),
        submit = config.submit(),
        remove_after = config.policy.remove_after,
        "starting daily sales submission"
    );

    let client = PosClient::new(config.api.clone());
    let uploader = config.sftp.clone().map(SftpUploader::new);

    run_outlets(
        &tenants,
        config.business_date,
        config.timezone,
        &client,
        uploader.as_ref().map(|u| u as &dyn Uploader),
        &config.policy,
    );

    // Per-outlet failures are in the log; they never change the exit code.
    Ok(())
}
