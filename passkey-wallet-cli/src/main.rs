//! Developer CLI driving the passkey wallet flows end-to-end with the
//! in-process software authenticator.
//!
//! The authenticator's credential registry and the wallet's credential record
//! are persisted under the platform data directory, so `login` after `create`
//! re-derives the same account across invocations.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr as _;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use eyre::{eyre, Result, WrapErr as _};
use passkey_wallet_core::activation::{ActivationPort, FaucetActivator};
use passkey_wallet_core::authenticator::SoftwareAuthenticator;
use passkey_wallet_core::config::WalletConfig;
use passkey_wallet_core::store::{CredentialStore, FileCredentialStore};
use passkey_wallet_core::{Environment, PasskeyWallet, SessionResult};

#[derive(Parser)]
#[command(
    name = "passkey-wallet",
    version,
    about = "Create and authenticate a passkey-derived wallet."
)]
struct Cli {
    /// Network environment (testnet or mainnet).
    #[arg(long, default_value = "testnet", env = "PASSKEY_WALLET_ENV")]
    environment: String,

    /// Override the data directory holding the wallet state.
    #[arg(long, env = "PASSKEY_WALLET_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new wallet on this device.
    Create,
    /// Authenticate with the wallet previously created on this device.
    Login,
    /// Show the stored credential record.
    Status,
    /// Forget the wallet on this device.
    Forget,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let environment = Environment::from_str(&cli.environment).map_err(|_| {
        eyre!(
            "unknown environment '{}' (expected testnet or mainnet)",
            cli.environment
        )
    })?;

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .ok_or_else(|| eyre!("no platform data directory available"))?
            .join("passkey-wallet"),
    };

    let registry_path = data_dir.join("authenticator.json");
    let authenticator = Arc::new(load_authenticator(&registry_path)?);
    let store = Arc::new(FileCredentialStore::new(data_dir.join("credential.json")));
    let config =
        WalletConfig::for_environment("passkey-wallet.dev", "Passkey Wallet", &environment);
    let activation = config
        .faucet_url
        .clone()
        .map(|url| Arc::new(FaucetActivator::new(url)) as Arc<dyn ActivationPort>);

    let wallet =
        PasskeyWallet::new(authenticator.clone(), activation, store.clone(), config);

    match cli.command {
        Command::Create => {
            let session = wallet.create_wallet().await?;
            persist_authenticator(&registry_path, &authenticator)?;
            print_session(&session);
        }
        Command::Login => {
            let session = wallet.authenticate().await?;
            persist_authenticator(&registry_path, &authenticator)?;
            print_session(&session);
        }
        Command::Status => match store.load()? {
            Some(record) => {
                println!("credential: {}", record.credential_id);
                println!("user:       {}", record.user_id);
                println!("account:    {}", record.account_address);
                println!("created at: {} (unix seconds)", record.created_at);
            }
            None => println!("no wallet has been created on this device"),
        },
        Command::Forget => {
            wallet.forget_device()?;
            println!("wallet forgotten; the platform credential itself was not removed");
        }
    }

    Ok(())
}

fn load_authenticator(path: &Path) -> Result<SoftwareAuthenticator> {
    match fs::read_to_string(path) {
        Ok(json) => SoftwareAuthenticator::import_registry(&json).map_err(|err| {
            eyre!(
                "authenticator registry at {} is corrupt: {err}",
                path.display()
            )
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Ok(SoftwareAuthenticator::new())
        }
        Err(err) => {
            Err(err).wrap_err_with(|| format!("reading {}", path.display()))
        }
    }
}

fn persist_authenticator(
    path: &Path,
    authenticator: &SoftwareAuthenticator,
) -> Result<()> {
    let json = authenticator
        .export_registry()
        .map_err(|err| eyre!("exporting authenticator registry: {err}"))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, json).wrap_err_with(|| format!("writing {}", path.display()))
}

fn print_session(session: &SessionResult) {
    println!("{}", session.message);
    println!("account: {}", session.account_address);
    println!("user:    {}", session.user_id);
    println!("token:   {}", session.token);
    if let Some(warning) = &session.warning {
        println!("warning: {warning}");
    }
}
