//! `gatewatch` -- operator client for the surveillance dashboard.
//!
//! Lists cameras and fences, draws new fences headlessly through the
//! annotation state machine, toggles and schedules detection modes, and
//! queries the alert history.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default                 | Description                          |
//! |------------------------|----------|-------------------------|--------------------------------------|
//! | `GATEWATCH_BACKEND`    | no       | `rest`                  | `rest` or `firestore`                |
//! | `API_BASE_URL`         | no       | `http://127.0.0.1:5000` | REST backend root                    |
//! | `FIRESTORE_PROJECT_ID` | firestore| --                      | Google Cloud project holding `cameras` |
//! | `FIRESTORE_API_KEY`    | no       | --                      | Web API key sent as `key=`           |
//! | `REQUEST_TIMEOUT_SECS` | no       | `10`                    | Per-request HTTP timeout             |

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatewatch_cli::args::Cli;
use gatewatch_cli::commands;
use gatewatch_client::{Backend, BackendConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatewatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = BackendConfig::from_env()?;
    tracing::debug!(
        backend = %config.kind,
        api_base_url = %config.api_base_url,
        timeout_secs = config.request_timeout_secs,
        "Loaded configuration"
    );
    let backend = Backend::from_config(&config)?;

    commands::run(cli, &backend).await
}
