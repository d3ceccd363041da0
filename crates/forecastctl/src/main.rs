use anyhow::{Context, Result};
use clap::Parser;
use forecastctl_core::CallerIdentity;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod aws;
mod cli;
mod engine;
mod pipeline;

use cli::Cli;
use engine::ForecastEngine;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = &cli.region {
        loader = loader.region(aws_config::Region::new(region.clone()));
    }
    let config = loader.load().await;

    let region = config
        .region()
        .map(|r| r.to_string())
        .context("no AWS region configured; pass --region or set AWS_REGION")?;

    // Resolve the account up front: adopting a pre-existing resource means
    // synthesizing its ARN from account and region.
    let sts = aws_sdk_sts::Client::new(&config);
    let caller = sts
        .get_caller_identity()
        .send()
        .await
        .context("failed to resolve caller identity; check AWS credentials")?;
    let account_id = caller
        .account()
        .context("caller identity carried no account id")?
        .to_string();
    let identity = CallerIdentity::new(account_id, region);
    debug!(
        account = %identity.account_id,
        region = %identity.region,
        "resolved caller identity"
    );

    let engine = ForecastEngine::new(
        aws_sdk_forecast::Client::new(&config),
        identity,
        cli.poll_policy(),
        CancellationToken::new(),
    );

    pipeline::run(&engine, &cli).await?;
    Ok(())
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "forecastctl=info,forecastctl_core=info",
            1 => "forecastctl=debug,forecastctl_core=debug",
            _ => "forecastctl=trace,forecastctl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}
