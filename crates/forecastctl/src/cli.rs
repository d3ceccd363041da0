//! CLI structure and argument definitions
//!
//! The pipeline itself is fixed; the flags only pick the input/output
//! locations, the resource base name, and the polling policy.

use clap::Parser;
use forecastctl_core::PollPolicy;
use std::time::Duration;

/// Provision an Amazon Forecast pipeline end to end, then tear it down
#[derive(Parser, Debug)]
#[command(name = "forecastctl")]
#[command(
    version,
    about = "Provision an Amazon Forecast pipeline end to end, then tear it down"
)]
#[command(long_about = "
Provisions a complete Amazon Forecast pipeline: dataset, import job, dataset
group, predictor, forecast, and forecast export job, waiting for each
asynchronously provisioned resource to become ACTIVE. Once the export
completes, every resource is deleted again in reverse order.

Creates are idempotent: a resource that already exists is adopted instead of
failing the run. Any other failure aborts immediately and leaves the
resources created so far in place for inspection.

EXAMPLES:
    forecastctl \\
        --data-path s3://my-bucket/electricityusagedata.csv \\
        --export-path s3://my-bucket/electricityusagedata_forecast/ \\
        --role-arn arn:aws:iam::123456789012:role/ForecastExecutionRole

    # Faster polling for small datasets, bounded waits
    forecastctl --poll-interval 10 --max-attempts 90 ...
")]
pub struct Cli {
    /// Base name for the pipeline's resources (dataset, predictor, ...)
    #[arg(long, default_value = "electricityusagedata")]
    pub name: String,

    /// S3 path of the CSV to import (s3://bucket/key)
    #[arg(long, env = "FORECASTCTL_DATA_PATH")]
    pub data_path: String,

    /// S3 prefix the forecast export is written to (s3://bucket/prefix/)
    #[arg(long, env = "FORECASTCTL_EXPORT_PATH")]
    pub export_path: String,

    /// Execution role the forecasting service assumes for S3 access
    #[arg(long, env = "FORECASTCTL_ROLE_ARN")]
    pub role_arn: String,

    /// AWS region; defaults to the environment's configured region
    #[arg(long)]
    pub region: Option<String>,

    /// How many future periods the predictor forecasts
    #[arg(long, default_value = "72")]
    pub forecast_horizon: i32,

    /// Seconds between status polls while waiting on a resource
    #[arg(long, default_value = "60")]
    pub poll_interval: u64,

    /// Maximum polls per wait before giving up (default: wait indefinitely)
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Enable verbose logging
    #[arg(long, short, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Polling policy for the lifecycle waits
    pub fn poll_policy(&self) -> PollPolicy {
        let mut policy = PollPolicy::new(Duration::from_secs(self.poll_interval));
        if let Some(max) = self.max_attempts {
            policy = policy.with_max_attempts(max);
        }
        policy
    }
}

/// Resource names derived from the base name.
///
/// The scheme matches the electricity-usage walkthrough the pipeline was
/// built around: `import_<name>`, `<name>group`, `<name>_predictor`,
/// `<name>_forecast`, `export_<name>_forecast`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub dataset: String,
    pub import_job: String,
    pub dataset_group: String,
    pub predictor: String,
    pub forecast: String,
    pub export_job: String,
}

impl ResourceNames {
    pub fn derive(base: &str) -> Self {
        Self {
            dataset: base.to_string(),
            import_job: format!("import_{base}"),
            dataset_group: format!("{base}group"),
            predictor: format!("{base}_predictor"),
            forecast: format!("{base}_forecast"),
            export_job: format!("export_{base}_forecast"),
        }
    }
}
