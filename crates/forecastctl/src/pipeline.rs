//! End-to-end pipeline sequencing
//!
//! Runs the six creation stages in dependency order, then tears everything
//! down in reverse. Any failure aborts the run immediately; resources
//! created so far are left in place for inspection.

use forecastctl_core::Result;
use tracing::info;

use crate::cli::{Cli, ResourceNames};
use crate::engine::{ForecastEngine, S3Location};

pub async fn run(engine: &ForecastEngine, cli: &Cli) -> Result<()> {
    let names = ResourceNames::derive(&cli.name);
    let source = S3Location {
        path: cli.data_path.clone(),
        role_arn: cli.role_arn.clone(),
    };
    let destination = S3Location {
        path: cli.export_path.clone(),
        role_arn: cli.role_arn.clone(),
    };

    info!("creating dataset {}", names.dataset);
    let dataset_arn = engine.create_dataset(&names.dataset).await?;

    info!("creating dataset import job {}", names.import_job);
    let import_job_arn = engine
        .create_dataset_import_job(&names.import_job, &names.dataset, &dataset_arn, &source)
        .await?;

    info!("creating dataset group {}", names.dataset_group);
    let dataset_group_arn = engine
        .create_dataset_group(&names.dataset_group, std::slice::from_ref(&dataset_arn))
        .await?;

    info!("creating predictor {}", names.predictor);
    let predictor_arn = engine
        .create_predictor(&names.predictor, &dataset_group_arn, cli.forecast_horizon)
        .await?;

    info!("creating forecast {}", names.forecast);
    let forecast_arn = engine.create_forecast(&names.forecast, &predictor_arn).await?;

    info!("creating forecast export job {}", names.export_job);
    let export_job_arn = engine
        .create_forecast_export_job(&names.export_job, &names.forecast, &forecast_arn, &destination)
        .await?;

    info!("export complete, cleaning up");
    engine.delete_forecast_export_job(&export_job_arn).await?;
    engine.delete_forecast(&forecast_arn).await?;
    engine.delete_predictor(&predictor_arn).await?;
    engine.delete_dataset_group(&dataset_group_arn).await?;
    engine.delete_dataset_import_job(&import_job_arn).await?;
    engine.delete_dataset(&dataset_arn).await?;

    info!("pipeline complete");
    Ok(())
}
