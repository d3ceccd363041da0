//! Amazon Forecast service operations
//!
//! One method per pipeline stage. Each create goes through
//! [`create_or_adopt`] so an existing resource is adopted rather than
//! failing the run, and each stage that provisions asynchronously is
//! followed by a lifecycle wait driven by a describe poll.

use std::future::Future;

use aws_sdk_forecast::Client;
use aws_sdk_forecast::types::{
    AttributeType, DataDestination, DataSource, DatasetType, Domain, FeaturizationConfig,
    InputDataConfig, S3Config, Schema, SchemaAttribute, SupplementaryFeature,
};
use forecastctl_core::{
    ApiError, ApiResult, CallerIdentity, PollPolicy, ProgressCallback, ProgressEvent, ResourceArn,
    Result, StatusSnapshot, create_or_adopt, wait_for_active, wait_for_deleted,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::aws::{api_error, build_error};

/// Frequency of the input series and of the generated forecast (hourly)
const DATA_FREQUENCY: &str = "H";
/// Time zone applied to imported timestamps
const IMPORT_TIME_ZONE: &str = "America/Los_Angeles";
/// Built-in holiday featurization, keyed by country
const HOLIDAY_FEATURE: &str = "holiday";
const HOLIDAY_COUNTRY: &str = "US";

/// Object-storage location plus the execution role the service assumes to
/// reach it. Passed through to the service unmodified.
#[derive(Debug, Clone)]
pub struct S3Location {
    pub path: String,
    pub role_arn: String,
}

/// Handle to the forecasting service, carrying the caller identity for
/// adoption and the polling policy for waits.
pub struct ForecastEngine {
    svc: Client,
    identity: CallerIdentity,
    policy: PollPolicy,
    cancel: CancellationToken,
}

impl ForecastEngine {
    pub fn new(
        svc: Client,
        identity: CallerIdentity,
        policy: PollPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            svc,
            identity,
            policy,
            cancel,
        }
    }

    /// Create the target time-series dataset. Returns immediately usable
    /// metadata, so no wait follows.
    pub async fn create_dataset(&self, name: &str) -> Result<ResourceArn> {
        create_or_adopt(&self.identity, "dataset", name, || async {
            let schema = Schema::builder()
                .attributes(attribute("timestamp", AttributeType::Timestamp))
                .attributes(attribute("target_value", AttributeType::Float))
                .attributes(attribute("item_id", AttributeType::String))
                .build();
            let out = self
                .svc
                .create_dataset()
                .dataset_name(name)
                .dataset_type(DatasetType::TargetTimeSeries)
                .domain(Domain::Custom)
                .data_frequency(DATA_FREQUENCY)
                .schema(schema)
                .send()
                .await
                .map_err(api_error)?;
            arn_from(out.dataset_arn)
        })
        .await
    }

    /// Import the CSV at `source` into the dataset and wait for the job to
    /// finish. Import jobs are named per dataset, so adoption synthesizes
    /// the compound `dataset-import-job/<dataset>` path.
    pub async fn create_dataset_import_job(
        &self,
        name: &str,
        dataset_name: &str,
        dataset_arn: &ResourceArn,
        source: &S3Location,
    ) -> Result<ResourceArn> {
        let data_source = DataSource::builder()
            .s3_config(s3_config(source)?)
            .build();

        let resource_type = format!("dataset-import-job/{dataset_name}");
        let arn = create_or_adopt(&self.identity, &resource_type, name, || async {
            let out = self
                .svc
                .create_dataset_import_job()
                .dataset_import_job_name(name)
                .dataset_arn(dataset_arn.as_str())
                .data_source(data_source)
                .time_zone(IMPORT_TIME_ZONE)
                .send()
                .await
                .map_err(api_error)?;
            arn_from(out.dataset_import_job_arn)
        })
        .await?;

        self.wait_active(name, || {
            let svc = self.svc.clone();
            let arn = arn.clone();
            async move {
                let out = svc
                    .describe_dataset_import_job()
                    .dataset_import_job_arn(arn.as_str())
                    .send()
                    .await
                    .map_err(api_error)?;
                Ok(StatusSnapshot {
                    status: out.status.unwrap_or_default(),
                    remaining_minutes: out.estimated_time_remaining_in_minutes,
                })
            }
        })
        .await?;
        Ok(arn)
    }

    /// Group the dataset so the predictor can train on it. Groups are
    /// usable as soon as the call returns.
    pub async fn create_dataset_group(
        &self,
        name: &str,
        dataset_arns: &[ResourceArn],
    ) -> Result<ResourceArn> {
        create_or_adopt(&self.identity, "dataset-group", name, || async {
            let mut req = self
                .svc
                .create_dataset_group()
                .dataset_group_name(name)
                .domain(Domain::Custom);
            for arn in dataset_arns {
                req = req.dataset_arns(arn.as_str());
            }
            let out = req.send().await.map_err(api_error)?;
            arn_from(out.dataset_group_arn)
        })
        .await
    }

    /// Train a predictor over the dataset group with AutoML algorithm
    /// selection and US holiday featurization, then wait for training to
    /// complete. This is typically the longest stage by far.
    pub async fn create_predictor(
        &self,
        name: &str,
        dataset_group_arn: &ResourceArn,
        forecast_horizon: i32,
    ) -> Result<ResourceArn> {
        let featurization = FeaturizationConfig::builder()
            .forecast_frequency(DATA_FREQUENCY)
            .build()
            .map_err(build_error)?;
        let holidays = SupplementaryFeature::builder()
            .name(HOLIDAY_FEATURE)
            .value(HOLIDAY_COUNTRY)
            .build()
            .map_err(build_error)?;
        let input = InputDataConfig::builder()
            .dataset_group_arn(dataset_group_arn.as_str())
            .supplementary_features(holidays)
            .build()
            .map_err(build_error)?;

        let arn = create_or_adopt(&self.identity, "predictor", name, || async {
            let out = self
                .svc
                .create_predictor()
                .predictor_name(name)
                .forecast_horizon(forecast_horizon)
                .perform_auto_ml(true)
                .input_data_config(input)
                .featurization_config(featurization)
                .send()
                .await
                .map_err(api_error)?;
            arn_from(out.predictor_arn)
        })
        .await?;

        self.wait_active(name, || {
            let svc = self.svc.clone();
            let arn = arn.clone();
            async move {
                let out = svc
                    .describe_predictor()
                    .predictor_arn(arn.as_str())
                    .send()
                    .await
                    .map_err(api_error)?;
                Ok(StatusSnapshot {
                    status: out.status.unwrap_or_default(),
                    remaining_minutes: out.estimated_time_remaining_in_minutes,
                })
            }
        })
        .await?;
        Ok(arn)
    }

    /// Generate a forecast from the trained predictor and wait for it
    pub async fn create_forecast(
        &self,
        name: &str,
        predictor_arn: &ResourceArn,
    ) -> Result<ResourceArn> {
        let arn = create_or_adopt(&self.identity, "forecast", name, || async {
            let out = self
                .svc
                .create_forecast()
                .forecast_name(name)
                .predictor_arn(predictor_arn.as_str())
                .send()
                .await
                .map_err(api_error)?;
            arn_from(out.forecast_arn)
        })
        .await?;

        self.wait_active(name, || {
            let svc = self.svc.clone();
            let arn = arn.clone();
            async move {
                let out = svc
                    .describe_forecast()
                    .forecast_arn(arn.as_str())
                    .send()
                    .await
                    .map_err(api_error)?;
                Ok(StatusSnapshot {
                    status: out.status.unwrap_or_default(),
                    remaining_minutes: out.estimated_time_remaining_in_minutes,
                })
            }
        })
        .await?;
        Ok(arn)
    }

    /// Export the forecast to S3 and wait for the job to finish. Export
    /// jobs are named per forecast, mirroring the import-job adoption path.
    pub async fn create_forecast_export_job(
        &self,
        name: &str,
        forecast_name: &str,
        forecast_arn: &ResourceArn,
        destination: &S3Location,
    ) -> Result<ResourceArn> {
        let data_destination = DataDestination::builder()
            .s3_config(s3_config(destination)?)
            .build();

        let resource_type = format!("forecast-export-job/{forecast_name}");
        let arn = create_or_adopt(&self.identity, &resource_type, name, || async {
            let out = self
                .svc
                .create_forecast_export_job()
                .forecast_export_job_name(name)
                .forecast_arn(forecast_arn.as_str())
                .destination(data_destination)
                .send()
                .await
                .map_err(api_error)?;
            arn_from(out.forecast_export_job_arn)
        })
        .await?;

        self.wait_active(name, || {
            let svc = self.svc.clone();
            let arn = arn.clone();
            async move {
                let out = svc
                    .describe_forecast_export_job()
                    .forecast_export_job_arn(arn.as_str())
                    .send()
                    .await
                    .map_err(api_error)?;
                Ok(StatusSnapshot {
                    status: out.status.unwrap_or_default(),
                    remaining_minutes: None,
                })
            }
        })
        .await?;
        Ok(arn)
    }

    pub async fn delete_forecast_export_job(&self, arn: &ResourceArn) -> Result<()> {
        self.svc
            .delete_forecast_export_job()
            .forecast_export_job_arn(arn.as_str())
            .send()
            .await
            .map_err(api_error)?;

        self.wait_deleted("forecast-export-job", || {
            let svc = self.svc.clone();
            let arn = arn.clone();
            async move {
                let out = svc
                    .describe_forecast_export_job()
                    .forecast_export_job_arn(arn.as_str())
                    .send()
                    .await
                    .map_err(api_error)?;
                Ok(out.status.unwrap_or_default())
            }
        })
        .await
    }

    pub async fn delete_forecast(&self, arn: &ResourceArn) -> Result<()> {
        self.svc
            .delete_forecast()
            .forecast_arn(arn.as_str())
            .send()
            .await
            .map_err(api_error)?;

        self.wait_deleted("forecast", || {
            let svc = self.svc.clone();
            let arn = arn.clone();
            async move {
                let out = svc
                    .describe_forecast()
                    .forecast_arn(arn.as_str())
                    .send()
                    .await
                    .map_err(api_error)?;
                Ok(out.status.unwrap_or_default())
            }
        })
        .await
    }

    pub async fn delete_predictor(&self, arn: &ResourceArn) -> Result<()> {
        self.svc
            .delete_predictor()
            .predictor_arn(arn.as_str())
            .send()
            .await
            .map_err(api_error)?;

        self.wait_deleted("predictor", || {
            let svc = self.svc.clone();
            let arn = arn.clone();
            async move {
                let out = svc
                    .describe_predictor()
                    .predictor_arn(arn.as_str())
                    .send()
                    .await
                    .map_err(api_error)?;
                Ok(out.status.unwrap_or_default())
            }
        })
        .await
    }

    /// Dataset group deletion completes synchronously, no wait
    pub async fn delete_dataset_group(&self, arn: &ResourceArn) -> Result<()> {
        self.svc
            .delete_dataset_group()
            .dataset_group_arn(arn.as_str())
            .send()
            .await
            .map_err(api_error)?;
        Ok(())
    }

    pub async fn delete_dataset_import_job(&self, arn: &ResourceArn) -> Result<()> {
        self.svc
            .delete_dataset_import_job()
            .dataset_import_job_arn(arn.as_str())
            .send()
            .await
            .map_err(api_error)?;

        self.wait_deleted("dataset-import-job", || {
            let svc = self.svc.clone();
            let arn = arn.clone();
            async move {
                let out = svc
                    .describe_dataset_import_job()
                    .dataset_import_job_arn(arn.as_str())
                    .send()
                    .await
                    .map_err(api_error)?;
                Ok(out.status.unwrap_or_default())
            }
        })
        .await
    }

    /// Dataset deletion completes synchronously, no wait
    pub async fn delete_dataset(&self, arn: &ResourceArn) -> Result<()> {
        self.svc
            .delete_dataset()
            .dataset_arn(arn.as_str())
            .send()
            .await
            .map_err(api_error)?;
        Ok(())
    }

    async fn wait_active<F, Fut>(&self, name: &str, poll: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<StatusSnapshot>>,
    {
        wait_for_active(name, &self.policy, &self.cancel, poll, Some(status_logger())).await
    }

    async fn wait_deleted<F, Fut>(&self, name: &str, poll: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiResult<String>>,
    {
        wait_for_deleted(name, &self.policy, &self.cancel, poll, Some(status_logger())).await
    }
}

fn attribute(name: &str, ty: AttributeType) -> SchemaAttribute {
    SchemaAttribute::builder()
        .attribute_name(name)
        .attribute_type(ty)
        .build()
}

fn s3_config(location: &S3Location) -> Result<S3Config> {
    S3Config::builder()
        .path(&location.path)
        .role_arn(&location.role_arn)
        .build()
        .map_err(build_error)
}

/// A create response without an ARN is a service contract violation
fn arn_from(arn: Option<String>) -> ApiResult<ResourceArn> {
    arn.map(ResourceArn::from).ok_or_else(|| ApiError::Service {
        code: None,
        message: "create response carried no resource ARN".to_string(),
    })
}

/// Progress callback that surfaces each poll as a status log line
fn status_logger() -> ProgressCallback {
    Box::new(|event| {
        if let ProgressEvent::Polling {
            name,
            status,
            remaining_minutes,
            ..
        } = event
        {
            match remaining_minutes {
                Some(mins) => info!("{name}'s status is {status}, remaining {mins} mins"),
                None => info!("{name}'s status is {status}"),
            }
        }
    })
}
