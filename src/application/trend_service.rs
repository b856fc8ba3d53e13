// Trend fetch-and-merge - walks day buckets and builds aligned columns
use crate::application::novant_api::{call_cancellable, NovantApi, OP_TRENDS};
use crate::domain::bucket::{DayBucket, DayBuckets};
use crate::domain::error::Result;
use crate::domain::query::QueryParams;
use crate::domain::trend::{TrendColumns, TrendRow, TrendsResponse};
use tokio_util::sync::CancellationToken;

/// Sampling interval requested from upstream. Not caller-configurable yet.
pub const TREND_INTERVAL: &str = "15min";

pub fn trend_params(params: &QueryParams, bucket: &DayBucket) -> Vec<(&'static str, String)> {
    vec![
        ("source_id", params.source_id.clone()),
        ("point_ids", params.point_ids_param()),
        ("date", bucket.date_param()),
        ("interval", TREND_INTERVAL.to_string()),
    ]
}

/// One `trends` call for one day
pub async fn fetch_bucket(
    api: &dyn NovantApi,
    cancel: &CancellationToken,
    params: &QueryParams,
    bucket: &DayBucket,
) -> Result<Vec<TrendRow>> {
    let args = trend_params(params, bucket);
    let obj = call_cancellable(api, cancel, OP_TRENDS, &args)
        .await
        .inspect_err(|e| {
            tracing::error!(date = %bucket.date_param(), error = %e, "/trends request failed")
        })?;

    let rows = TrendsResponse::from_object(obj)
        .inspect_err(|e| {
            tracing::error!(date = %bucket.date_param(), error = %e, "/trends response rejected")
        })?
        .into_rows();

    tracing::debug!(from = %bucket.start, to = %bucket.end(), rows = rows.len(), "fetched trends");
    Ok(rows)
}

/// Fetches buckets strictly in date order. The first failure aborts;
/// no partial columns are returned.
pub async fn fetch_trends(
    api: &dyn NovantApi,
    cancel: &CancellationToken,
    params: &QueryParams,
    buckets: DayBuckets,
) -> Result<TrendColumns> {
    let mut columns = TrendColumns::new(params.point_ids.len());
    for bucket in buckets {
        let rows = fetch_bucket(api, cancel, params, &bucket).await?;
        columns.append_rows(&rows, &params.point_ids)?;
    }
    Ok(columns)
}
