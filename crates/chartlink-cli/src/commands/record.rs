use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use chartlink_client::{ResourceFetcher, ResourceSource};
use chartlink_record::{AggregatorConfig, PatientRecordAggregator};

use crate::cli::RecordArgs;
use crate::output::{print_json, print_notice, print_warning};

pub async fn record(
    fetcher: ResourceFetcher,
    config: &AggregatorConfig,
    args: &RecordArgs,
) -> Result<()> {
    let source: Arc<dyn ResourceSource> = Arc::new(fetcher);
    let aggregator = PatientRecordAggregator::new(source, config);
    let build = aggregator.build(&args.patient_id);

    let record = match args.timeout {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), build).await {
            Ok(record) => record,
            Err(_) => anyhow::bail!(
                "Record aggregation for patient {} timed out after {secs}s",
                args.patient_id
            ),
        },
        None => build.await,
    };

    print_json(&record)?;

    let failed = record.failed_sections();
    if failed.is_empty() {
        print_notice(&format!(
            "Record for patient {} built in {:.2}s",
            args.patient_id, record.total_fetch_time_seconds
        ));
    } else {
        let names: Vec<&str> = failed.iter().map(|s| s.as_str()).collect();
        print_warning(&format!(
            "Record for patient {} is partial; failed sections: {}",
            args.patient_id,
            names.join(", ")
        ));
    }
    Ok(())
}
