use std::str::FromStr;

use anyhow::{Context, Result};

use chartlink_client::{PatientSearch, ResourceFetcher, ResourceQuery};
use chartlink_core::ResourceType;

use crate::cli::{GetArgs, SearchPatientsArgs};
use crate::output::{print_json, print_notice};

fn parse_param(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => anyhow::bail!("Invalid parameter \"{raw}\". Expected format: key=value"),
    }
}

pub fn build_query(args: &GetArgs) -> Result<ResourceQuery> {
    let resource_type = ResourceType::from_str(&args.resource_type)?;
    let mut query = ResourceQuery::new(resource_type);
    if let Some(id) = &args.id {
        query = query.with_id(id);
    }
    if let Some(patient) = &args.patient {
        query = query.for_patient(patient);
    }
    for raw in &args.params {
        let (key, value) = parse_param(raw)?;
        query = query.param(key, value);
    }
    Ok(query)
}

pub async fn get(fetcher: &ResourceFetcher, args: &GetArgs) -> Result<()> {
    let query = build_query(args)?;
    let bundle = fetcher
        .try_fetch(&query)
        .await
        .with_context(|| format!("Failed to fetch {}", query.resource_type()))?;
    print_json(bundle.as_value())
}

pub async fn search_patients(fetcher: &ResourceFetcher, args: &SearchPatientsArgs) -> Result<()> {
    let criteria = PatientSearch {
        family: args.family.clone(),
        given: args.given.clone(),
        birthdate: args.birthdate.clone(),
        identifier: args.identifier.clone(),
    };
    let bundle = fetcher
        .try_fetch(&criteria.into_query())
        .await
        .context("Patient search failed")?;
    print_json(bundle.as_value())?;
    print_notice(&format!("{} patient(s) found", bundle.resources().len()));
    Ok(())
}
