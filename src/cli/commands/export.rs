use anyhow::Context;
use clap::Args;
use serde_json::json;
use std::sync::Arc;

use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::filter::{Entity, FilterData};
use crate::services::ListingService;
use crate::types::OrgScope;

#[derive(Args)]
pub struct ExportArgs {
    #[arg(help = "donors, donations, payments, pledges, yahrzeits, organizations or roles")]
    pub entity: String,
    #[arg(help = "Output CSV path")]
    pub output: String,
    #[arg(long, default_value = "all", help = "Organization id, or 'all'")]
    pub org: OrgScope,
    #[arg(long, help = "JSON filter: where, order, q")]
    pub filter: Option<String>,
}

pub async fn handle(args: ExportArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let entity = Entity::parse(&args.entity)?;
    let data: FilterData = match args.filter.as_deref() {
        Some(raw) => serde_json::from_str(raw).context("--filter is not valid JSON")?,
        None => FilterData::default(),
    };

    let service = ListingService::new(Arc::new(connect().await?));
    let bytes = service.export(entity, &args.org, data).await?;
    tokio::fs::write(&args.output, &bytes).await.with_context(|| format!("writing {}", args.output))?;

    output_success(
        &output_format,
        &format!("Exported {} to {}", entity, args.output),
        Some(json!({ "entity": entity.to_string(), "output": args.output, "bytes": bytes.len() })),
    )
}
