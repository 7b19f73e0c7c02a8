use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ContentError, ContentEdit, PageDocument};
use crate::database::models::Setting;
use crate::database::Store;

pub const HOME_PAGE_KEY: &str = "home_page";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSource {
    Organization,
    Global,
    Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPage {
    pub source: PageSource,
    pub document: PageDocument,
}

async fn load(store: &dyn Store, organization_id: Option<Uuid>) -> Result<Option<PageDocument>, ContentError> {
    match store.get_setting(organization_id, HOME_PAGE_KEY).await? {
        Some(setting) => Ok(Some(serde_json::from_value(setting.value)?)),
        None => Ok(None),
    }
}

/// Organization override, else the global template, else an empty page.
/// `None` reads the global template only.
pub async fn resolve(store: &dyn Store, organization_id: Option<Uuid>) -> Result<ResolvedPage, ContentError> {
    if organization_id.is_some() {
        if let Some(document) = load(store, organization_id).await? {
            return Ok(ResolvedPage { source: PageSource::Organization, document });
        }
    }
    Ok(match load(store, None).await? {
        Some(document) => ResolvedPage { source: PageSource::Global, document },
        None => ResolvedPage { source: PageSource::Empty, document: PageDocument::default() },
    })
}

/// Replaces the whole page. `None` writes the global template.
pub async fn put(
    store: &dyn Store,
    organization_id: Option<Uuid>,
    document: PageDocument,
) -> Result<PageDocument, ContentError> {
    document.validate()?;
    let setting = Setting::new(organization_id, HOME_PAGE_KEY, serde_json::to_value(&document)?);
    store.put_setting(&setting).await?;
    info!("Saved home page for {}", scope_label(organization_id));
    Ok(document)
}

/// Applies edits in order to the organization's page and saves it. The first
/// edit of an organization starts from a copy of the global template. Any
/// failing edit aborts the whole batch.
pub async fn edit(
    store: &dyn Store,
    organization_id: Option<Uuid>,
    edits: Vec<ContentEdit>,
) -> Result<PageDocument, ContentError> {
    let mut document = match organization_id {
        Some(_) => {
            let resolved = resolve(store, organization_id).await?;
            if resolved.source != PageSource::Organization {
                debug!("Cloning {:?} home page for {}", resolved.source, scope_label(organization_id));
            }
            resolved.document
        }
        None => load(store, None).await?.unwrap_or_default(),
    };
    for change in edits {
        document.apply(change)?;
    }
    put(store, organization_id, document).await
}

/// Drops the organization override; returns whether one existed
pub async fn reset(store: &dyn Store, organization_id: Option<Uuid>) -> Result<bool, ContentError> {
    let removed = store.delete_setting(organization_id, HOME_PAGE_KEY).await?;
    if removed {
        info!("Reset home page for {}", scope_label(organization_id));
    }
    Ok(removed)
}

fn scope_label(organization_id: Option<Uuid>) -> String {
    organization_id.map_or_else(|| "global template".to_string(), |id| id.to_string())
}
