use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::ServiceError;
use crate::database::models::Donation;
use crate::database::Store;
use crate::filter::{donation_totals, pledge_totals, to_csv, Entity, Exportable, Filter, FilterData, Listable, Page};
use crate::types::OrgScope;

/// One page of an entity listing plus per-currency totals over the whole
/// filtered set (donations, payments and pledges only).
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    #[serde(flatten)]
    pub page: Page<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<Value>,
}

/// Runs the shared filter engine over any entity the API lists
pub struct ListingService {
    store: Arc<dyn Store>,
}

impl ListingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn find(&self, entity: Entity, scope: &OrgScope, data: FilterData) -> Result<Listing, ServiceError> {
        let filter = Filter::from_data(data)?;
        let listing = match entity {
            Entity::Donors => listing(&filter, self.store.list_donors(scope).await?, |_| None)?,
            Entity::Donations => {
                listing(&filter, self.store.list_donations(scope).await?, |rows| Some(serde_json::to_value(donation_totals(rows))))?
            }
            Entity::Payments => {
                listing(&filter, payments(self.store.list_donations(scope).await?), |rows| Some(serde_json::to_value(donation_totals(rows))))?
            }
            Entity::Pledges => {
                listing(&filter, self.store.list_pledges(scope).await?, |rows| Some(serde_json::to_value(pledge_totals(rows))))?
            }
            Entity::Yahrzeits => listing(&filter, self.store.list_yahrzeits(scope).await?, |_| None)?,
            Entity::Organizations => listing(&filter, self.store.list_organizations(scope).await?, |_| None)?,
            Entity::Roles => listing(&filter, self.store.list_roles(scope).await?, |_| None)?,
        };
        debug!("Listed {} {} of {} for {}", listing.page.items.len(), entity, listing.page.total, scope);
        Ok(listing)
    }

    /// Every matching record as CSV; pagination in `data` is ignored
    pub async fn export(&self, entity: Entity, scope: &OrgScope, data: FilterData) -> Result<Vec<u8>, ServiceError> {
        let filter = Filter::from_data(data)?;
        let bytes = match entity {
            Entity::Donors => export(&filter, self.store.list_donors(scope).await?)?,
            Entity::Donations => export(&filter, self.store.list_donations(scope).await?)?,
            Entity::Payments => export(&filter, payments(self.store.list_donations(scope).await?))?,
            Entity::Pledges => export(&filter, self.store.list_pledges(scope).await?)?,
            Entity::Yahrzeits => export(&filter, self.store.list_yahrzeits(scope).await?)?,
            Entity::Organizations => export(&filter, self.store.list_organizations(scope).await?)?,
            Entity::Roles => export(&filter, self.store.list_roles(scope).await?)?,
        };
        debug!("Exported {} bytes of {} for {}", bytes.len(), entity, scope);
        Ok(bytes)
    }
}

fn payments(donations: Vec<Donation>) -> Vec<Donation> {
    donations.into_iter().filter(Donation::is_payment).collect()
}

fn listing<T, F>(filter: &Filter, records: Vec<T>, totals: F) -> Result<Listing, ServiceError>
where
    T: Listable + Serialize,
    F: FnOnce(&[T]) -> Option<serde_json::Result<Value>>,
{
    let selected = filter.select(records);
    let totals = totals(&selected).transpose().map_err(crate::filter::FilterError::from)?;
    let page = filter.paginate(selected);
    let items = page
        .items
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(crate::filter::FilterError::from)?;
    Ok(Listing {
        page: Page { items, total: page.total, page: page.page, per_page: page.per_page, total_pages: page.total_pages },
        totals,
    })
}

fn export<T: Exportable>(filter: &Filter, records: Vec<T>) -> Result<Vec<u8>, ServiceError> {
    Ok(to_csv(&filter.select(records))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Donor, Organization, Pledge};
    use crate::database::MemoryStore;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;

    async fn seeded() -> (ListingService, OrgScope) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let org = Organization::new("Beth Shalom");
        store.insert_organization(&org).await.unwrap();
        let donor = Donor::new(org.id, "Sarah", "Levi");
        store.insert_donor(&donor).await.unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        for (amount, currency) in [(18, "USD"), (36, "USD"), (100, "ILS")] {
            let mut d = Donation::new(org.id, Decimal::from(amount), currency, day);
            d.donor_id = Some(donor.id);
            store.insert_donation(&d).await.unwrap();
        }
        let pledge = Pledge::new(org.id, donor.id, Decimal::from(500), "USD", day);
        store.insert_pledge(&pledge).await.unwrap();
        (ListingService::new(store), OrgScope::Organization(org.id))
    }

    #[tokio::test]
    async fn donations_list_with_totals_over_the_filtered_set() {
        let (service, scope) = seeded().await;
        let data = FilterData { order: Some(json!("amount desc")), per_page: Some(1), page: Some(1), ..Default::default() };
        let listing = service.find(Entity::Donations, &scope, data).await.unwrap();

        assert_eq!(listing.page.total, 3);
        assert_eq!(listing.page.items.len(), 1);
        assert_eq!(listing.page.total_pages, 3);
        let totals = listing.totals.unwrap();
        assert_eq!(totals["USD"]["count"], json!(2));
        assert_eq!(totals["ILS"]["count"], json!(1));
    }

    #[tokio::test]
    async fn donors_have_no_totals_and_export_ignores_paging() {
        let (service, scope) = seeded().await;
        let listing = service.find(Entity::Donors, &scope, FilterData::default()).await.unwrap();
        assert!(listing.totals.is_none());

        let data = FilterData { limit: Some(1), ..Default::default() };
        let csv = service.export(Entity::Donations, &scope, data).await.unwrap();
        let text = String::from_utf8(csv).unwrap();
        assert_eq!(text.lines().count(), 4);
    }

    #[tokio::test]
    async fn payments_are_donations_with_a_pledge() {
        let (service, scope) = seeded().await;
        let listing = service.find(Entity::Payments, &scope, FilterData::default()).await.unwrap();
        assert_eq!(listing.page.total, 0);
        let pledges = service.find(Entity::Pledges, &scope, FilterData::default()).await.unwrap();
        assert_eq!(pledges.totals.unwrap()["USD"]["count"], json!(1));
    }
}
