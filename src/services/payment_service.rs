use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{require_donor, ServiceError};
use crate::config::CONFIG;
use crate::database::models::{
    Donation, DonationInput, DonationType, PaymentMethod, Pledge, PledgeInput, PledgeStatus,
};
use crate::database::Store;
use crate::types::OrgScope;

/// Body of `POST /api/pledges/:id/payments`
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub donated_on: Option<NaiveDate>,
    #[serde(default)]
    pub fee: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Donations and the pledges they pay down. Every write that touches
/// `amount_paid` goes through here.
pub struct PaymentService {
    store: Arc<dyn Store>,
}

impl PaymentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn record_payment(
        &self,
        scope: &OrgScope,
        pledge_id: Uuid,
        request: PaymentRequest,
    ) -> Result<(Donation, Pledge), ServiceError> {
        let pledge = self.store.get_pledge(scope, pledge_id).await?;
        let currency = request.currency.unwrap_or_else(|| pledge.currency.clone());
        let donated_on = request.donated_on.unwrap_or_else(|| Utc::now().date_naive());

        let mut donation = Donation::new(pledge.organization_id, request.amount, &currency, donated_on);
        donation.donor_id = Some(pledge.donor_id);
        donation.pledge_id = Some(pledge.id);
        donation.payment_method = request.payment_method.unwrap_or_default();
        donation.fee = request.fee;
        donation.notes = request.notes.filter(|n| !n.trim().is_empty());
        donation.recompute_net();
        donation.validate()?;

        self.attach(pledge, donation).await
    }

    pub async fn create_pledge(&self, organization_id: Uuid, input: PledgeInput) -> Result<Pledge, ServiceError> {
        let pledge = input.into_pledge(organization_id, &CONFIG.import.default_currency)?;
        require_donor(self.store.as_ref(), organization_id, Some(pledge.donor_id)).await?;
        self.store.insert_pledge(&pledge).await?;
        info!("Created pledge {} of {} {}", pledge.id, pledge.total_amount, pledge.currency);
        Ok(pledge)
    }

    /// Edits pledge terms. The currency is fixed once money has been paid,
    /// and the total may not drop below what was paid.
    pub async fn update_pledge(&self, scope: &OrgScope, id: Uuid, input: PledgeInput) -> Result<Pledge, ServiceError> {
        let before = self.store.get_pledge(scope, id).await?;
        let mut pledge = before.clone();
        input.apply(&mut pledge)?;

        if pledge.donor_id != before.donor_id {
            require_donor(self.store.as_ref(), pledge.organization_id, Some(pledge.donor_id)).await?;
        }
        if pledge.currency != before.currency && !before.amount_paid.is_zero() {
            return Err(ServiceError::CurrencyLocked(pledge.id));
        }
        if pledge.total_amount < pledge.amount_paid {
            return Err(ServiceError::TotalBelowPaid { total: pledge.total_amount, paid: pledge.amount_paid });
        }
        pledge.settle_status();
        self.store.update_pledge(&pledge).await?;
        if pledge.status != before.status {
            info!("Pledge {} is now {} after its total changed", pledge.id, pledge.status);
        }
        Ok(pledge)
    }

    /// Saves a donation; one carrying a `pledge_id` is treated as a payment
    pub async fn create_donation(&self, organization_id: Uuid, input: DonationInput) -> Result<Donation, ServiceError> {
        let donation = input.into_donation(organization_id, &CONFIG.import.default_currency)?;
        require_donor(self.store.as_ref(), organization_id, donation.donor_id).await?;
        match donation.pledge_id {
            Some(pledge_id) => {
                let pledge = self.store.get_pledge(&OrgScope::Organization(organization_id), pledge_id).await?;
                let (donation, _) = self.attach(pledge, donation).await?;
                Ok(donation)
            }
            None => {
                self.store.insert_donation(&donation).await?;
                info!("Recorded donation {} of {} {}", donation.id, donation.amount, donation.currency);
                Ok(donation)
            }
        }
    }

    /// Updates a donation; changes to a payment's pledge, amount, currency
    /// or status are carried to the pledges involved
    pub async fn update_donation(
        &self,
        scope: &OrgScope,
        id: Uuid,
        input: DonationInput,
    ) -> Result<Donation, ServiceError> {
        let before = self.store.get_donation(scope, id).await?;
        let mut donation = before.clone();
        input.apply(&mut donation)?;

        if donation.donor_id != before.donor_id {
            require_donor(self.store.as_ref(), donation.organization_id, donation.donor_id).await?;
        }
        let moved = before.pledge_id != donation.pledge_id
            || before.amount != donation.amount
            || before.currency != donation.currency
            || before.counts_toward_totals() != donation.counts_toward_totals();
        if moved {
            self.rebook(scope, &before, &donation).await?;
        }
        self.store.update_donation(&donation).await?;
        Ok(donation)
    }

    /// Deleting a payment gives its amount back to the pledge
    pub async fn delete_donation(&self, scope: &OrgScope, id: Uuid) -> Result<(), ServiceError> {
        let donation = self.store.get_donation(scope, id).await?;
        self.store.delete_donation(scope, id).await?;
        if let (Some(pledge_id), true) = (donation.pledge_id, donation.counts_toward_totals()) {
            let mut pledge = self.store.get_pledge(scope, pledge_id).await?;
            pledge.revert_payment(donation.amount);
            self.store.update_pledge(&pledge).await?;
            info!("Reverted payment {} on pledge {}", donation.id, pledge.id);
        }
        Ok(())
    }

    /// Cancelling twice is a no-op; a completed pledge stays completed
    pub async fn cancel_pledge(&self, scope: &OrgScope, pledge_id: Uuid) -> Result<Pledge, ServiceError> {
        let mut pledge = self.store.get_pledge(scope, pledge_id).await?;
        match pledge.status {
            PledgeStatus::Completed => Err(ServiceError::PledgeCompleted(pledge.id)),
            PledgeStatus::Cancelled => Ok(pledge),
            PledgeStatus::Active => {
                pledge.status = PledgeStatus::Cancelled;
                pledge.updated_at = Utc::now();
                self.store.update_pledge(&pledge).await?;
                info!("Cancelled pledge {} with {} {} outstanding", pledge.id, pledge.balance_owed(), pledge.currency);
                Ok(pledge)
            }
        }
    }

    /// Takes the old version of a payment off its pledge and books the new
    /// one. Every check runs before a pledge is written.
    async fn rebook(&self, scope: &OrgScope, before: &Donation, after: &Donation) -> Result<(), ServiceError> {
        let mut old = match before.pledge_id {
            Some(id) => Some(self.store.get_pledge(scope, id).await?),
            None => None,
        };
        if let (Some(pledge), true) = (old.as_mut(), before.counts_toward_totals()) {
            pledge.revert_payment(before.amount);
        }
        let mut new = match after.pledge_id {
            Some(id) if before.pledge_id == Some(id) => old.take(),
            Some(id) => Some(self.store.get_pledge(scope, id).await?),
            None => None,
        };
        if let Some(pledge) = new.as_mut() {
            check_match(pledge, after)?;
            if after.counts_toward_totals() {
                check_open(pledge, after.amount)?;
                pledge.apply_payment(after.amount);
            }
        }
        for pledge in old.iter().chain(new.iter()) {
            self.store.update_pledge(pledge).await?;
        }
        Ok(())
    }

    async fn attach(&self, mut pledge: Pledge, mut donation: Donation) -> Result<(Donation, Pledge), ServiceError> {
        check_match(&pledge, &donation)?;
        let counted = donation.counts_toward_totals();
        if counted {
            check_open(&pledge, donation.amount)?;
        }
        donation.donation_type = DonationType::PledgePayment;
        donation.donor_id.get_or_insert(pledge.donor_id);

        self.store.insert_donation(&donation).await?;
        if !counted {
            info!("Payment {} on pledge {} saved as {}", donation.id, pledge.id, donation.status);
            return Ok((donation, pledge));
        }
        pledge.apply_payment(donation.amount);
        if let Err(e) = self.store.update_pledge(&pledge).await {
            error!("Pledge {} update failed after payment {}: {}", pledge.id, donation.id, e);
            let scope = OrgScope::Organization(donation.organization_id);
            if let Err(undo) = self.store.delete_donation(&scope, donation.id).await {
                warn!("Could not remove orphaned payment {}: {}", donation.id, undo);
            }
            return Err(e.into());
        }
        info!(
            "Payment {} of {} {} on pledge {} (balance {})",
            donation.id,
            donation.amount,
            donation.currency,
            pledge.id,
            pledge.balance_owed()
        );
        Ok((donation, pledge))
    }
}

/// A payment must share the pledge's organization and currency
fn check_match(pledge: &Pledge, donation: &Donation) -> Result<(), ServiceError> {
    if pledge.organization_id != donation.organization_id {
        return Err(ServiceError::OrganizationMismatch { payment: donation.organization_id, pledge: pledge.organization_id });
    }
    if pledge.currency != donation.currency {
        return Err(ServiceError::CurrencyMismatch { expected: pledge.currency.clone(), got: donation.currency.clone() });
    }
    Ok(())
}

fn check_open(pledge: &Pledge, amount: Decimal) -> Result<(), ServiceError> {
    if pledge.status != PledgeStatus::Active {
        return Err(ServiceError::PledgeClosed { id: pledge.id, status: pledge.status });
    }
    let balance = pledge.balance_owed();
    if amount > balance {
        return Err(ServiceError::Overpayment { amount, balance });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{DonationStatus, Donor, Organization};
    use crate::database::MemoryStore;

    async fn setup() -> (PaymentService, Arc<dyn Store>, Pledge) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let org = Organization::new("Beth Shalom");
        store.insert_organization(&org).await.unwrap();
        let donor = Donor::new(org.id, "Sarah", "Levi");
        store.insert_donor(&donor).await.unwrap();
        let pledge = Pledge::new(org.id, donor.id, Decimal::from(1800), "USD", NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
        store.insert_pledge(&pledge).await.unwrap();
        (PaymentService::new(store.clone()), store, pledge)
    }

    async fn payment_count(store: &Arc<dyn Store>, scope: &OrgScope) -> usize {
        store.list_donations(scope).await.unwrap().iter().filter(|d| d.is_payment()).count()
    }

    fn payment(amount: i64) -> PaymentRequest {
        PaymentRequest {
            amount: Decimal::from(amount),
            currency: None,
            payment_method: Some(PaymentMethod::Check),
            donated_on: NaiveDate::from_ymd_opt(2024, 10, 1),
            fee: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn payments_pay_down_and_complete_the_pledge() {
        let (service, store, pledge) = setup().await;
        let scope = OrgScope::Organization(pledge.organization_id);

        let (donation, updated) = service.record_payment(&scope, pledge.id, payment(1000)).await.unwrap();
        assert_eq!(donation.donation_type, DonationType::PledgePayment);
        assert_eq!(donation.donor_id, Some(pledge.donor_id));
        assert_eq!(updated.balance_owed(), Decimal::from(800));
        assert_eq!(updated.status, PledgeStatus::Active);

        let (_, updated) = service.record_payment(&scope, pledge.id, payment(800)).await.unwrap();
        assert_eq!(updated.status, PledgeStatus::Completed);
        assert_eq!(payment_count(&store, &scope).await, 2);

        let err = service.record_payment(&scope, pledge.id, payment(1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::PledgeClosed { status: PledgeStatus::Completed, .. }));
        assert!(matches!(service.cancel_pledge(&scope, pledge.id).await, Err(ServiceError::PledgeCompleted(_))));
    }

    #[tokio::test]
    async fn currency_and_balance_are_checked() {
        let (service, store, pledge) = setup().await;
        let scope = OrgScope::Organization(pledge.organization_id);

        let mut shekels = payment(100);
        shekels.currency = Some("ILS".into());
        assert!(matches!(
            service.record_payment(&scope, pledge.id, shekels).await,
            Err(ServiceError::CurrencyMismatch { .. })
        ));
        assert!(matches!(
            service.record_payment(&scope, pledge.id, payment(2000)).await,
            Err(ServiceError::Overpayment { .. })
        ));
        assert_eq!(payment_count(&store, &scope).await, 0);
    }

    #[tokio::test]
    async fn deleting_a_payment_reopens_the_pledge() {
        let (service, store, pledge) = setup().await;
        let scope = OrgScope::Organization(pledge.organization_id);
        let (donation, _) = service.record_payment(&scope, pledge.id, payment(1800)).await.unwrap();

        service.delete_donation(&scope, donation.id).await.unwrap();
        let reopened = store.get_pledge(&scope, pledge.id).await.unwrap();
        assert_eq!(reopened.amount_paid, Decimal::ZERO);
        assert_eq!(reopened.status, PledgeStatus::Active);
    }

    #[tokio::test]
    async fn cancelled_pledges_take_no_payments() {
        let (service, _store, pledge) = setup().await;
        let scope = OrgScope::Organization(pledge.organization_id);
        service.cancel_pledge(&scope, pledge.id).await.unwrap();
        assert_eq!(service.cancel_pledge(&scope, pledge.id).await.unwrap().status, PledgeStatus::Cancelled);
        assert!(matches!(
            service.record_payment(&scope, pledge.id, payment(18)).await,
            Err(ServiceError::PledgeClosed { status: PledgeStatus::Cancelled, .. })
        ));
    }

    #[tokio::test]
    async fn refunds_stop_counting_toward_the_pledge() {
        let (service, store, pledge) = setup().await;
        let scope = OrgScope::Organization(pledge.organization_id);
        let (donation, _) = service.record_payment(&scope, pledge.id, payment(1800)).await.unwrap();

        let refund = DonationInput { status: Some(DonationStatus::Refunded), ..Default::default() };
        service.update_donation(&scope, donation.id, refund).await.unwrap();
        let reopened = store.get_pledge(&scope, pledge.id).await.unwrap();
        assert_eq!(reopened.amount_paid, Decimal::ZERO);
        assert_eq!(reopened.status, PledgeStatus::Active);

        let restored = DonationInput { status: Some(DonationStatus::Completed), ..Default::default() };
        service.update_donation(&scope, donation.id, restored).await.unwrap();
        let paid = store.get_pledge(&scope, pledge.id).await.unwrap();
        assert_eq!(paid.amount_paid, Decimal::from(1800));
        assert_eq!(paid.status, PledgeStatus::Completed);

        // a refunded payment has nothing left to give back
        let refund = DonationInput { status: Some(DonationStatus::Refunded), ..Default::default() };
        service.update_donation(&scope, donation.id, refund).await.unwrap();
        service.delete_donation(&scope, donation.id).await.unwrap();
        assert_eq!(store.get_pledge(&scope, pledge.id).await.unwrap().amount_paid, Decimal::ZERO);
    }

    #[tokio::test]
    async fn payment_currency_cannot_drift_from_the_pledge() {
        let (service, store, pledge) = setup().await;
        let scope = OrgScope::Organization(pledge.organization_id);
        let (donation, _) = service.record_payment(&scope, pledge.id, payment(500)).await.unwrap();

        let shekels = DonationInput { currency: Some("ILS".into()), ..Default::default() };
        assert!(matches!(
            service.update_donation(&scope, donation.id, shekels).await,
            Err(ServiceError::CurrencyMismatch { .. })
        ));
        assert_eq!(store.get_donation(&scope, donation.id).await.unwrap().currency, "USD");
        assert_eq!(store.get_pledge(&scope, pledge.id).await.unwrap().amount_paid, Decimal::from(500));
    }

    #[tokio::test]
    async fn pledge_edits_respect_what_was_paid() {
        let (service, store, pledge) = setup().await;
        let scope = OrgScope::Organization(pledge.organization_id);
        service.record_payment(&scope, pledge.id, payment(1000)).await.unwrap();

        let shekels = PledgeInput { currency: Some("ILS".into()), ..Default::default() };
        assert!(matches!(service.update_pledge(&scope, pledge.id, shekels).await, Err(ServiceError::CurrencyLocked(_))));
        let shrunk = PledgeInput { total_amount: Some(Decimal::from(500)), ..Default::default() };
        assert!(matches!(
            service.update_pledge(&scope, pledge.id, shrunk).await,
            Err(ServiceError::TotalBelowPaid { .. })
        ));
        let unchanged = store.get_pledge(&scope, pledge.id).await.unwrap();
        assert_eq!((unchanged.total_amount, unchanged.currency.as_str()), (Decimal::from(1800), "USD"));

        let settled = PledgeInput { total_amount: Some(Decimal::from(1000)), ..Default::default() };
        assert_eq!(service.update_pledge(&scope, pledge.id, settled).await.unwrap().status, PledgeStatus::Completed);
    }

    #[tokio::test]
    async fn donors_of_other_organizations_are_refused() {
        let (service, store, pledge) = setup().await;
        let other = Organization::new("Adath Israel");
        store.insert_organization(&other).await.unwrap();
        let outsider = Donor::new(other.id, "Dov", "Frank");
        store.insert_donor(&outsider).await.unwrap();
        let org = pledge.organization_id;

        let foreign_pledge = PledgeInput { donor_id: Some(outsider.id), total_amount: Some(Decimal::from(100)), ..Default::default() };
        assert!(matches!(service.create_pledge(org, foreign_pledge).await, Err(ServiceError::ForeignDonor(id)) if id == outsider.id));

        let foreign_gift = DonationInput { donor_id: Some(outsider.id), amount: Some(Decimal::from(36)), ..Default::default() };
        assert!(matches!(service.create_donation(org, foreign_gift).await, Err(ServiceError::ForeignDonor(_))));

        let moved = PledgeInput { donor_id: Some(outsider.id), ..Default::default() };
        assert!(matches!(
            service.update_pledge(&OrgScope::Organization(org), pledge.id, moved).await,
            Err(ServiceError::ForeignDonor(_))
        ));
        assert!(store.list_donations(&OrgScope::All).await.unwrap().is_empty());
    }
}
