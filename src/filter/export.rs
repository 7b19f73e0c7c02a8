use super::error::FilterError;
use super::types::Listable;
use crate::database::models::{Donation, Donor, Organization, Pledge, UserRole, Yahrzeit};

/// Records with a fixed CSV column layout. Every header is also a
/// `Listable::field` name.
pub trait Exportable: Listable {
    const HEADERS: &'static [&'static str];
}

impl Exportable for Donor {
    const HEADERS: &'static [&'static str] = &[
        "id", "first_name", "last_name", "hebrew_name", "phone", "email", "address", "city", "notes", "created_at",
    ];
}

impl Exportable for Donation {
    const HEADERS: &'static [&'static str] = &[
        "id", "donor_id", "pledge_id", "donated_on", "amount", "currency", "fee", "net_amount",
        "donation_type", "payment_method", "status", "notes",
    ];
}

impl Exportable for Pledge {
    const HEADERS: &'static [&'static str] = &[
        "id", "donor_id", "pledged_on", "due_on", "total_amount", "amount_paid", "balance_owed", "currency",
        "frequency", "status", "notes",
    ];
}

impl Exportable for Yahrzeit {
    const HEADERS: &'static [&'static str] = &[
        "id", "deceased_name", "hebrew_name", "relationship", "date_of_death", "after_sunset", "hebrew_month",
        "hebrew_day", "observance", "contact_name", "contact_phone", "contact_email", "reminder_enabled",
    ];
}

impl Exportable for Organization {
    const HEADERS: &'static [&'static str] = &[
        "id", "name", "slug", "contact_email", "contact_phone", "subscription_tier", "subscription_status",
        "member_capacity",
    ];
}

impl Exportable for UserRole {
    const HEADERS: &'static [&'static str] = &["id", "user_id", "user_email", "organization_id", "role", "suspended"];
}

pub fn to_csv<T: Exportable>(records: &[T]) -> Result<Vec<u8>, FilterError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(T::HEADERS)?;
    for record in records {
        writer.write_record(T::HEADERS.iter().map(|h| record.field(h).to_text()))?;
    }
    writer
        .into_inner()
        .map_err(|e| FilterError::Csv(csv::Error::from(e.into_error())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn donor_csv_has_fixed_headers_and_quotes_commas() {
        let mut donor = Donor::new(Uuid::new_v4(), "Avi", "Katz").with_phone("718-555-0101");
        donor.address = Some("12 Main St, Apt 4".into());
        let bytes = to_csv(&[donor]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,first_name,last_name,hebrew_name,phone,email,address,city,notes,created_at")
        );
        let row = lines.next().unwrap();
        assert!(row.contains(",Avi,Katz,,7185550101,,\"12 Main St, Apt 4\","));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_export_is_just_headers() {
        let text = String::from_utf8(to_csv::<UserRole>(&[]).unwrap()).unwrap();
        assert_eq!(text, "id,user_id,user_email,organization_id,role,suspended\n");
    }
}
