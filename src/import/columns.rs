use super::ImportKind;

/// Spreadsheet header spellings mapped onto the canonical column names
const ALIASES: &[(&str, &str)] = &[
    ("phone_number", "phone"),
    ("phone_no", "phone"),
    ("mobile", "phone"),
    ("mobile_phone", "phone"),
    ("cell", "phone"),
    ("cell_phone", "phone"),
    ("telephone", "phone"),
    ("tel", "phone"),
    ("e_mail", "email"),
    ("email_address", "email"),
    ("mail", "email"),
    ("first", "first_name"),
    ("firstname", "first_name"),
    ("given_name", "first_name"),
    ("last", "last_name"),
    ("lastname", "last_name"),
    ("surname", "last_name"),
    ("family_name", "last_name"),
    ("name", "full_name"),
    ("donor", "full_name"),
    ("donor_name", "full_name"),
    ("hebrew", "hebrew_name"),
    ("street", "address"),
    ("street_address", "address"),
    ("town", "city"),
    ("sum", "amount"),
    ("total", "amount"),
    ("total_amount", "amount"),
    ("pledge_amount", "amount"),
    ("donation_amount", "amount"),
    ("amount_paid", "paid"),
    ("paid_amount", "paid"),
    ("donation_date", "date"),
    ("donated_on", "date"),
    ("pledge_date", "date"),
    ("pledged_on", "date"),
    ("payment_date", "date"),
    ("due", "due_date"),
    ("due_on", "due_date"),
    ("payment_method", "method"),
    ("payment", "method"),
    ("donation_type", "type"),
    ("category", "type"),
    ("processing_fee", "fee"),
    ("fees", "fee"),
    ("curr", "currency"),
    ("ccy", "currency"),
    ("recurrence", "frequency"),
    ("note", "notes"),
    ("comment", "notes"),
    ("comments", "notes"),
    ("memo", "notes"),
];

/// Trimmed, lower-cased, spaces and dashes to `_`
pub fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim_start_matches('\u{feff}').trim().chars() {
        let c = if c == ' ' || c == '-' { '_' } else { c };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.extend(c.to_lowercase());
    }
    out.trim_matches('_').to_string()
}

pub fn canonical(raw: &str) -> String {
    let normalized = normalize_header(raw);
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, name)| name.to_string())
        .unwrap_or(normalized)
}

/// Columns understood for each import kind, in template order
pub fn headers_for(kind: ImportKind) -> &'static [&'static str] {
    match kind {
        ImportKind::Donors => &[
            "first_name", "last_name", "full_name", "hebrew_name", "phone", "email", "address", "city", "notes",
        ],
        ImportKind::Donations => &[
            "phone", "email", "amount", "date", "currency", "type", "method", "status", "fee", "notes",
        ],
        ImportKind::Pledges => &[
            "phone", "email", "amount", "paid", "date", "due_date", "currency", "frequency", "status", "notes",
        ],
    }
}
