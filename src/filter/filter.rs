use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, Listable, Page};

/// In-memory query over a fully fetched result set: where, text search,
/// multi-field order and pagination.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    where_data: FilterWhere,
    order_data: Vec<FilterOrderInfo>,
    search_terms: Vec<String>,
    limit: Option<usize>,
    offset: usize,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: FilterData) -> Result<Self, FilterError> {
        let mut filter = Self::new();
        filter.assign(data)?;
        Ok(filter)
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        if let Some(q) = data.q { self.search(&q); }
        match (data.page, data.per_page, data.limit) {
            (Some(page), per_page, _) => { self.page(page, per_page)?; }
            (None, Some(per_page), _) => { self.page(1, Some(per_page))?; }
            (None, None, Some(limit)) => { self.limit(limit, data.offset); }
            (None, None, None) => {
                if let Some(offset) = data.offset { self.offset = offset; }
            }
        }
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        self.where_data = FilterWhere::parse(&conditions)?;
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn search(&mut self, q: &str) -> &mut Self {
        self.search_terms = q.split_whitespace().map(|t| t.to_lowercase()).collect();
        self
    }

    pub fn limit(&mut self, limit: usize, offset: Option<usize>) -> &mut Self {
        // Apply max page size from config
        let max = crate::config::CONFIG.listing.max_page_size;
        let applied = if limit > max {
            if crate::config::CONFIG.listing.debug_logging {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max);
            }
            max
        } else {
            limit
        };
        self.limit = Some(applied);
        self.offset = offset.unwrap_or(0);
        self
    }

    pub fn page(&mut self, page: usize, per_page: Option<usize>) -> Result<&mut Self, FilterError> {
        if page == 0 {
            return Err(FilterError::InvalidPage("Page numbers start at 1".to_string()));
        }
        let per_page = per_page.unwrap_or(crate::config::CONFIG.listing.default_page_size);
        if per_page == 0 {
            return Err(FilterError::InvalidPage("per_page must be positive".to_string()));
        }
        self.limit(per_page, None);
        let applied = self.limit.unwrap_or(per_page);
        self.offset = (page - 1)
            .checked_mul(applied)
            .ok_or_else(|| FilterError::InvalidPage(format!("Page {} is out of range", page)))?;
        Ok(self)
    }

    pub fn matches<T: Listable>(&self, record: &T) -> bool {
        self.where_data.matches(record) && self.matches_search(record)
    }

    fn matches_search<T: Listable>(&self, record: &T) -> bool {
        if self.search_terms.is_empty() {
            return true;
        }
        let haystack: Vec<String> = record.search_fields().into_iter().map(|s| s.to_lowercase()).collect();
        let digits: Vec<String> = haystack
            .iter()
            .map(|s| s.chars().filter(|c| c.is_ascii_digit()).collect())
            .collect();
        self.search_terms.iter().all(|term| {
            let term_digits: String = term.chars().filter(|c| c.is_ascii_digit()).collect();
            let phone_like = term_digits.len() >= 3
                && term.chars().all(|c| c.is_ascii_digit() || "+-(). ".contains(c));
            haystack.iter().any(|h| h.contains(term.as_str()))
                || (phone_like && digits.iter().any(|d| d.contains(term_digits.as_str())))
        })
    }

    /// Filtered and sorted records without pagination (exports, totals)
    pub fn select<T: Listable>(&self, records: Vec<T>) -> Vec<T> {
        let mut selected: Vec<T> = records.into_iter().filter(|r| self.matches(r)).collect();
        FilterOrder::sort(&self.order_data, &mut selected);
        selected
    }

    pub fn apply<T: Listable>(&self, records: Vec<T>) -> Page<T> {
        self.paginate(self.select(records))
    }

    /// Cuts one page out of records already passed through `select`
    pub fn paginate<T>(&self, selected: Vec<T>) -> Page<T> {
        let total = selected.len();
        let per_page = self
            .limit
            .unwrap_or_else(|| crate::config::CONFIG.listing.default_page_size)
            .max(1);
        let items: Vec<T> = selected.into_iter().skip(self.offset).take(per_page).collect();
        Page {
            items,
            total,
            page: self.offset / per_page + 1,
            per_page,
            total_pages: total.div_ceil(per_page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::FieldValue;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        name: &'static str,
        phone: &'static str,
        amount: i32,
    }

    impl Listable for Row {
        fn field(&self, name: &str) -> FieldValue {
            match name {
                "id" => (self.id as i32).into(),
                "name" => self.name.into(),
                "phone" => self.phone.into(),
                "amount" => self.amount.into(),
                _ => FieldValue::Null,
            }
        }

        fn search_fields(&self) -> Vec<String> {
            vec![self.name.to_string(), self.phone.to_string()]
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: 1, name: "Levi", phone: "(718) 555-0101", amount: 50 },
            Row { id: 2, name: "Cohen", phone: "718-555-0102", amount: 180 },
            Row { id: 3, name: "Adler", phone: "212 555 0103", amount: 50 },
            Row { id: 4, name: "Baum", phone: "", amount: 360 },
            Row { id: 5, name: "cohen", phone: "646.555.0105", amount: 18 },
        ]
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let filter = Filter::from_data(FilterData { order: Some(json!("amount asc")), limit: Some(10), ..Default::default() }).unwrap();
        let page = filter.apply(rows());
        let ids: Vec<u32> = page.items.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 1, 3, 2, 4]);
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let data = FilterData {
            where_clause: Some(json!({ "amount": { "$gte": 50 } })),
            order: Some(json!(["name asc", "id desc"])),
            page: Some(1),
            per_page: Some(2),
            ..Default::default()
        };
        let filter = Filter::from_data(data).unwrap();
        let first = filter.apply(rows());
        let second = filter.apply(rows());
        assert_eq!(first.items, second.items);
        assert_eq!(first.total, 4);
        assert_eq!(first.total_pages, 2);
        let names: Vec<&str> = first.items.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Adler", "Baum"]);

        let resorted = filter.select(filter.select(rows()));
        assert_eq!(resorted, filter.select(rows()));
    }

    #[test]
    fn pagination_windows() {
        let filter = Filter::from_data(FilterData { page: Some(3), per_page: Some(2), ..Default::default() }).unwrap();
        let page = filter.apply(rows());
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 3);

        assert!(Filter::from_data(FilterData { page: Some(0), ..Default::default() }).is_err());
    }

    #[test]
    fn huge_page_numbers_are_rejected() {
        let data = FilterData { page: Some(usize::MAX), per_page: Some(10), ..Default::default() };
        assert!(matches!(Filter::from_data(data), Err(FilterError::InvalidPage(_))));
    }

    #[test]
    fn text_search_matches_names_and_phone_digits() {
        let mut filter = Filter::new();
        filter.search("COHEN");
        assert_eq!(filter.select(rows()).len(), 2);

        filter.search("7185550102");
        let hits = filter.select(rows());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);
    }
}
