use crate::record::ClientRecord;

/// Records whose advertiser contains `query`, ignoring case and surrounding
/// whitespace. A blank query returns a copy of everything.
pub fn filter_by_advertiser(records: &[ClientRecord], query: &str) -> Vec<ClientRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| record.advertiser().trim().to_lowercase().contains(needle.as_str()))
        .cloned()
        .collect()
}

/// Filtered snapshot of the store. Recomputed in full on every change.
#[derive(Debug, Default, Clone)]
pub struct FilterView {
    query: String,
    rows: Vec<ClientRecord>,
}

impl FilterView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        self.query.as_str()
    }

    pub fn rows(&self) -> &[ClientRecord] {
        self.rows.as_slice()
    }

    pub fn set_query(&mut self, query: &str, records: &[ClientRecord]) -> &[ClientRecord] {
        self.query = query.to_string();
        self.refresh(records)
    }

    pub fn refresh(&mut self, records: &[ClientRecord]) -> &[ClientRecord] {
        self.rows = filter_by_advertiser(records, self.query.as_str());
        self.rows.as_slice()
    }
}
