use std::collections::HashMap;

use crate::api::types::Record;

/// Ephemeral copies of records fetched from the store, keyed by id
#[derive(Debug, Default)]
pub struct RecordCache {
    records: HashMap<String, Record>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn insert(&mut self, record: Record) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn extend(&mut self, records: &[Record]) {
        for record in records {
            self.insert(record.clone());
        }
    }

    pub fn invalidate(&mut self, id: &str) -> bool {
        self.records.remove(id).is_some()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
