use crate::domain::model::{NeighborhoodId, PriceField, PriceRecord};
use crate::utils::error::{NavError, Result};
use std::collections::HashMap;

/// In-progress price edits, one record per loaded neighborhood.
#[derive(Debug, Default)]
pub struct AttributeCache {
    records: HashMap<NeighborhoodId, PriceRecord>,
}

impl AttributeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole cache with freshly fetched records.
    pub fn seed(&mut self, records: HashMap<NeighborhoodId, PriceRecord>) {
        self.records = records;
    }

    pub fn get(&self, id: NeighborhoodId) -> Option<&PriceRecord> {
        self.records.get(&id)
    }

    pub fn set(&mut self, id: NeighborhoodId, field: PriceField, value: Option<f64>) -> Result<()> {
        let record = self.records.get_mut(&id).ok_or(NavError::UnknownEntity {
            kind: NeighborhoodId::KIND,
            id: id.0,
        })?;
        record.set(field, value);
        tracing::debug!("✏️ Neighborhood {}: {} = {:?}", id, field, value);
        Ok(())
    }

    /// Snapshot of the full record to send as an update.
    pub fn submission(&self, id: NeighborhoodId) -> Result<PriceRecord> {
        self.records.get(&id).cloned().ok_or(NavError::UnknownEntity {
            kind: NeighborhoodId::KIND,
            id: id.0,
        })
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

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> AttributeCache {
        let mut cache = AttributeCache::new();
        let mut first = PriceRecord::default();
        first.set(PriceField::Penthouse, Some(900.0));
        cache.seed(HashMap::from([
            (NeighborhoodId(501), first),
            (NeighborhoodId(502), PriceRecord::default()),
        ]));
        cache
    }

    #[test]
    fn test_set_touches_one_field_of_one_record() {
        let mut cache = seeded();
        cache
            .set(NeighborhoodId(501), PriceField::Apartment, Some(50000.0))
            .unwrap();

        let edited = cache.get(NeighborhoodId(501)).unwrap();
        assert_eq!(edited.apartment, Some(50000.0));
        assert_eq!(edited.penthouse, Some(900.0));
        assert!(cache.get(NeighborhoodId(502)).unwrap().is_empty());
    }

    #[test]
    fn test_set_unknown_id_is_rejected() {
        let mut cache = seeded();
        let err = cache
            .set(NeighborhoodId(999), PriceField::Plot, Some(1.0))
            .unwrap_err();
        assert!(matches!(err, NavError::UnknownEntity { id: 999, .. }));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_seed_replaces_previous_district() {
        let mut cache = seeded();
        cache.seed(HashMap::from([(NeighborhoodId(601), PriceRecord::default())]));
        assert!(cache.get(NeighborhoodId(501)).is_none());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.submission(NeighborhoodId(601)).is_err());
    }
}
