//! Stone-matching application service over the diamond repository.

use gemledger_core::{DomainError, DomainResult};
use gemledger_stones::{
    Diamond, DiamondId, InventoryStatus, MatchedSet, MatchingCriteria, MatchingSession,
    SessionCommand, find_matches,
};

use crate::lot_service::ServiceError;
use crate::store::KeyedStore;

#[derive(Debug)]
pub struct MatchingService<S> {
    store: S,
    default_criteria: MatchingCriteria,
}

impl<S> MatchingService<S>
where
    S: KeyedStore<DiamondId, Diamond>,
{
    pub fn new(store: S, default_criteria: MatchingCriteria) -> DomainResult<Self> {
        default_criteria.validate()?;
        Ok(Self {
            store,
            default_criteria,
        })
    }

    pub fn default_criteria(&self) -> &MatchingCriteria {
        &self.default_criteria
    }

    /// Add or replace a diamond (keyed by id).
    pub fn add_diamond(&self, diamond: Diamond) -> Result<(), ServiceError> {
        tracing::debug!(sku = %diamond.sku, shape = %diamond.shape, carat = diamond.carat, "diamond stocked");
        self.store.upsert(diamond.id, diamond)?;
        Ok(())
    }

    pub fn remove_diamond(&self, id: DiamondId) -> Result<Option<Diamond>, ServiceError> {
        Ok(self.store.remove(&id)?)
    }

    pub fn set_status(
        &self,
        id: DiamondId,
        status: InventoryStatus,
    ) -> Result<Diamond, ServiceError> {
        let diamond = self.store.get(&id).ok_or(DomainError::NotFound)?;
        let updated = diamond.with_status(status);
        self.store.upsert(id, updated.clone())?;
        Ok(updated)
    }

    /// The whole inventory ordered by SKU (then id), which fixes matching input order.
    pub fn pool(&self) -> Vec<Diamond> {
        let mut pool = self.store.list();
        pool.sort_by(|a, b| a.sku.cmp(&b.sku).then(a.id.cmp(&b.id)));
        pool
    }

    pub fn find_matches(&self, criteria: &MatchingCriteria) -> DomainResult<Vec<MatchedSet>> {
        find_matches(&self.pool(), criteria)
    }

    pub fn find_default_matches(&self) -> DomainResult<Vec<MatchedSet>> {
        self.find_matches(&self.default_criteria)
    }

    /// A session that has already searched the current pool with the default criteria.
    pub fn search_session(&self) -> DomainResult<MatchingSession> {
        let mut session = MatchingSession::new(self.default_criteria.clone())?;
        session.update(SessionCommand::Search(self.pool()))?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemledger_stones::{ClarityGrade, ColorGrade, CutGrade, Shape};

    use crate::store::InMemoryStore;

    fn round(sku: &str, carat: f64) -> Diamond {
        Diamond::new(
            sku,
            Shape::Round,
            carat,
            ColorGrade::G,
            ClarityGrade::VS1,
            CutGrade::Excellent,
            650_000,
        )
    }

    fn service() -> MatchingService<InMemoryStore<DiamondId, Diamond>> {
        MatchingService::new(InMemoryStore::new(), MatchingCriteria::default()).unwrap()
    }

    #[test]
    fn pool_is_sorted_by_sku() {
        let svc = service();
        svc.add_diamond(round("D-003", 1.50)).unwrap();
        svc.add_diamond(round("D-001", 1.00)).unwrap();
        svc.add_diamond(round("D-002", 1.02)).unwrap();

        let skus: Vec<_> = svc.pool().into_iter().map(|d| d.sku).collect();
        assert_eq!(skus, vec!["D-001", "D-002", "D-003"]);
    }

    #[test]
    fn pairs_close_weights() {
        let svc = service();
        svc.add_diamond(round("D-001", 1.00)).unwrap();
        svc.add_diamond(round("D-002", 1.02)).unwrap();
        svc.add_diamond(round("D-003", 1.50)).unwrap();

        let sets = svc.find_default_matches().unwrap();
        assert_eq!(sets.len(), 1);
        let skus: Vec<_> = sets[0].diamonds.iter().map(|d| d.sku.as_str()).collect();
        assert_eq!(skus, vec!["D-001", "D-002"]);
    }

    #[test]
    fn sold_stones_drop_out() {
        let svc = service();
        let a = round("D-001", 1.00);
        let a_id = a.id;
        svc.add_diamond(a).unwrap();
        svc.add_diamond(round("D-002", 1.02)).unwrap();

        svc.set_status(a_id, InventoryStatus::Sold).unwrap();
        assert!(svc.find_default_matches().unwrap().is_empty());

        let missing = DiamondId::new(gemledger_core::EntityId::new());
        assert!(matches!(
            svc.set_status(missing, InventoryStatus::Sold),
            Err(ServiceError::Domain(DomainError::NotFound))
        ));
    }

    #[test]
    fn removed_stone_leaves_the_pool() {
        let svc = service();
        let a = round("D-001", 1.00);
        let a_id = a.id;
        svc.add_diamond(a).unwrap();

        assert_eq!(svc.remove_diamond(a_id).unwrap().map(|d| d.sku), Some("D-001".to_string()));
        assert!(svc.remove_diamond(a_id).unwrap().is_none());
        assert!(svc.pool().is_empty());
    }

    #[test]
    fn session_selects_best_set() {
        let svc = service();
        svc.add_diamond(round("D-001", 1.00)).unwrap();
        svc.add_diamond(round("D-002", 1.02)).unwrap();

        let session = svc.search_session().unwrap();
        assert!(session.has_searched());
        assert_eq!(session.selected_set().map(|s| s.id.as_str()), Some("set-1"));
    }

    #[test]
    fn invalid_default_criteria_are_refused() {
        let criteria = MatchingCriteria {
            min_set_size: 1,
            ..MatchingCriteria::default()
        };
        assert!(MatchingService::new(InMemoryStore::<DiamondId, Diamond>::new(), criteria).is_err());
    }
}
