use crate::core::{BloodGroup, DocumentStore, DonorBuckets, DonorQuery, Result, UserRecord};
use crate::utils::error::DirectoryError;
use std::sync::Arc;

pub const BLOOD_GROUP_FIELD: &str = "bloodGroup";

/// Looks up donors for a requesting user. Never returns the requester's own record.
pub struct DonorQueryService<S: DocumentStore> {
    store: Arc<S>,
}

impl<S: DocumentStore> Clone for DonorQueryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> DonorQueryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn query(
        &self,
        requester_id: &str,
        filter: Option<BloodGroup>,
    ) -> Result<DonorQuery> {
        match filter {
            Some(group) => self.find_donors(requester_id, group).await.map(DonorQuery::Matches),
            None => self.group_donors(requester_id).await.map(DonorQuery::Grouped),
        }
    }

    pub async fn find_donors(
        &self,
        requester_id: &str,
        group: BloodGroup,
    ) -> Result<Vec<UserRecord>> {
        tracing::debug!("Querying donors with blood group {} for {}", group, requester_id);

        let records = self
            .store
            .query(BLOOD_GROUP_FIELD, group.as_str())
            .await
            .map_err(into_retrieval)?;

        let donors: Vec<UserRecord> = records
            .into_iter()
            .filter(|record| record.user_id() != requester_id)
            .collect();

        tracing::info!("Found {} {} donors", donors.len(), group);
        Ok(donors)
    }

    pub async fn group_donors(&self, requester_id: &str) -> Result<DonorBuckets> {
        tracing::debug!("Grouping all donors for {}", requester_id);

        let records = self.store.list().await.map_err(into_retrieval)?;
        let buckets: DonorBuckets = records
            .into_iter()
            .filter(|record| record.user_id() != requester_id)
            .collect();

        tracing::info!(
            "Grouped {} donors into {} blood groups",
            buckets.total(),
            buckets.iter().count()
        );
        Ok(buckets)
    }
}

// Decode and transport failures from the store all surface as one kind.
fn into_retrieval(err: DirectoryError) -> DirectoryError {
    match err {
        DirectoryError::RetrievalError { .. } => err,
        other => DirectoryError::retrieval(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ProfileChanges;
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct MockStore {
        records: Vec<UserRecord>,
        offline: bool,
    }

    impl MockStore {
        fn new(records: Vec<UserRecord>) -> Self {
            Self {
                records,
                offline: false,
            }
        }

        fn offline() -> Self {
            Self {
                records: vec![],
                offline: true,
            }
        }

        fn check(&self) -> Result<()> {
            if self.offline {
                return Err(DirectoryError::retrieval("store unreachable"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DocumentStore for MockStore {
        async fn get(&self, id: &str) -> Result<Option<UserRecord>> {
            self.check()?;
            Ok(self.records.iter().find(|r| r.user_id() == id).cloned())
        }

        async fn set(&self, _id: &str, _changes: &ProfileChanges) -> Result<()> {
            self.check()
        }

        async fn query(&self, field: &str, value: &str) -> Result<Vec<UserRecord>> {
            self.check()?;
            assert_eq!(field, BLOOD_GROUP_FIELD);
            Ok(self
                .records
                .iter()
                .filter(|r| r.blood_group.as_str() == value)
                .cloned()
                .collect())
        }

        async fn put(&self, _record: &UserRecord) -> Result<()> {
            self.check()
        }

        async fn list(&self) -> Result<Vec<UserRecord>> {
            self.check()?;
            Ok(self.records.clone())
        }
    }

    fn donor(id: &str, group: BloodGroup) -> UserRecord {
        UserRecord::new(id, format!("Donor {}", id), group)
    }

    fn ids(records: &[UserRecord]) -> Vec<&str> {
        records.iter().map(UserRecord::user_id).collect()
    }

    #[tokio::test]
    async fn test_group_donors_example_partition() {
        let store = MockStore::new(vec![
            donor("1", BloodGroup::OPositive),
            donor("2", BloodGroup::APositive),
            donor("3", BloodGroup::OPositive),
        ]);
        let service = DonorQueryService::new(Arc::new(store));

        let buckets = service.group_donors("requester").await.unwrap();

        assert_eq!(ids(buckets.get(BloodGroup::OPositive)), vec!["1", "3"]);
        assert_eq!(ids(buckets.get(BloodGroup::APositive)), vec!["2"]);
        assert_eq!(buckets.iter().count(), 2);
    }

    #[tokio::test]
    async fn test_group_donors_is_complete_partition() {
        let records: Vec<UserRecord> = (0..40)
            .map(|i| donor(&i.to_string(), BloodGroup::ALL[i % BloodGroup::ALL.len()]))
            .collect();
        let service = DonorQueryService::new(Arc::new(MockStore::new(records.clone())));

        let buckets = service.group_donors("nobody").await.unwrap();

        assert_eq!(buckets.total(), records.len());
        let mut seen = HashSet::new();
        for (group, members) in buckets.iter() {
            for member in members {
                assert_eq!(member.blood_group, group);
                assert!(seen.insert(member.user_id().to_string()), "duplicate record");
            }
        }
        assert_eq!(seen.len(), records.len());
    }

    #[tokio::test]
    async fn test_group_donors_excludes_requester() {
        let store = MockStore::new(vec![
            donor("me", BloodGroup::BNegative),
            donor("other", BloodGroup::BNegative),
        ]);
        let service = DonorQueryService::new(Arc::new(store));

        let buckets = service.group_donors("me").await.unwrap();

        assert_eq!(ids(buckets.get(BloodGroup::BNegative)), vec!["other"]);
        assert_eq!(buckets.total(), 1);
    }

    #[tokio::test]
    async fn test_find_donors_filters_and_keeps_order() {
        let store = MockStore::new(vec![
            donor("9", BloodGroup::AbPositive),
            donor("me", BloodGroup::AbPositive),
            donor("4", BloodGroup::APositive),
            donor("2", BloodGroup::AbPositive),
        ]);
        let service = DonorQueryService::new(Arc::new(store));

        let donors = service.find_donors("me", BloodGroup::AbPositive).await.unwrap();

        assert_eq!(ids(&donors), vec!["9", "2"]);
    }

    #[tokio::test]
    async fn test_find_donors_empty_match_is_not_an_error() {
        let store = MockStore::new(vec![donor("1", BloodGroup::OPositive)]);
        let service = DonorQueryService::new(Arc::new(store));

        let donors = service.find_donors("me", BloodGroup::ONegative).await.unwrap();

        assert!(donors.is_empty());
    }

    #[tokio::test]
    async fn test_query_dispatches_on_filter() {
        let store = MockStore::new(vec![donor("1", BloodGroup::OPositive)]);
        let service = DonorQueryService::new(Arc::new(store));

        assert!(matches!(
            service.query("me", Some(BloodGroup::OPositive)).await.unwrap(),
            DonorQuery::Matches(ref m) if m.len() == 1
        ));
        assert!(matches!(
            service.query("me", None).await.unwrap(),
            DonorQuery::Grouped(ref b) if b.total() == 1
        ));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_retrieval_failure() {
        let service = DonorQueryService::new(Arc::new(MockStore::offline()));

        let err = service.find_donors("me", BloodGroup::OPositive).await.unwrap_err();
        assert!(matches!(err, DirectoryError::RetrievalError { .. }));

        let err = service.group_donors("me").await.unwrap_err();
        assert!(matches!(err, DirectoryError::RetrievalError { .. }));
    }
}
