use crate::core::donor_query::DonorQueryService;
use crate::core::profile_update::ProfileUpdateService;
use crate::core::{
    BloodGroup, DocumentStore, DonorQuery, PictureStore, ProfileEdit, Resource, Result,
    UpdateOutcome, UserRecord,
};
use crate::utils::error::ErrorCategory;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Per-request status channel: `Loading`, then one terminal state.
pub struct StatusStream<T> {
    rx: mpsc::Receiver<Resource<T>>,
}

impl<T> StatusStream<T> {
    pub async fn next(&mut self) -> Option<Resource<T>> {
        self.rx.recv().await
    }

    /// Waits for the terminal state, skipping `Loading`.
    pub async fn finish(mut self) -> Resource<T> {
        while let Some(status) = self.rx.recv().await {
            if status.is_terminal() {
                return status;
            }
        }
        Resource::Error {
            category: ErrorCategory::Internal,
            message: "request ended without a result".to_string(),
        }
    }
}

/// Entry point for callers: each request runs on its own task and reports
/// through its own [`StatusStream`]. Dropping the stream does not cancel the
/// request; its result is discarded.
pub struct DonorDirectory<S: DocumentStore, P: PictureStore> {
    store: Arc<S>,
    pictures: Arc<P>,
    donors: DonorQueryService<S>,
    profiles: ProfileUpdateService<S, P>,
}

impl<S, P> DonorDirectory<S, P>
where
    S: DocumentStore + 'static,
    P: PictureStore + 'static,
{
    pub fn new(store: S, pictures: P) -> Self {
        Self::from_shared(Arc::new(store), Arc::new(pictures))
    }

    pub fn from_shared(store: Arc<S>, pictures: Arc<P>) -> Self {
        Self {
            donors: DonorQueryService::new(Arc::clone(&store)),
            profiles: ProfileUpdateService::new(Arc::clone(&store), Arc::clone(&pictures)),
            store,
            pictures,
        }
    }

    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    pub fn read_user(&self, user_id: &str) -> StatusStream<Option<UserRecord>> {
        let store = Arc::clone(&self.store);
        let user_id = user_id.to_string();
        spawn_request(async move {
            tracing::debug!("Reading user {}", user_id);
            store.get(&user_id).await
        })
    }

    pub fn save_user(&self, record: UserRecord) -> StatusStream<()> {
        let store = Arc::clone(&self.store);
        spawn_request(async move {
            store.put(&record).await?;
            tracing::info!("Saved user {}", record.user_id());
            Ok(())
        })
    }

    pub fn find_donors(
        &self,
        requester_id: &str,
        filter: Option<BloodGroup>,
    ) -> StatusStream<DonorQuery> {
        let donors = self.donors.clone();
        let requester_id = requester_id.to_string();
        spawn_request(async move { donors.query(&requester_id, filter).await })
    }

    pub fn update_profile(
        &self,
        snapshot: UserRecord,
        edit: ProfileEdit,
    ) -> StatusStream<UpdateOutcome> {
        let profiles = self.profiles.clone();
        spawn_request(async move { profiles.update_profile(&snapshot, edit).await })
    }

    pub fn resolve_picture(&self, user_id: &str) -> StatusStream<Option<String>> {
        let pictures = Arc::clone(&self.pictures);
        let user_id = user_id.to_string();
        spawn_request(async move { pictures.resolve(&user_id).await })
    }
}

fn spawn_request<T, F>(work: F) -> StatusStream<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(2);
    tokio::spawn(async move {
        // Capacity covers both sends, so neither blocks on a slow reader.
        let _ = tx.send(Resource::Loading).await;
        let result = work.await;
        if let Err(e) = &result {
            tracing::warn!("Request failed: {}", e);
        }
        if tx.send(Resource::from_result(result)).await.is_err() {
            tracing::debug!("Caller stopped listening, discarding result");
        }
    });
    StatusStream { rx }
}
