use crate::core::{
    DocumentStore, PictureStore, ProfileChanges, ProfileEdit, Result, UpdateOutcome, UserRecord,
};
use crate::utils::error::DirectoryError;
use crate::utils::validation::{validate_email, validate_phone};
use std::sync::Arc;

/// Applies profile edits against the last-loaded snapshot of a record.
///
/// A new picture is uploaded before any field is written, and its reference
/// travels in the same update as the text fields. If the upload fails the
/// document store is never touched.
pub struct ProfileUpdateService<S: DocumentStore, P: PictureStore> {
    store: Arc<S>,
    pictures: Arc<P>,
}

impl<S: DocumentStore, P: PictureStore> Clone for ProfileUpdateService<S, P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            pictures: Arc::clone(&self.pictures),
        }
    }
}

impl<S: DocumentStore, P: PictureStore> ProfileUpdateService<S, P> {
    pub fn new(store: Arc<S>, pictures: Arc<P>) -> Self {
        Self { store, pictures }
    }

    /// Field-by-field comparison of the text fields. The picture is not compared.
    pub fn diff(snapshot: &UserRecord, edit: &ProfileEdit) -> ProfileChanges {
        fn changed(current: &str, submitted: &str) -> Option<String> {
            (current != submitted).then(|| submitted.to_string())
        }

        ProfileChanges {
            name: changed(&snapshot.name, &edit.name),
            full_address: changed(&snapshot.full_address, &edit.full_address),
            email: changed(&snapshot.email, &edit.email),
            phone_number: changed(&snapshot.phone_number, &edit.phone_number),
            profile_picture_url: None,
        }
    }

    pub async fn update_profile(
        &self,
        snapshot: &UserRecord,
        edit: ProfileEdit,
    ) -> Result<UpdateOutcome> {
        let user_id = snapshot.user_id();
        let mut changes = Self::diff(snapshot, &edit);

        if edit.picture.is_none() && changes.is_empty() {
            tracing::warn!("No profile changes for {}, skipping update", user_id);
            return Ok(UpdateOutcome::Unchanged);
        }

        Self::validate_changes(&changes)?;

        if let Some(bytes) = &edit.picture {
            if bytes.is_empty() {
                return Err(DirectoryError::validation("picture", "image is empty"));
            }

            tracing::debug!("Uploading profile picture for {} ({} bytes)", user_id, bytes.len());
            let reference = self
                .pictures
                .upload(user_id, bytes)
                .await
                .map_err(|e| match e {
                    DirectoryError::PictureUploadError { .. } => e,
                    other => DirectoryError::picture_upload(other),
                })?;
            changes.profile_picture_url = Some(reference);
        }

        tracing::debug!("Writing fields {:?} for {}", changes.field_names(), user_id);
        self.store
            .set(user_id, &changes)
            .await
            .map_err(|e| match e {
                DirectoryError::RetrievalError { .. } => e,
                other => DirectoryError::retrieval(other),
            })?;

        let mut updated = snapshot.clone();
        changes.apply_to(&mut updated);

        tracing::info!("Updated profile of {}", user_id);
        Ok(UpdateOutcome::Updated(updated))
    }

    fn validate_changes(changes: &ProfileChanges) -> Result<()> {
        if let Some(name) = &changes.name {
            if name.trim().is_empty() {
                return Err(DirectoryError::validation("name", "name cannot be empty"));
            }
        }
        if let Some(email) = &changes.email {
            validate_email("email", email)?;
        }
        if let Some(phone) = &changes.phone_number {
            validate_phone("phone_number", phone)?;
        }
        Ok(())
    }
}
