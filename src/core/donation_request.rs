use crate::core::{DocumentStore, MailAddress, MailMessage, Notifier, Result, UserRecord};
use crate::utils::error::DirectoryError;
use std::sync::Arc;

pub struct DonationRequestService<S: DocumentStore, N: Notifier> {
    store: Arc<S>,
    notifier: Arc<N>,
}

impl<S: DocumentStore, N: Notifier> DonationRequestService<S, N> {
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    /// Mails the donor on behalf of the requester; replies go to the requester.
    pub async fn request_donation(
        &self,
        requester_id: &str,
        donor_id: &str,
        note: Option<&str>,
    ) -> Result<MailMessage> {
        if requester_id == donor_id {
            return Err(DirectoryError::validation(
                "donor",
                "cannot request a donation from yourself",
            ));
        }

        let requester = self.load(requester_id).await?;
        let donor = self.load(donor_id).await?;

        if donor.email.trim().is_empty() {
            return Err(DirectoryError::validation(
                "donor",
                format!("donor {} has no email address", donor_id),
            ));
        }
        if requester.email.trim().is_empty() {
            return Err(DirectoryError::validation(
                "requester",
                format!("requester {} needs an email address to receive replies", requester_id),
            ));
        }

        let message = compose(&requester, &donor, note);
        self.notifier.notify(&message).await.map_err(|e| match e {
            DirectoryError::NotificationError { .. } => e,
            other => DirectoryError::notification(other),
        })?;

        tracing::info!("Sent donation request from {} to {}", requester_id, donor_id);
        Ok(message)
    }

    async fn load(&self, id: &str) -> Result<UserRecord> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| DirectoryError::retrieval(format!("no user record for {}", id)))
    }
}

fn compose(requester: &UserRecord, donor: &UserRecord, note: Option<&str>) -> MailMessage {
    let mut body = format!(
        "Hello {},\n\n{} is looking for a {} blood donor and found you in the donor directory.\n",
        display_name(donor),
        display_name(requester),
        donor.blood_group
    );
    if !requester.phone_number.is_empty() {
        body.push_str(&format!("You can reach them at {}.\n", requester.phone_number));
    }
    if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
        body.push_str(&format!("\n{}\n", note));
    }

    MailMessage {
        to: MailAddress {
            email: donor.email.clone(),
            name: non_empty(&donor.name),
        },
        reply_to: MailAddress {
            email: requester.email.clone(),
            name: non_empty(&requester.name),
        },
        subject: format!("Blood donation request ({})", donor.blood_group),
        body,
    }
}

fn display_name(record: &UserRecord) -> &str {
    if record.name.is_empty() {
        "there"
    } else {
        &record.name
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::core::BloodGroup;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MockNotifier {
        sent: Mutex<Vec<MailMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn notify(&self, message: &MailMessage) -> Result<()> {
            if self.fail {
                return Err(DirectoryError::notification("401 Unauthorized"));
            }
            self.sent.lock().await.push(message.clone());
            Ok(())
        }
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        let mut requester = UserRecord::new("req", "Ravi", BloodGroup::BNegative);
        requester.email = "ravi@mail.org".to_string();
        requester.phone_number = "+91 90000 00001".to_string();
        let mut donor = UserRecord::new("don", "Meera", BloodGroup::BNegative);
        donor.email = "meera@mail.org".to_string();
        let silent = UserRecord::new("silent", "No Mail", BloodGroup::OPositive);

        for record in [requester, donor, silent] {
            store.put(&record).await.unwrap();
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_request_donation_sends_mail_to_donor() {
        let notifier = Arc::new(MockNotifier::default());
        let service = DonationRequestService::new(seeded_store().await, notifier.clone());

        let message = service
            .request_donation("req", "don", Some("Surgery at 10am tomorrow"))
            .await
            .unwrap();

        assert_eq!(message.to.email, "meera@mail.org");
        assert_eq!(message.reply_to.email, "ravi@mail.org");
        assert_eq!(message.subject, "Blood donation request (B-)");
        assert!(message.body.contains("Hello Meera"));
        assert!(message.body.contains("+91 90000 00001"));
        assert!(message.body.contains("Surgery at 10am tomorrow"));
        assert_eq!(notifier.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_request_donation_rejects_self_and_missing_email() {
        let notifier = Arc::new(MockNotifier::default());
        let service = DonationRequestService::new(seeded_store().await, notifier.clone());

        assert!(matches!(
            service.request_donation("req", "req", None).await,
            Err(DirectoryError::ValidationError { .. })
        ));
        assert!(matches!(
            service.request_donation("req", "silent", None).await,
            Err(DirectoryError::ValidationError { .. })
        ));
        assert!(matches!(
            service.request_donation("req", "ghost", None).await,
            Err(DirectoryError::RetrievalError { .. })
        ));
        assert!(matches!(
            service.request_donation("silent", "don", None).await,
            Err(DirectoryError::ValidationError { ref field, .. }) if field == "requester"
        ));
        assert!(notifier.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_notifier_failure_is_reported() {
        let notifier = Arc::new(MockNotifier {
            sent: Mutex::new(Vec::new()),
            fail: true,
        });
        let service = DonationRequestService::new(seeded_store().await, notifier);

        let err = service.request_donation("req", "don", None).await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotificationError { .. }));
    }
}
