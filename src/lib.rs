pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::{
    FirebasePictureStore, FirestoreStore, LocalPictureStore, MailNotifier, MemoryStore,
};
pub use crate::config::TomlConfig;
pub use crate::core::{
    directory::{DonorDirectory, StatusStream},
    donation_request::DonationRequestService,
    donor_query::DonorQueryService,
    profile_update::ProfileUpdateService,
};
pub use crate::domain::model::{
    BloodGroup, DonorBuckets, DonorQuery, ProfileChanges, ProfileEdit, Resource, UpdateOutcome,
    UserRecord,
};
pub use crate::utils::error::{DirectoryError, Result};
