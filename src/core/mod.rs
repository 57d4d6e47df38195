pub mod directory;
pub mod donation_request;
pub mod donor_query;
pub mod profile_update;

pub use crate::domain::model::{
    BloodGroup, DonorBuckets, DonorQuery, ProfileChanges, ProfileEdit, Resource, UpdateOutcome,
    UserRecord,
};
pub use crate::domain::ports::{DocumentStore, MailAddress, MailMessage, Notifier, PictureStore};
pub use crate::utils::error::Result;
