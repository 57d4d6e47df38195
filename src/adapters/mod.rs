// Adapters layer: concrete implementations of the domain ports.

pub mod firebase_storage;
pub mod firestore;
pub mod local_pictures;
pub mod mail;
pub mod memory;

pub use firebase_storage::FirebasePictureStore;
pub use firestore::FirestoreStore;
pub use local_pictures::LocalPictureStore;
pub use mail::MailNotifier;
pub use memory::MemoryStore;
