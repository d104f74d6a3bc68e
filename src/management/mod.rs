mod credentials;

pub use credentials::CredentialStore;
pub use credentials::FileStore;
pub use credentials::MemoryStore;
