pub mod api_client;
pub mod contract;
pub mod credentials;

pub use api_client::ApiClient;
pub use contract::{MaterialsService, OutcomeReporter};
pub use credentials::{CredentialStore, FileCredentialStore, StaticCredential};
