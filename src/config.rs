//! Store configuration

use mongodb::options::ClientOptions;
use serde::Deserialize;

/// Collection the store uses unless configured otherwise
pub const DEFAULT_COLLECTION_NAME: &str = "passwordless-token";

/// Database used when neither the config nor the connection URI names one
pub const DEFAULT_DATABASE_NAME: &str = "passwordless";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MongoStoreConfig {
    /// Collection holding the token documents
    pub collection_name: String,

    /// Database override; when unset, the database named in the connection
    /// URI is used, falling back to "passwordless"
    pub database_name: Option<String>,

    /// Prebuilt driver options, used verbatim instead of parsing the URI
    #[serde(skip)]
    pub client_options: Option<ClientOptions>,
}

impl Default for MongoStoreConfig {
    fn default() -> Self {
        Self {
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            database_name: None,
            client_options: None,
        }
    }
}
