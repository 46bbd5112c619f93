pub mod schema;

pub use schema::{
    Config, DEFAULT_RELAY_PORT, ImageConfig, ProvidersConfig, RelayConfig, StorageBackend,
    StorageConfig,
};
