mod env_overrides;
mod loader;
#[cfg(test)]
mod test_env;
mod types;

pub use types::{
    Config, DEFAULT_RELAY_PORT, ImageConfig, ProvidersConfig, RelayConfig, StorageBackend,
    StorageConfig,
};
