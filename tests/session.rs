#[path = "session/store_contract.rs"]
mod store_contract;
