/// Persistence port and its drivers.
pub mod game_store;
/// Storage entities.
pub mod models;
/// Backend-agnostic storage errors.
pub mod storage;
