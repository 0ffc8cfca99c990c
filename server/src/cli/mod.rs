//! Implementation of the command line interface commands (besides `serve`)

pub mod database_migration;
pub mod manage_rooms;
pub mod manage_users;
mod util;

/// Key for creating a [crate::data_store::auth_token::GlobalAuthToken]. Only the command line
/// interface functions create such keys.
pub struct CliAuthTokenKey {
    _private: (),
}

impl CliAuthTokenKey {
    #[allow(clippy::new_without_default)] // We always want to explicitly create these objects
    pub fn new() -> Self {
        Self { _private: () }
    }
}
