use crate::auth_session::hash_password;
use crate::cli::util::query_new_password;
use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::auth_token::{AccessRole, GlobalAuthToken, MANAGER_GROUP_NAME};
use crate::data_store::models::NewUser;
use crate::data_store::{get_store_from_env, SalasStore};
use log::info;

const MIN_PASSWORD_LENGTH: usize = 8;

pub fn print_user_list() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = GlobalAuthToken::create_for_cli(&auth_key);
    let users = data_store.get_users(&auth_token)?;

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec!["id", "username", "active", "roles", "groups"])
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .add_rows(users.into_iter().map(|user| {
            [
                user.user.id.to_string(),
                user.user.username.clone(),
                if user.user.is_active { "yes" } else { "no" }.to_owned(),
                AccessRole::roles_for_user(&user.user, &user.groups)
                    .iter()
                    .map(|r| r.name())
                    .collect::<Vec<_>>()
                    .join(", "),
                user.groups.join(", "),
            ]
        }));

    println!("{table}");
    Ok(())
}

/// Create a new user account. The password is queried interactively.
///
/// `admin` sets the staff flag, granting the administrator role. `manager` adds the user to the
/// manager group.
pub fn create_user(username: &str, admin: bool, manager: bool) -> Result<(), CliError> {
    let username = username.trim();
    if username.is_empty() || username.chars().count() > 150 {
        return Err(CliError::DataError(
            "Username must have between 1 and 150 characters".to_owned(),
        ));
    }
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    println!("Creating user {}", username);
    let password = query_new_password(MIN_PASSWORD_LENGTH);
    let password_hash = hash_password(&password)?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = GlobalAuthToken::create_for_cli(&auth_key);
    let groups = if manager {
        vec![MANAGER_GROUP_NAME.to_owned()]
    } else {
        vec![]
    };
    let user_id = data_store.create_user(
        &auth_token,
        NewUser {
            username: username.to_owned(),
            password_hash,
            is_superuser: false,
            is_staff: admin,
            is_active: true,
        },
        groups,
    )?;
    info!("Created user {} with id {}", username, user_id);
    println!("User {} created.", username);
    Ok(())
}

/// Set a new password for an existing user. The password is queried interactively.
pub fn set_password(username: &str) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    println!("Setting password of user {}", username);
    let password = query_new_password(MIN_PASSWORD_LENGTH);
    let password_hash = hash_password(&password)?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = GlobalAuthToken::create_for_cli(&auth_key);
    data_store.set_user_password_hash(&auth_token, username, &password_hash)?;
    println!("Password changed.");
    Ok(())
}
