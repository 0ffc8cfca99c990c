use crate::cli::util::query_user_bool;
use crate::cli::CliAuthTokenKey;
use crate::cli_error::CliError;
use crate::data_store::auth_token::GlobalAuthToken;
use crate::data_store::models::NewRoom;
use crate::data_store::{get_store_from_env, RoomId, SalasStore};

pub fn print_room_list() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = GlobalAuthToken::create_for_cli(&auth_key);
    let rooms = data_store.get_all_rooms(&auth_token)?;

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec!["id", "name", "active", "description"])
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .add_rows(rooms.into_iter().map(|room| {
            [
                room.id.to_string(),
                room.name,
                if room.is_active { "yes" } else { "no" }.to_owned(),
                room.description,
            ]
        }));

    println!("{table}");
    Ok(())
}

pub fn add_room(name: &str, description: &str) -> Result<(), CliError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 100 {
        return Err(CliError::DataError(
            "Room name must have between 1 and 100 characters".to_owned(),
        ));
    }
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = GlobalAuthToken::create_for_cli(&auth_key);
    let existing = data_store.get_all_rooms(&auth_token)?;
    if existing.iter().any(|r| r.name == name)
        && !query_user_bool(
            &format!("A room named \"{}\" exists already. Create anyway?", name),
            Some(false),
        )
    {
        return Ok(());
    }

    let room_id = data_store.create_room_globally(
        &auth_token,
        NewRoom {
            name: name.to_owned(),
            description: description.to_owned(),
            is_active: true,
        },
    )?;
    println!("Room \"{}\" created with id {}.", name, room_id);
    Ok(())
}

pub fn set_room_active(room_id: RoomId, is_active: bool) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let auth_key = CliAuthTokenKey::new();
    let auth_token = GlobalAuthToken::create_for_cli(&auth_key);
    data_store.set_room_active(&auth_token, room_id, is_active)?;
    println!(
        "Room {} {}.",
        room_id,
        if is_active { "activated" } else { "deactivated" }
    );
    Ok(())
}
