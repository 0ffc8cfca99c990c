use crate::cli::database_migration::check_migration_state;
use crate::cli_error::CliError;
use crate::data_store::{get_store_from_env, SalasStore};
use crate::setup::{
    get_allowed_hosts_from_env, get_listen_address_from_env, get_listen_port_from_env,
    get_secret_from_env, get_time_zone_from_env,
};
use actix_web::middleware::from_fn;
use actix_web::{middleware, web, App, HttpServer};
use log::info;
use std::sync::Arc;

mod allowed_hosts;
mod http_error_logging;
mod time_calculation;
mod ui;

pub fn serve() -> Result<(), CliError> {
    check_migration_state()?;
    let state = AppState::new()?;
    let listen_address = get_listen_address_from_env()?;
    let listen_port = get_listen_port_from_env()?;
    info!(
        "Starting web server on {}:{} (time zone {})",
        listen_address, listen_port, state.time_zone
    );
    actix_web::rt::System::new()
        .block_on(
            HttpServer::new(move || {
                App::new()
                    .configure(ui::configure_app)
                    .app_data(web::Data::new(state.clone()))
                    .wrap(from_fn(allowed_hosts::allowed_hosts_middleware))
                    .wrap(middleware::Compress::default())
            })
            .bind((listen_address, listen_port))
            .map_err(CliError::BindError)?
            .run(),
        )
        .map_err(CliError::ServerError)
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn SalasStore>,
    secret: String,
    /// Time zone for displaying timestamps and interpreting dates and times entered by users
    time_zone: chrono_tz::Tz,
    /// Accepted values of the HTTP Host header (lowercase, without port). `*` accepts any host.
    allowed_hosts: Vec<String>,
}

impl AppState {
    pub fn new() -> Result<Self, CliError> {
        Ok(Self {
            store: Arc::new(get_store_from_env()?),
            secret: get_secret_from_env()?,
            time_zone: get_time_zone_from_env()?,
            allowed_hosts: get_allowed_hosts_from_env()?,
        })
    }
}
