use std::env;
use std::env::VarError;
use std::fmt::{Display, Formatter};

/// Get the database URL from the environment.
///
/// If `DATABASE_URL` is set, it is used as is. Otherwise, the URL is assembled from the variables
/// `POSTGRES_HOST`, `POSTGRES_PORT`, `POSTGRES_USER`, `POSTGRES_PASSWORD` and `POSTGRES_DB`, each
/// of them falling back to a default value.
pub fn get_database_url_from_env() -> Result<String, SetupError> {
    if let Some(url) = get_optional_env("DATABASE_URL")? {
        return Ok(url);
    }
    let host = get_env_or_default("POSTGRES_HOST", "db")?;
    let port: u16 = get_env_or_default("POSTGRES_PORT", "5432")?
        .parse()
        .map_err(|_| SetupError::EnvVariableInvalid {
            variable_name: "POSTGRES_PORT",
            problem: "Not a valid uint16",
        })?;
    let user = get_env_or_default("POSTGRES_USER", "postgres")?;
    let password = get_env_or_default("POSTGRES_PASSWORD", "postgres")?;
    let database = get_env_or_default("POSTGRES_DB", "gestion_salas")?;
    Ok(build_database_url(&host, port, &user, &password, &database))
}

fn build_database_url(host: &str, port: u16, user: &str, password: &str, database: &str) -> String {
    let mut url = url::Url::parse("postgres://localhost").expect("Static URL should be valid");
    // Setting these parts only fails for URLs without host, which is not the case here
    let _ = url.set_host(Some(host));
    let _ = url.set_port(Some(port));
    let _ = url.set_username(user);
    let _ = url.set_password(Some(password));
    url.set_path(database);
    url.to_string()
}

/// Get the cryptographic application secret for signing secure tokens from the environment variable.
pub fn get_secret_from_env() -> Result<String, SetupError> {
    env::var("SECRET").map_err(|e| SetupError::from_env_error(e, "SECRET"))
}

/// Get the web server TCP listening port from the environment variable
pub fn get_listen_port_from_env() -> Result<u16, SetupError> {
    get_env_or_default("LISTEN_PORT", "8000")?
        .parse()
        .map_err(|_| SetupError::EnvVariableInvalid {
            variable_name: "LISTEN_PORT",
            problem: "Not a valid uint16",
        })
}

/// Get the web server TCP listening interface address from the environment variable
pub fn get_listen_address_from_env() -> Result<String, SetupError> {
    get_env_or_default("LISTEN_ADDRESS", "0.0.0.0")
}

/// Get the list of accepted HTTP Host header values from the comma-separated `ALLOWED_HOSTS`
/// environment variable
pub fn get_allowed_hosts_from_env() -> Result<Vec<String>, SetupError> {
    Ok(parse_allowed_hosts(&get_env_or_default(
        "ALLOWED_HOSTS",
        "localhost,127.0.0.1",
    )?))
}

fn parse_allowed_hosts(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|h| h.trim().to_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

/// Get the time zone for displaying and entering local dates and times from the environment
/// variable
pub fn get_time_zone_from_env() -> Result<chrono_tz::Tz, SetupError> {
    get_env_or_default("TIME_ZONE", "America/Santiago")?
        .parse()
        .map_err(|_| SetupError::EnvVariableInvalid {
            variable_name: "TIME_ZONE",
            problem: "Not a known IANA time zone name",
        })
}

fn get_optional_env(variable_name: &'static str) -> Result<Option<String>, SetupError> {
    match env::var(variable_name) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e) => Err(SetupError::from_env_error(e, variable_name)),
    }
}

fn get_env_or_default(
    variable_name: &'static str,
    default: &str,
) -> Result<String, SetupError> {
    Ok(get_optional_env(variable_name)?.unwrap_or_else(|| default.to_owned()))
}

#[derive(Debug)]
pub enum SetupError {
    EnvVariableMissing {
        variable_name: &'static str,
    },
    EnvVariableInvalid {
        variable_name: &'static str,
        problem: &'static str,
    },
}

impl SetupError {
    fn from_env_error(error: VarError, variable_name: &'static str) -> Self {
        match error {
            VarError::NotPresent => Self::EnvVariableMissing { variable_name },
            VarError::NotUnicode(_) => Self::EnvVariableInvalid {
                variable_name,
                problem: "no valid unicode",
            },
        }
    }
}

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::EnvVariableMissing { variable_name } => {
                write!(f, "Environment variable {} must be defined", variable_name)
            }
            SetupError::EnvVariableInvalid {
                variable_name,
                problem,
            } => write!(
                f,
                "Value of environment variable {} is invalid: {}",
                variable_name, problem
            ),
        }
    }
}

impl std::error::Error for SetupError {}
