use crate::auth_session::SessionError;
use crate::data_store::auth_token::Privilege;
use crate::data_store::StoreError;
use actix_web::error::UrlGenerationError;
use actix_web::http::StatusCode;
use actix_web::ResponseError;
use std::fmt::{Display, Formatter};

/// Semantic error type for ui endpoint functions
///
/// The different enum items are meant to produce different descriptive and helpful error pages for
/// the user, with an appropriate HTTP status code.
///
/// The error pages are generated using the
/// [crate::web::ui::framework::error_page::error_page_middleware] middleware, because actix-web's
/// ResponseError trait is quite restricted in what it can do. The middleware also turns
/// [AppError::NotAuthenticated] into a redirect to the login form.
#[derive(Debug)]
pub enum AppError {
    PageNotFound,
    EntityNotFound,
    /// The client has no valid session of an active user
    NotAuthenticated {
        session_error: Option<SessionError>,
    },
    /// The user is authenticated, but none of their roles qualifies for the `required_privilege`
    PermissionDenied {
        required_privilege: Privilege,
    },
    TransactionConflict,
    DatabaseConnectionError(String),
    InternalError(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConnectionError(error) => Self::DatabaseConnectionError(error),
            StoreError::QueryError(diesel_error) => {
                Self::InternalError(format!("Database query failed: {}", diesel_error))
            }
            StoreError::TransactionConflict => Self::TransactionConflict,
            StoreError::NotExisting => Self::EntityNotFound,
            StoreError::ConflictEntityExists => {
                Self::InternalError("Conflicting entity exists".to_owned())
            }
            StoreError::PermissionDenied { required_privilege } => {
                Self::PermissionDenied { required_privilege }
            }
            StoreError::InvalidInputData(e) => Self::InternalError(format!("Invalid data: {}", e)),
            StoreError::InvalidDataInDatabase(e) => Self::InternalError(format!(
                "Data queried from database could not be deserialized: {}",
                e
            )),
            e @ StoreError::BookingConflict(_) => {
                Self::InternalError(format!("Unhandled booking conflict: {}", e))
            }
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(_e: actix_web::error::BlockingError) -> Self {
        AppError::InternalError(
            "Could not get thread from thread pool for synchronous database operation.".to_owned(),
        )
    }
}

impl From<askama::Error> for AppError {
    fn from(value: askama::Error) -> Self {
        AppError::InternalError(format!("Error while rendering template: {}", value))
    }
}

impl From<UrlGenerationError> for AppError {
    fn from(value: UrlGenerationError) -> Self {
        AppError::InternalError(format!("Could not generate URL: {}", value))
    }
}

impl From<serde_urlencoded::ser::Error> for AppError {
    fn from(value: serde_urlencoded::ser::Error) -> Self {
        AppError::InternalError(format!(
            "Error while serializing URL query parameters: {}",
            value
        ))
    }
}

impl AppError {
    /// Names of the roles qualifying for the missing privilege, for showing them on the error page
    pub fn qualifying_role_names(&self) -> Vec<&'static str> {
        match self {
            AppError::PermissionDenied { required_privilege } => required_privilege
                .qualifying_roles()
                .iter()
                .map(|role| role.name())
                .collect(),
            _ => vec![],
        }
    }

    /// Spanish title of the error page
    pub fn title(&self) -> &'static str {
        match self {
            AppError::PageNotFound | AppError::EntityNotFound => "No encontrado",
            AppError::NotAuthenticated { .. } => "Inicio de sesión requerido",
            AppError::PermissionDenied { .. } => "Acceso denegado",
            AppError::TransactionConflict => "Conflicto de acceso a la base de datos",
            AppError::DatabaseConnectionError(_) | AppError::InternalError(_) => {
                "Error interno del servidor"
            }
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::PageNotFound => write!(f, "Not found"),
            AppError::TransactionConflict => {
                write!(f, "Concurrent database transaction conflict. Please retry.")
            }
            AppError::EntityNotFound => write!(f, "Entity not found"),
            AppError::NotAuthenticated { session_error } => {
                write!(f, "Client is not authenticated.")?;
                if let Some(session_error) = session_error {
                    write!(
                        f,
                        " Session was present, but invalid, because of {:?}",
                        session_error
                    )?;
                }
                Ok(())
            }
            AppError::PermissionDenied { required_privilege } => {
                write!(
                    f,
                    "Client is not authorized to perform this action. {:?} privilege required, \
                    granted to {}",
                    required_privilege,
                    self.qualifying_role_names().join(" or ")
                )
            }
            AppError::DatabaseConnectionError(e) => {
                write!(f, "Could not connect to database: {}", e)
            }
            AppError::InternalError(e) => write!(f, "Internal program error: {}", e),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::PageNotFound | AppError::EntityNotFound => StatusCode::NOT_FOUND,
            AppError::NotAuthenticated { .. } => StatusCode::SEE_OTHER,
            AppError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            AppError::TransactionConflict => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseConnectionError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_names_roles() {
        let error: AppError = StoreError::PermissionDenied {
            required_privilege: Privilege::ManageEvents,
        }
        .into();
        assert_eq!(error.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            error.qualifying_role_names(),
            vec!["Gestor de Eventos", "Administrador"]
        );
    }

    #[test]
    fn test_store_error_status_codes() {
        assert_eq!(
            AppError::from(StoreError::NotExisting).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(StoreError::TransactionConflict).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(StoreError::ConnectionError("down".to_owned())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
