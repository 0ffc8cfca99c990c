use crate::web::ui::error::AppError;
use log::{error, info, warn};

pub async fn error_logging_middleware<B: actix_web::body::MessageBody>(
    req: actix_web::dev::ServiceRequest,
    next: actix_web::middleware::Next<B>,
) -> Result<actix_web::dev::ServiceResponse<B>, actix_web::Error> {
    let response = next.call(req).await?;

    if let Some(error) = response.response().error() {
        if let Some(app_error) = error.as_error::<AppError>() {
            match app_error {
                AppError::PageNotFound => {
                    warn!(
                        "HTTP {} page not found at <{}>",
                        response.response().status(),
                        response.request().uri()
                    );
                }
                AppError::NotAuthenticated { session_error } => {
                    if let Some(session_error) = session_error {
                        warn!(
                            "HTTP {} invalid session token at <{}>. Client: <{}> Cause: {:?}",
                            response.response().status(),
                            response.request().uri(),
                            response
                                .request()
                                .connection_info()
                                .realip_remote_addr()
                                .unwrap_or("unknown"),
                            session_error
                        );
                    } else {
                        info!(
                            "HTTP {} not authenticated at <{}>. Redirecting to login.",
                            response.response().status(),
                            response.request().uri(),
                        );
                    }
                }
                AppError::PermissionDenied { required_privilege } => {
                    warn!(
                        "HTTP {} permission denied at <{}>. Client: <{}> Requires privilege: {:?}",
                        response.response().status(),
                        response.request().uri(),
                        response
                            .request()
                            .connection_info()
                            .realip_remote_addr()
                            .unwrap_or("unknown"),
                        required_privilege,
                    );
                }
                AppError::EntityNotFound | AppError::TransactionConflict => {}
                AppError::DatabaseConnectionError(e) => {
                    error!(
                        "HTTP {} database connection error: {}",
                        response.response().status(),
                        e
                    );
                }
                AppError::InternalError(e) => {
                    error!(
                        "HTTP {} internal server error at <{}>: {}",
                        response.response().status(),
                        response.request().uri(),
                        e
                    );
                }
            }
        } else {
            error!(
                "HTTP {} unexpected error at <{}>: {:?}",
                response.response().status(),
                response.request().uri(),
                error
            );
        }
    }
    Ok(response)
}
