use crate::web::AppState;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use log::warn;

/// Reject requests with an HTTP Host header that is not listed in the application's allowed hosts
/// with "400 Bad Request".
pub async fn allowed_hosts_middleware<B: MessageBody>(
    req: actix_web::dev::ServiceRequest,
    next: actix_web::middleware::Next<B>,
) -> Result<actix_web::dev::ServiceResponse<EitherBody<B>>, actix_web::Error> {
    let rejected_host = {
        let host = request_host(&req);
        match req.app_data::<web::Data<AppState>>() {
            Some(state) if !host_is_allowed(&host, &state.allowed_hosts) => Some(host),
            _ => None,
        }
    };
    if let Some(host) = rejected_host {
        warn!(
            "HTTP 400 invalid Host header {:?}. Client: <{}>",
            host,
            req.connection_info()
                .realip_remote_addr()
                .unwrap_or("unknown")
        );
        let response = HttpResponse::BadRequest().body("Bad Request (400): invalid Host header");
        return Ok(req.into_response(response).map_into_right_body());
    }

    Ok(next.call(req).await?.map_into_left_body())
}

/// Host as sent in the HTTP Host header, or the URI authority for HTTP/2 requests without one.
/// Forwarding headers (`Forwarded`, `X-Forwarded-Host`) are not considered.
fn request_host(req: &actix_web::dev::ServiceRequest) -> String {
    match req.headers().get(header::HOST) {
        Some(value) => value.to_str().unwrap_or("").to_owned(),
        None => req.uri().authority().map(|a| a.to_string()).unwrap_or_default(),
    }
}

/// Check if the `host` (as given in the HTTP Host header, optionally including a port) matches
/// one of the `allowed_hosts` patterns.
///
/// Patterns are compared case-insensitively. A pattern `*` matches every host, a pattern starting
/// with a dot (like `.example.org`) matches the domain and all of its subdomains.
fn host_is_allowed(host: &str, allowed_hosts: &[String]) -> bool {
    let host = strip_port(host).to_lowercase();
    if host.is_empty() {
        return false;
    }
    allowed_hosts.iter().any(|pattern| {
        if pattern == "*" || *pattern == host {
            true
        } else if let Some(domain) = pattern.strip_prefix('.') {
            host == domain || host.ends_with(pattern.as_str())
        } else {
            false
        }
    })
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_store::store_mock::StoreMock;
    use actix_web::middleware::from_fn;
    use actix_web::{http, test as actix_test, App};
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_middleware_checks_host_header() {
        let app = actix_test::init_service(
            App::new()
                .wrap(from_fn(allowed_hosts_middleware))
                .app_data(web::Data::new(AppState {
                    store: Arc::new(StoreMock::default()),
                    secret: "test".to_owned(),
                    time_zone: chrono_tz::UTC,
                    allowed_hosts: vec!["localhost".to_owned()],
                }))
                .route("/", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/")
            .insert_header((header::HOST, "localhost:8000"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::OK);

        let req = actix_test::TestRequest::get()
            .uri("/")
            .insert_header((header::HOST, "evil.org"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);

        // Forwarding headers must not override the Host header
        let req = actix_test::TestRequest::get()
            .uri("/")
            .insert_header((header::HOST, "evil.org"))
            .insert_header(("X-Forwarded-Host", "localhost"))
            .insert_header((header::FORWARDED, "host=localhost"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
    }

    fn hosts(list: &[&str]) -> Vec<String> {
        list.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn test_host_is_allowed() {
        let allowed = hosts(&["localhost", "127.0.0.1", ".salas.example.org"]);
        assert!(host_is_allowed("localhost", &allowed));
        assert!(host_is_allowed("localhost:8000", &allowed));
        assert!(host_is_allowed("LocalHost:8000", &allowed));
        assert!(host_is_allowed("127.0.0.1:80", &allowed));
        assert!(host_is_allowed("salas.example.org", &allowed));
        assert!(host_is_allowed("intranet.salas.example.org:443", &allowed));
        assert!(!host_is_allowed("evil.org", &allowed));
        assert!(!host_is_allowed("notsalas.example.org", &allowed));
        assert!(!host_is_allowed("", &allowed));
    }

    #[test]
    fn test_wildcard_host() {
        assert!(host_is_allowed("anything.example", &hosts(&["*"])));
        assert!(!host_is_allowed("anything.example", &hosts(&[])));
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("localhost:8000"), "localhost");
        assert_eq!(strip_port("localhost"), "localhost");
        assert_eq!(strip_port("[::1]:8000"), "[::1]");
    }
}
