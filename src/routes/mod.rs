use actix_files as fs;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use std::path::Path;

use crate::state::AppState;

/// HTTP handler for the index page
pub async fn index(app_state: web::Data<AppState>) -> actix_web::Result<fs::NamedFile> {
    let page = Path::new(&app_state.static_dir).join("index.html");
    Ok(fs::NamedFile::open(page)?)
}

/// Liveness and connection count
pub async fn status(app_state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "sessions": app_state.session_count(),
        "backend": app_state.api_url,
    }))
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: &str) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/status").route(web::get().to(status)))
        .service(web::resource("/").route(web::get().to(index)))
        .service(fs::Files::new("/static", static_dir));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;
    use std::sync::Arc;

    fn app_state(static_dir: &str) -> web::Data<AppState> {
        web::Data::new(AppState::new(
            Arc::new(FakeBackend::default()),
            "http://localhost:5000/api",
            static_dir,
        ))
    }

    #[actix_rt::test]
    async fn status_reports_backend_and_sessions() {
        let state = app_state("./static");
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(|cfg| configure_routes(cfg, "./static")),
        )
        .await;

        let req = test::TestRequest::get().uri("/status").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sessions"], 0);
        assert_eq!(body["backend"], "http://localhost:5000/api");
    }

    #[actix_rt::test]
    async fn serves_the_page_from_the_static_dir() {
        let state = app_state("./static");
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(|cfg| configure_routes(cfg, "./static")),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_rt::test]
    async fn missing_page_is_an_http_error() {
        let state = app_state("./no-such-dir");
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(|cfg| configure_routes(cfg, "./no-such-dir")),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
