use std::path::PathBuf;

use actix_files::Files;
use actix_web::{middleware, web, HttpResponse};

use crate::config::ServerConfig;

/// Register the train API, the plot images and the single-page app
pub fn configure(config: &ServerConfig) -> impl FnOnce(&mut web::ServiceConfig) {
    let train_data_path = config.train_data_path.clone();
    let plots_dir = config.plots_dir.clone();
    let dist_dir = config.dist_dir.clone();

    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(TrainData(train_data_path)))
            .route("/api/trains", web::get().to(get_trains))
            .route("/api/trains/", web::get().to(get_trains))
            .service(Files::new("/plots", plots_dir))
            .service(Files::new("/", dist_dir).index_file("index.html"));
    }
}

/// Lets the configured origin read the API from another host (the dev server)
#[must_use]
pub fn cors_headers(config: &ServerConfig) -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", config.allowed_origin.clone()))
}

/// Location of the train manifest on disk
struct TrainData(PathBuf);

/// Serve the train manifest, re-reading it on every request so a fresh
/// collector run is picked up without a restart
async fn get_trains(data: web::Data<TrainData>) -> HttpResponse {
    let path = data.0.clone();
    let contents = match web::block(move || std::fs::read_to_string(path)).await {
        Ok(Ok(contents)) => contents,
        Ok(Err(e)) => {
            log::error!("Failed to read train data {}: {e}", data.0.display());
            return HttpResponse::InternalServerError().finish();
        }
        Err(e) => {
            log::error!("Train data read was cancelled: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    match serde_json::from_str::<serde_json::Value>(&contents) {
        Ok(trains) => HttpResponse::Ok().json(trains),
        Err(e) => {
            log::error!("Train data {} is not valid JSON: {e}", data.0.display());
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use std::fs;

    fn config_in(dir: &tempfile::TempDir) -> ServerConfig {
        ServerConfig {
            train_data_path: dir.path().join("train_img_data.json"),
            plots_dir: dir.path().join("plots"),
            dist_dir: dir.path().join("dist"),
            ..ServerConfig::default()
        }
    }

    #[actix_web::test]
    async fn test_serves_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(&dir);
        fs::write(
            &config.train_data_path,
            r#"[{"id": "All Trains", "animation_start": 100, "background_img": "plots/main_bg_plot_1.png", "foreground_img": "plots/main_plot_1.png"}]"#,
        )
        .expect("write manifest");

        let app = test::init_service(App::new().configure(configure(&config))).await;

        for uri in ["/api/trains", "/api/trains/"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body[0]["id"], "All Trains");
            assert_eq!(body[0]["animation_start"], 100);
        }
    }

    #[actix_web::test]
    async fn test_missing_manifest_is_server_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(&dir);

        let app = test::init_service(App::new().configure(configure(&config))).await;
        let req = test::TestRequest::get().uri("/api/trains").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_malformed_manifest_is_server_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(&dir);
        fs::write(&config.train_data_path, "[{").expect("write manifest");

        let app = test::init_service(App::new().configure(configure(&config))).await;
        let req = test::TestRequest::get().uri("/api/trains/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_serves_plot_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(&dir);
        fs::create_dir_all(&config.plots_dir).expect("plots dir");
        fs::write(config.plots_dir.join("2150_plot_7.png"), b"png").expect("write plot");

        let app = test::init_service(App::new().configure(configure(&config))).await;
        let req = test::TestRequest::get()
            .uri("/plots/2150_plot_7.png")
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(&body[..], b"png");
    }

    #[actix_web::test]
    async fn test_cors_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(&dir);
        fs::write(&config.train_data_path, "[]").expect("write manifest");

        let app = test::init_service(
            App::new()
                .wrap(cors_headers(&config))
                .configure(configure(&config)),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/trains").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get("Access-Control-Allow-Origin")
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:5173")
        );
    }
}
