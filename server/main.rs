use actix_web::{middleware, App, HttpServer};
use train_reveal_server::config::ServerConfig;
use train_reveal_server::routes::{configure, cors_headers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = ServerConfig::from_env();
    let port = config.port;

    log::info!(
        "Starting server on 0.0.0.0:{port} (train data: {}, plots: {})",
        config.train_data_path.display(),
        config.plots_dir.display()
    );

    HttpServer::new(move || {
        App::new()
            .wrap(cors_headers(&config))
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .configure(configure(&config))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
