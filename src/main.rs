use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use loteria_backend::{
    AppError,
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    stores::{CatalogStore, PostgresCatalog, PostgresLedger, TicketLedger},
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");
    let admission_settings = AdmissionSettings::from_config(&config.admission)
        .expect("Invalid admission configuration");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建JWT服务
    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // 存储
    let catalog: Arc<dyn CatalogStore> = Arc::new(PostgresCatalog::new(pool.clone()));
    let ledger: Arc<dyn TicketLedger> = Arc::new(PostgresLedger::new(pool.clone()));

    // 创建服务
    let admission_service =
        AdmissionService::new(catalog.clone(), ledger.clone(), admission_settings);
    let report_service = ReportService::new(catalog.clone(), ledger.clone(), config.reports.clone());
    let catalog_service = CatalogService::new(catalog.clone());

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{} (default time zone {})",
        config.server.host,
        config.server.port,
        config.admission.default_time_zone
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::ValidationError(format!("Invalid request body: {err}")).into()
            }))
            .app_data(web::Data::new(admission_service.clone()))
            .app_data(web::Data::new(report_service.clone()))
            .app_data(web::Data::new(catalog_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::ticket_config)
                    .configure(handlers::report_config)
                    .configure(handlers::catalog_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
