use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, Registry, TextEncoder};
use std::thread::JoinHandle;

/// Serve `/metrics` and `/health` on a background thread for the life of
/// the process. The producer keeps running if the server fails to bind.
pub fn spawn_metrics_server(registry: Registry, port: u16) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let system = actix_web::rt::System::new();
        if let Err(e) = system.block_on(serve(registry, port)) {
            tracing::error!(port, error = %e, "Metrics server stopped");
        }
    })
}

async fn serve(registry: Registry, port: u16) -> std::io::Result<()> {
    tracing::info!("📊 Metrics available at http://0.0.0.0:{}/metrics", port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(registry.clone()))
            .route("/metrics", web::get().to(metrics_handler))
            .route("/health", web::get().to(health_handler))
    })
    .workers(1)
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

/// Prometheus text exposition of everything in the registry.
fn encode_metrics(registry: &Registry) -> prometheus::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(buffer)
}

async fn metrics_handler(registry: web::Data<Registry>) -> impl Responder {
    match encode_metrics(&registry) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn health_handler() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
