use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Middleware для логирования HTTP запросов: метод, путь, статус и длительность
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;
    let status = response.status().as_u16();
    let duration = start.elapsed().as_millis();

    if response.status().is_server_error() {
        tracing::warn!("HTTP | {} {} {} {}ms", status, method, path, duration);
    } else {
        tracing::info!("HTTP | {} {} {} {}ms", status, method, path, duration);
    }
    response
}
