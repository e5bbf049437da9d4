use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::time::{Duration, Instant};

const SLOW_REQUEST: Duration = Duration::from_millis(500);

/// Registra método, caminho, status e duração de cada requisição.
pub async fn log_requests(request: Request<Body>, next: Next) -> Response {
  let method = request.method().clone();
  let uri = request.uri().clone();
  log::debug!("-> {} {}", method, uri);

  let start = Instant::now();
  let response = next.run(request).await;
  let elapsed = start.elapsed();

  if elapsed > SLOW_REQUEST {
    log::warn!("requisição lenta: {} {} levou {:?}", method, uri, elapsed);
  }
  log::info!("{} {} {} {}ms", method, uri.path(), response.status().as_u16(), elapsed.as_millis());
  response
}
