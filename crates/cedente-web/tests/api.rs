use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use cedente_domain::InMemoryCedenteRepository;
use cedente_web::{build_router, AppConfig, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn config() -> AppConfig {
  AppConfig { enable_background_jobs: false, max_upload_mb: 1, ..AppConfig::default() }
}

fn app() -> Router {
  let state = AppState::new(Arc::new(InMemoryCedenteRepository::new()), config(), "sqlite").expect("state");
  build_router(state)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
  let res = app.clone().oneshot(req).await.expect("response");
  let status = res.status();
  let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
  (status, bytes.to_vec())
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(b) => builder.header(header::CONTENT_TYPE, "application/json").body(Body::from(b.to_string())),
    None => builder.body(Body::empty()),
  }.expect("request");
  let (status, bytes) = send(app, req).await;
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json body") };
  (status, value)
}

fn multipart(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
  let boundary = "XBOUNDARYX";
  let mut body = format!("--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"{n}\"\r\n\
                          Content-Type: application/octet-stream\r\n\r\n",
                         b = boundary,
                         f = field,
                         n = filename).into_bytes();
  body.extend_from_slice(content);
  body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
  Request::builder().method("POST")
                    .uri("/api/importar-excel")
                    .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
                    .body(Body::from(body))
                    .expect("request")
}

#[tokio::test]
async fn health_reports_backend() {
  let app = app();
  let (status, body) = call(&app, "GET", "/health", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
  assert_eq!(body["backend"], "sqlite");
}

#[tokio::test]
async fn cedente_crud_over_http() {
  let app = app();
  let (status, body) = call(&app,
                            "POST",
                            "/api/cedentes",
                            Some(json!({ "nome": "Maria Silva", "cpf_cnpj": "529.982.247-25", "contrato": "pontos_atencao" }))).await;
  assert_eq!(status, StatusCode::CREATED);
  let id = body["cedente"]["id"].as_i64().expect("id");
  assert_eq!(body["cedente"]["cpf_cnpj"], "52998224725");
  assert_eq!(body["cedente"]["cpf_cnpj_formatado"], "529.982.247-25");
  assert_eq!(body["cedente"]["documentos_completos"], false);
  assert_eq!(body["cedente"]["situacao_validade"], "sem_data");

  let (status, body) =
    call(&app, "POST", "/api/cedentes", Some(json!({ "nome": "Outra", "cpf_cnpj": "52998224725" }))).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["success"], false);
  assert_eq!(body["error"]["type"], "conflict");

  let (status, body) =
    call(&app, "POST", "/api/cedentes", Some(json!({ "nome": "Fulano", "cpf_cnpj": "52998224724" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"]["type"], "validation_error");

  let (status, _) = call(&app,
                         "PUT",
                         &format!("/api/cedentes/{}", id),
                         Some(json!({ "nome": "Maria Silva Santos", "cpf_cnpj": "52998224725", "validade_contrato": "31/12/2030" }))).await;
  assert_eq!(status, StatusCode::OK);

  let (status, body) = call(&app, "GET", &format!("/api/cedentes/{}", id), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["cedente"]["nome_razao_social"], "Maria Silva Santos");
  assert_eq!(body["cedente"]["status"], "pontos_atencao");
  assert_eq!(body["cedente"]["validade_contrato"], "2030-12-31");

  let (status, _) = call(&app, "DELETE", &format!("/api/cedentes/{}", id), None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, body) = call(&app, "GET", &format!("/api/cedentes/{}", id), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"]["type"], "not_found");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
  let app = app();
  let req = Request::builder().method("POST")
                              .uri("/api/cedentes")
                              .header(header::CONTENT_TYPE, "application/json")
                              .body(Body::from("{nome"))
                              .expect("request");
  let (status, bytes) = send(&app, req).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let body: Value = serde_json::from_slice(&bytes).expect("json");
  assert_eq!(body["error"]["type"], "bad_request");
}

#[tokio::test]
async fn list_filters_by_search_and_status() {
  let app = app();
  for (nome, doc, contrato) in [("Padaria São João", "11222333000181", "assinado_manual"),
                                ("Maria Silva", "52998224725", ""),
                                ("João Pereira", "11144477735", "")]
  {
    let (status, _) =
      call(&app, "POST", "/api/cedentes", Some(json!({ "nome": nome, "cpf_cnpj": doc, "contrato": contrato }))).await;
    assert_eq!(status, StatusCode::CREATED);
  }

  let (_, body) = call(&app, "GET", "/api/cedentes?search=joao", None).await;
  assert_eq!(body["total"], 2);
  assert_eq!(body["cedentes"][0]["nome_razao_social"], "João Pereira");

  let (_, body) = call(&app, "GET", "/api/cedentes?status=sem_assinatura", None).await;
  assert_eq!(body["total"], 2);

  let (_, body) = call(&app, "GET", "/api/cedentes?search=11222333", None).await;
  assert_eq!(body["total"], 1);

  let (status, _) = call(&app, "GET", "/api/cedentes?status=inexistente", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (_, body) = call(&app, "DELETE", "/api/cedentes", None).await;
  assert_eq!(body["removidos"], 3);
}

#[tokio::test]
async fn checklist_endpoints() {
  let app = app();
  let (_, body) =
    call(&app, "POST", "/api/cedentes", Some(json!({ "nome": "Acme Ltda", "cpf_cnpj": "11222333000181" }))).await;
  let id = body["cedente"]["id"].as_i64().expect("id");

  let (_, body) = call(&app, "GET", &format!("/api/cedentes/{}/documentos", id), None).await;
  assert_eq!(body["documentos"]["email"], false);
  assert_eq!(body["total"], 10);

  let all: Value = cedente_domain::DocumentChecklist::ITEMS.iter().map(|k| (k.to_string(), json!(true))).collect();
  let (status, body) = call(&app, "POST", &format!("/api/cedentes/{}/documentos", id), Some(all)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["documentos_completos"], true);

  let (_, body) = call(&app, "GET", &format!("/api/cedentes/{}/status-documentos", id), None).await;
  assert_eq!(body["documentos_completos"], true);

  let (status, _) = call(&app, "POST", "/api/cedentes/999/documentos", Some(json!({ "email": true }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn import_upload_and_errors() {
  let app = app();
  let csv = "Nome;CPF/CNPJ;Contrato;Validade\n\
             Maria Silva;529.982.247-25;CONTRATO ASSINADO MANUALMENTE;31/12/2030\n\
             ;11144477735;;\n\
             Fulano;52998224724;;\n";
  let (status, bytes) = send(&app, multipart("file", "cedentes.csv", csv.as_bytes())).await;
  assert_eq!(status, StatusCode::OK);
  let body: Value = serde_json::from_slice(&bytes).expect("json");
  assert_eq!(body["relatorio"]["created"], 1);
  assert_eq!(body["relatorio"]["skipped"][0]["linha"], 3);
  assert_eq!(body["relatorio"]["errors"][0]["linha"], 4);

  let (status, bytes) = send(&app, multipart("planilha", "cedentes.csv", csv.as_bytes())).await;
  assert_eq!(status, StatusCode::OK);
  let body: Value = serde_json::from_slice(&bytes).expect("json");
  assert_eq!(body["relatorio"]["updated"], 1);

  let (status, _) = send(&app, multipart("file", "foto.png", b"png")).await;
  assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

  let (status, _) = send(&app, multipart("outro", "cedentes.csv", csv.as_bytes())).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let big = vec![b'a'; 2 * 1024 * 1024];
  let (status, _) = send(&app, multipart("file", "grande.csv", &big)).await;
  assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn export_downloads_csv() {
  let app = app();
  call(&app, "POST", "/api/cedentes", Some(json!({ "nome": "Maria Silva", "cpf_cnpj": "52998224725" }))).await;
  call(&app, "POST", "/api/cedentes", Some(json!({ "nome": "Acme Ltda", "cpf_cnpj": "11222333000181" }))).await;

  let req = Request::builder().uri("/api/exportar/excel").body(Body::empty()).expect("request");
  let res = app.clone().oneshot(req).await.expect("response");
  assert_eq!(res.status(), StatusCode::OK);
  assert_eq!(res.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
  let disposition = res.headers()[header::CONTENT_DISPOSITION].to_str().expect("header").to_string();
  assert!(disposition.starts_with("attachment; filename=\"cedentes_completo_"));
  let text = String::from_utf8(to_bytes(res.into_body(), usize::MAX).await.expect("body").to_vec()).expect("utf8");
  assert!(text.starts_with('\u{feff}'));
  assert_eq!(text.lines().count(), 3);

  let req = Request::builder().uri("/api/exportar/excel-filtrado?search=maria&colunas=nome,cpf_cnpj")
                              .body(Body::empty())
                              .expect("request");
  let (status, bytes) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  let text = String::from_utf8(bytes).expect("utf8");
  let lines: Vec<&str> = text.trim_start_matches('\u{feff}').lines().collect();
  assert_eq!(lines, vec!["Nome / Razão Social;CPF / CNPJ", "Maria Silva;529.982.247-25"]);

  let (status, body) = call(&app, "GET", "/api/exportar/excel-filtrado?colunas=telefone", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"]["type"], "validation_error");
}

#[tokio::test]
async fn dashboard_stats_and_page() {
  let app = app();
  let vencido = (chrono::Local::now().date_naive() - chrono::Duration::days(3)).format("%Y-%m-%d").to_string();
  call(&app,
       "POST",
       "/api/cedentes",
       Some(json!({ "nome": "Maria Silva", "cpf_cnpj": "52998224725", "validade_contrato": vencido }))).await;
  call(&app, "POST", "/api/cedentes", Some(json!({ "nome": "Acme Ltda", "cpf_cnpj": "11222333000181" }))).await;

  let (status, body) = call(&app, "GET", "/api/dashboard/estatisticas", None).await;
  assert_eq!(status, StatusCode::OK);
  let stats = &body["estatisticas"];
  assert_eq!(stats["total_cedentes"], 2);
  assert_eq!(stats["contratos_vencidos"], 1);
  assert_eq!(stats["contratos_sem_data"], 1);
  assert_eq!(stats["por_status"].as_array().map(Vec::len), Some(7));

  let (_, body) = call(&app, "GET", "/api/status-contrato", None).await;
  assert_eq!(body["default"], "sem_assinatura");
  assert_eq!(body["status"].as_array().map(Vec::len), Some(7));

  let req = Request::builder().uri("/").body(Body::empty()).expect("request");
  let (status, bytes) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  let html = String::from_utf8(bytes).expect("utf8");
  assert!(html.contains("Cadastro de Cedentes"));
  assert!(html.contains("Maria Silva"));
  assert!(html.contains("Vencido"));
}

#[tokio::test]
async fn notification_checks_and_marking() {
  let app = app();
  let em7 = (chrono::Local::now().date_naive() + chrono::Duration::days(7)).format("%Y-%m-%d").to_string();
  call(&app,
       "POST",
       "/api/cedentes",
       Some(json!({ "nome": "Maria Silva", "cpf_cnpj": "52998224725", "validade_contrato": em7 }))).await;

  let (status, body) = call(&app, "POST", "/api/notificacoes/executar-verificacao-manual", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["resultado"]["vencimento"], 1);
  assert_eq!(body["resultado"]["documentos_pendentes"], 1);

  let (_, body) = call(&app, "POST", "/api/notificacoes/executar-verificacao-manual", None).await;
  assert_eq!(body["resultado"]["vencimento"], 0);

  let (_, body) = call(&app, "GET", "/api/notificacoes", None).await;
  assert_eq!(body["total"], 2);
  let id = body["notificacoes"][0]["id"].as_i64().expect("id");
  assert_eq!(body["notificacoes"][0]["cedente_nome"], "Maria Silva");

  let (status, _) = call(&app, "POST", &format!("/api/notificacoes/{}/marcar-lida", id), None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = call(&app, "POST", &format!("/api/notificacoes/{}/marcar-lida", id), None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = call(&app, "POST", "/api/notificacoes/9999/marcar-lida", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (_, body) = call(&app, "POST", "/api/notificacoes/marcar-todas-lidas", None).await;
  assert_eq!(body["marcadas"], 1);
  let (_, body) = call(&app, "GET", "/api/notificacoes", None).await;
  assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn backup_requires_sqlite_file() {
  let app = app();
  let (status, body) = call(&app, "POST", "/api/backup/criar", Some(json!({ "motivo": "manual" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["success"], false);
}
