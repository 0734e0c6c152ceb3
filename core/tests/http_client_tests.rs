// tests/http_client_tests.rs
//
// Drives the HTTP catalog and order gateway against a one-shot local server.
mod common;
use cartsync::api::{ApiClient, HttpCatalog, HttpOrderGateway};
use cartsync::error::{ApiError, CatalogError};
use cartsync::orders::{OrderGateway, OrderLine, OrderRequest, OrderStatus};
use cartsync::{ClientConfig, ProductCatalog, ProductId, SessionContext};
use common::*;
use reqwest::StatusCode;
use serial_test::serial;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accepts one connection, answers with `status` and `body`, and yields the raw request text.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  let handle = tokio::spawn(async move {
    let (mut socket, _) = listener.accept().await.unwrap();
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
      let n = socket.read(&mut buf).await.unwrap();
      if n == 0 {
        break;
      }
      raw.extend_from_slice(&buf[..n]);
      let text = String::from_utf8_lossy(&raw).to_string();
      if let Some(head_end) = text.find("\r\n\r\n") {
        let content_length = text[..head_end]
          .lines()
          .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
          })
          .unwrap_or(0);
        if raw.len() >= head_end + 4 + content_length {
          break;
        }
      }
    }
    let response = format!(
      "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
      body.len()
    );
    socket.write_all(response.as_bytes()).await.unwrap();
    socket.shutdown().await.ok();
    String::from_utf8_lossy(&raw).to_string()
  });
  (format!("http://{addr}"), handle)
}

fn client(base_url: &str, session: SessionContext) -> ApiClient {
  ApiClient::new(&ClientConfig::new(base_url), session).unwrap()
}

#[tokio::test]
#[serial]
async fn fetch_product_decodes_lenient_payload() {
  setup_tracing();
  let (base, server) = serve_once(
    "200 OK",
    r#"{"id": 4, "name": "Kettle", "price": "39.50", "is_active": 1, "images": [{"image_url": "/k.jpg", "is_main": true}]}"#,
  )
  .await;
  let catalog = HttpCatalog::new(client(&base, SessionContext::anonymous()));

  let product = catalog.fetch_product(ProductId(4)).await.unwrap();
  assert_eq!(product.name, "Kettle");
  assert_eq!(product.price, Some(39.5));
  assert_eq!(product.main_image_url(), Some("/k.jpg"));

  let request = server.await.unwrap().to_ascii_lowercase();
  assert!(request.starts_with("get /products/4 http/1.1"));
  assert!(request.contains("accept: application/json"));
  assert!(!request.contains("authorization:"));
}

#[tokio::test]
async fn missing_product_is_not_found() {
  let (base, server) = serve_once("404 Not Found", r#"{"message": "No query results"}"#).await;
  let catalog = HttpCatalog::new(client(&base, SessionContext::anonymous()));

  let err = catalog.fetch_product(ProductId(99)).await.unwrap_err();
  assert!(matches!(err, CatalogError::NotFound { product_id: ProductId(99) }));
  server.await.unwrap();
}

#[tokio::test]
async fn server_error_is_a_network_failure() {
  let (base, server) = serve_once("500 Internal Server Error", "oops").await;
  let catalog = HttpCatalog::new(client(&base, SessionContext::anonymous()));

  let err = catalog.fetch_product(ProductId(1)).await.unwrap_err();
  match err {
    CatalogError::Network {
      product_id,
      source: ApiError::Http { status, body },
    } => {
      assert_eq!(product_id, ProductId(1));
      assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
      assert_eq!(body, "oops");
    }
    other => panic!("unexpected error: {other:?}"),
  }
  server.await.unwrap();
}

#[tokio::test]
async fn create_order_posts_items_with_bearer_token() {
  let (base, server) = serve_once(
    "201 Created",
    r#"{"message": "Order created", "order": {"id": 3, "total": "20.00", "status": "pending", "items": []}}"#,
  )
  .await;
  let session = SessionContext::signed_in(session("tok-xyz"));
  let gateway = HttpOrderGateway::new(client(&base, session.clone()));
  let request = OrderRequest {
    items: vec![OrderLine {
      product_id: ProductId(1),
      quantity: 2,
    }],
  };

  let credential = session.credential().unwrap();
  let receipt = gateway.create_order(&credential, &request).await.unwrap();
  assert_eq!(receipt.message.as_deref(), Some("Order created"));
  let order = receipt.order.unwrap();
  assert_eq!(order.total, Some(20.0));
  assert_eq!(order.status, Some(OrderStatus::Pending));

  let raw = server.await.unwrap();
  let lower = raw.to_ascii_lowercase();
  assert!(lower.starts_with("post /orders http/1.1"));
  assert!(lower.contains("authorization: bearer tok-xyz"));
  assert!(raw.ends_with(r#"{"items":[{"product_id":1,"quantity":2}]}"#));
}

#[tokio::test]
async fn unauthorized_response_signs_session_out() {
  let (base, server) = serve_once("401 Unauthorized", r#"{"message": "Unauthenticated."}"#).await;
  let session = SessionContext::signed_in(session("expired"));
  let gateway = HttpOrderGateway::new(client(&base, session.clone()));

  let credential = session.credential().unwrap();
  let err = gateway.my_orders(&credential, 1).await.unwrap_err();
  assert!(matches!(err, ApiError::Unauthorized));
  assert!(!session.is_authenticated());
  server.await.unwrap();
}

#[tokio::test]
async fn my_orders_requests_the_page() {
  let (base, server) = serve_once(
    "200 OK",
    r#"{"current_page": 2, "data": [{"id": 8, "total": 12, "status": "completed", "items": [{"product_id": 1, "quantity": 1, "price": "12.00"}]}], "last_page": 3, "per_page": 10, "total": 21}"#,
  )
  .await;
  let session = SessionContext::signed_in(session("tok"));
  let gateway = HttpOrderGateway::new(client(&base, session.clone()));

  let page = gateway.my_orders(&session.credential().unwrap(), 2).await.unwrap();
  assert_eq!(page.current_page, 2);
  assert_eq!(page.next_page(), Some(3));
  assert_eq!(page.data[0].status, Some(OrderStatus::Completed));
  assert_eq!(page.data[0].items[0].price, Some(12.0));

  let request = server.await.unwrap().to_ascii_lowercase();
  assert!(request.starts_with("get /orders/my?page=2 http/1.1"));
}
