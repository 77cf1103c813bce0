// storefront/tests/common/pg.rs

//! Postgres fixture: one container per test binary, a fresh migrated
//! database per test. Tests using it are `#[ignore]`d because they need Docker;
//! run them with `cargo test -- --ignored`.

use super::test_config;
use sqlx::{Connection, PgConnection, PgPool};
use std::sync::Arc;
use storefront::config::StoreBackend;
use storefront::services::auth_service::StaticCredentialStore;
use storefront::services::notifier::MemoryNotifier;
use storefront::services::object_store::MemoryObjectStore;
use storefront::services::queue::MemoryQueue;
use storefront::state::{AppState, Backends};
use storefront::stores::{PgCartStore, PgCatalogStore};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::OnceCell;
use uuid::Uuid;

const PG_USER: &str = "storefront";
const PG_PASSWORD: &str = "storefront_test";

/// The running container and the URL of its server, resolved once so later
/// tests only talk to Postgres.
struct PgServer {
  _container: ContainerAsync<PostgresImage>,
  url: String,
}

static PG_SERVER: OnceCell<PgServer> = OnceCell::const_new();

async fn init_pg_server() -> PgServer {
  let container = PostgresImage::default()
    .with_user(PG_USER)
    .with_password(PG_PASSWORD)
    .with_db_name("storefront")
    .with_tag("16-alpine")
    .start()
    .await
    .expect("Failed to start PostgreSQL container");
  let host = container.get_host().await.expect("Failed to get container host");
  let port = container
    .get_host_port_ipv4(5432)
    .await
    .expect("Failed to get container port");

  PgServer {
    url: format!("postgres://{}:{}@{}:{}", PG_USER, PG_PASSWORD, host, port),
    _container: container,
  }
}

/// An isolated, migrated database inside the shared container.
pub struct TestDb {
  pub pool: PgPool,
  pub name: String,
}

impl TestDb {
  pub async fn new() -> Self {
    let server_url = &PG_SERVER.get_or_init(init_pg_server).await.url;

    let name = format!("storefront_test_{}", Uuid::new_v4().simple());
    let mut admin = PgConnection::connect(&format!("{}/storefront", server_url))
      .await
      .expect("Failed to connect to the admin database");
    sqlx::query(&format!("CREATE DATABASE \"{}\"", name))
      .execute(&mut admin)
      .await
      .expect("Failed to create test database");
    admin.close().await.expect("Failed to close admin connection");

    let pool = PgPool::connect(&format!("{}/{}", server_url, name))
      .await
      .expect("Failed to connect to test database");
    storefront::db::run_migrations(&pool)
      .await
      .expect("Failed to run migrations on test database");

    Self { pool, name }
  }

  /// An `AppState` whose cart and catalog stores use this database; the
  /// queue, object store and notifier stay in memory.
  pub fn app_state(&self) -> AppState {
    let mut config = test_config();
    config.store_backend = StoreBackend::Postgres;
    let credentials = StaticCredentialStore::from_config(&config.cart_credentials).unwrap();

    let backends = Backends {
      carts: Arc::new(PgCartStore::new(self.pool.clone())),
      catalog: Arc::new(PgCatalogStore::new(self.pool.clone())),
      objects: Arc::new(MemoryObjectStore::new()),
      queue: Arc::new(MemoryQueue::new(config.queue.max_receives)),
      notifier: Arc::new(MemoryNotifier::new()),
      credentials: Arc::new(credentials),
    };
    AppState::new(config, backends)
  }
}
