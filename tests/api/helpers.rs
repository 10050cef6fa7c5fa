use once_cell::sync::Lazy;
use secrecy::ExposeSecret;
use sqlx::Connection;
use sqlx::Executor;
use sqlx::PgConnection;
use sqlx::PgPool;
use triage_pilot::configuration::get_configuration;
use triage_pilot::configuration::DatabaseSettings;
use triage_pilot::configuration::Settings;
use triage_pilot::startup::get_connection_pool;
use triage_pilot::startup::Application;
use triage_pilot::telemetry::get_subscriber;
use triage_pilot::telemetry::init_subscriber;
use uuid::Uuid;
use wiremock::MockServer;

/// Init a static subscriber once per test binary (§telemetry). Opt in to
/// verbose output with `TEST_LOG=true`.
static TRACING: Lazy<()> = Lazy::new(|| {
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::stdout);
            init_subscriber(subscriber);
        }
        Err(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::sink);
            init_subscriber(subscriber);
        }
    };
});

/// A running instance of the app plus mock servers standing in for the
/// three external collaborators out of scope for this crate (§1 Non-goals):
/// the mail transport, the ticketing backend, and the LLM provider.
pub struct TestApp {
    pub addr: String,
    pub pool: PgPool,
    pub mail_source_server: MockServer,
    pub ticketing_server: MockServer,
    pub llm_server: MockServer,
}

impl TestApp {
    pub fn api(&self, path: &str) -> String { format!("{}{}", self.addr, path) }

    pub async fn post_json(
        &self,
        path: &str,
        idempotency_key: &str,
        body: &serde_json::Value,
    ) -> reqwest::Response {
        reqwest::Client::new()
            .post(self.api(path))
            .header("Idempotency-Key", idempotency_key)
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        reqwest::Client::new().get(self.api(path)).send().await.expect("execute request")
    }
}

async fn configure_database(cfg: &DatabaseSettings) -> PgPool {
    let mut conn = PgConnection::connect(cfg.connection_string_without_db().expose_secret())
        .await
        .expect("postgres must be running");

    conn.execute(format!(r#"CREATE DATABASE "{}";"#, cfg.database_name).as_str())
        .await
        .unwrap();

    let pool = PgPool::connect(cfg.connection_string().expose_secret()).await.unwrap();
    sqlx::migrate!().run(&pool).await.expect("failed to migrate");
    pool
}

/// Spawn a `TestApp` with a randomised database and every external
/// collaborator backed by a `wiremock::MockServer`, so tests can script
/// exactly what the mail source, ticketing backend, and LLM provider return.
pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let mail_source_server = MockServer::start().await;
    let ticketing_server = MockServer::start().await;
    let llm_server = MockServer::start().await;

    let cfg: Settings = {
        let mut cfg = get_configuration().expect("read configuration.yaml");
        cfg.database.database_name = Uuid::new_v4().to_string();
        cfg.application.port = 0;
        cfg.mail_source.base_url = mail_source_server.uri();
        cfg.ticketing.base_url = ticketing_server.uri();
        cfg.llm.base_url = llm_server.uri();
        cfg
    };

    configure_database(&cfg.database).await;

    let application = Application::build(cfg.clone()).await.expect("build application");
    let addr = format!("http://127.0.0.1:{}", application.get_port());
    tokio::spawn(application.run_until_stopped());

    let pool = get_connection_pool(&cfg.database);

    TestApp { addr, pool, mail_source_server, ticketing_server, llm_server }
}
