use std::collections::HashMap;
use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;

use crate::configuration::DatabaseSettings;
use crate::configuration::Settings;
use crate::domain::Locale;
use crate::domain::Phase;
use crate::llm_client::HttpLLMClient;
use crate::llm_client::LLMClient;
use crate::mail_source::HttpMailSource;
use crate::mail_source::MailSource;
use crate::message_formatter::MessageFormatter;
use crate::pipeline::Pipeline;
use crate::routes;
use crate::store::Store;
use crate::ticket_client::HttpTicketClient;
use crate::ticket_client::TicketClient;

/// Everything a request handler or background worker needs, built once at
/// boot from `Settings` (§6 configuration keys). Shared via `web::Data`,
/// which wraps it in an `Arc` — nothing here is ever mutated in place.
pub struct AppState {
    pub store: Store,
    pub ticket_client: Box<dyn TicketClient>,
    pub llm_client: Box<dyn LLMClient>,
    pub mail_source: Box<dyn MailSource>,
    pub formatter: MessageFormatter,
    pub internal_agents: Vec<String>,
    pub language_overrides: HashMap<String, Locale>,
    pub phase: Phase,
    pub confidence_threshold: f64,
    pub supplier_reminder_hours: i64,
    pub max_ingest_retries: u32,
    pub max_send_retries: u32,
    pub poll_interval_seconds: u64,
}

impl AppState {
    pub fn from_settings(cfg: &Settings, pool: PgPool) -> Self {
        let ticket_client = HttpTicketClient::new(
            cfg.ticketing.base_url.clone(),
            cfg.ticketing.client_id.clone(),
            cfg.ticketing.client_secret.clone(),
            cfg.ticketing.timeout_ms,
        );
        let llm_client = HttpLLMClient::new(
            cfg.llm.base_url.clone(),
            cfg.llm.api_key.clone(),
            cfg.llm.model.clone(),
            cfg.llm.temperature,
            cfg.llm.max_tokens,
            cfg.llm.timeout_ms,
        );
        let mail_source = HttpMailSource::new(
            cfg.mail_source.base_url.clone(),
            cfg.mail_source.api_key.clone(),
            cfg.mail_source.timeout_ms,
        );
        let formatter =
            MessageFormatter::new(cfg.pipeline.signature_lines.clone(), cfg.pipeline.ai_disclaimer.clone());

        Self {
            store: Store::new(pool),
            ticket_client: Box::new(ticket_client),
            llm_client: Box::new(llm_client),
            mail_source: Box::new(mail_source),
            formatter,
            internal_agents: cfg.pipeline.internal_agents.clone(),
            language_overrides: cfg.pipeline.language_overrides.clone(),
            phase: cfg.pipeline.phase,
            confidence_threshold: cfg.pipeline.confidence_threshold,
            supplier_reminder_hours: cfg.pipeline.supplier_reminder_hours,
            max_ingest_retries: cfg.pipeline.max_ingest_retries,
            max_send_retries: cfg.pipeline.max_send_retries,
            poll_interval_seconds: cfg.pipeline.poll_interval_seconds,
        }
    }

    /// Borrow every collaborator a `Pipeline` run needs. Built fresh per
    /// call since `Pipeline` only ever borrows — it holds no state itself.
    pub fn pipeline(&self) -> Pipeline<'_> {
        Pipeline {
            store: &self.store,
            ticket_client: self.ticket_client.as_ref(),
            llm_client: self.llm_client.as_ref(),
            formatter: &self.formatter,
            internal_agents: &self.internal_agents,
            language_overrides: &self.language_overrides,
            phase: self.phase,
            confidence_threshold: self.confidence_threshold,
            supplier_reminder_hours: self.supplier_reminder_hours,
            max_ingest_retries: self.max_ingest_retries,
        }
    }
}

/// Wrapper for actix's `Server` with access to the bound port.
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;
        let port = listener.local_addr()?.port();

        let pool = get_connection_pool(&cfg.database);
        let app_state = web::Data::new(AppState::from_settings(&cfg, pool));
        let server = run(listener, app_state)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

pub fn get_connection_pool(db_cfg: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .connect_lazy(db_cfg.connection_string().expose_secret())
        .expect("invalid database connection string")
}

/// Declares the operator HTTP surface (§6: approval queue only). No
/// sessions, cookies, or HTML — every route returns JSON.
pub fn run(listener: TcpListener, app_state: web::Data<AppState>) -> Result<Server, anyhow::Error> {
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(routes::health_check))
            .route("/messages/pending", web::get().to(routes::list_pending_messages))
            .route("/messages/pending/{id}", web::get().to(routes::get_pending_message))
            .route("/messages/pending/{id}/approve", web::post().to(routes::approve_pending_message))
            .route("/messages/pending/{id}/reject", web::post().to(routes::reject_pending_message))
            .route("/messages/pending/{id}/retry", web::post().to(routes::retry_pending_message))
            .route("/tickets/{ticket_number}/analyze", web::post().to(routes::analyze_ticket))
            .route("/ai-decisions/{id}/feedback", web::post().to(routes::submit_feedback))
            .app_data(app_state.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
