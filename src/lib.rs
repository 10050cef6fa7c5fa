pub mod approval_queue;
pub mod configuration;
pub mod context_builder;
pub mod dispatcher;
pub mod domain;
pub mod idempotency;
pub mod lang_detect;
pub mod llm_client;
pub mod mail_source;
pub mod mail_worker;
pub mod message_formatter;
pub mod pipeline;
pub mod retry_scheduler;
pub mod retry_worker;
pub mod routes;
pub mod startup;
pub mod store;
pub mod supplier_tracker;
pub mod supplier_worker;
pub mod telemetry;
pub mod ticket_client;
pub mod utils;
