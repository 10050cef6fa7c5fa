use std::fmt::Debug;
use std::fmt::Display;

use tokio::task::JoinError;
use triage_pilot::configuration::get_configuration;
use triage_pilot::idempotency::init_expiry_worker;
use triage_pilot::mail_worker::init_mail_worker;
use triage_pilot::retry_worker::init_retry_worker;
use triage_pilot::startup::Application;
use triage_pilot::supplier_worker::init_supplier_worker;
use triage_pilot::telemetry::get_subscriber;
use triage_pilot::telemetry::init_subscriber;

fn report_exit(name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{name} exited gracefully")
        }
        Ok(Err(e)) => {
            tracing::error!(error.cause_chain = ?e, error.message = %e, "{name} failed (inner)")
        }
        Err(e) => {
            tracing::error!(error.cause_chain = ?e, error.message = %e, "{name} failed (outer)")
        }
    }
}

/// Initialise telemetry, load config, and start the API alongside the
/// MailSource poll, RetryScheduler sweep, SupplierTracker sweep, and
/// idempotency-expiry background workers (§5).
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("triage-pilot", "info", std::io::stdout);
    init_subscriber(subscriber);

    let cfg = get_configuration().unwrap();

    let server = Application::build(cfg.clone()).await?.run_until_stopped();
    let mail_worker = init_mail_worker(cfg.clone());
    let retry_worker = init_retry_worker(cfg.clone());
    let supplier_worker = init_supplier_worker(cfg.clone());
    let expiry_worker = init_expiry_worker(cfg);

    // Each branch runs on its own spawned task so a stall in one (e.g. a
    // slow MailSource poll) cannot starve the others.
    let server_thread = tokio::spawn(server);
    let mail_worker_thread = tokio::spawn(mail_worker);
    let retry_worker_thread = tokio::spawn(retry_worker);
    let supplier_worker_thread = tokio::spawn(supplier_worker);
    let expiry_worker_thread = tokio::spawn(expiry_worker);

    tokio::select! {
        o = server_thread => { report_exit("API", o) },
        o = mail_worker_thread => { report_exit("Mail source poll worker", o) },
        o = retry_worker_thread => { report_exit("Retry sweep worker", o) },
        o = supplier_worker_thread => { report_exit("Supplier reminder sweep worker", o) },
        o = expiry_worker_thread => { report_exit("Idempotency expiry worker", o) },
    }

    Ok(())
}
