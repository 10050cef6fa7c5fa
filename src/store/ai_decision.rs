use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::OperatorFeedback;
use crate::domain::Phase;

/// An append-only (I5) record of one LLM analysis pass. `operator_feedback`
/// and `feedback_notes` are the only columns ever updated after insert.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AiDecision {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub at: DateTime<Utc>,
    pub detected_language: Option<String>,
    pub detected_intent: String,
    pub confidence: f64,
    pub recommended_action: String,
    pub generated_customer_draft: Option<String>,
    pub generated_supplier_draft: Option<String>,
    pub requires_escalation: bool,
    pub phase_at_decision: String,
    pub operator_feedback: Option<String>,
    pub feedback_notes: Option<String>,
}

pub struct NewAiDecision {
    pub ticket_id: Uuid,
    pub at: DateTime<Utc>,
    pub detected_language: Option<String>,
    pub detected_intent: String,
    pub confidence: f64,
    pub recommended_action: String,
    pub generated_customer_draft: Option<String>,
    pub generated_supplier_draft: Option<String>,
    pub requires_escalation: bool,
    pub phase_at_decision: Phase,
}

const COLUMNS: &str = "id, ticket_id, at, detected_language, detected_intent, confidence, \
                        recommended_action, generated_customer_draft, generated_supplier_draft, \
                        requires_escalation, phase_at_decision, operator_feedback, feedback_notes";

pub async fn insert<'e, E>(executor: E, new: NewAiDecision) -> Result<AiDecision, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!(
        "INSERT INTO ai_decisions
            (ticket_id, at, detected_language, detected_intent, confidence, recommended_action,
             generated_customer_draft, generated_supplier_draft, requires_escalation,
             phase_at_decision)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING {COLUMNS}"
    );
    sqlx::query_as(&query)
        .bind(new.ticket_id)
        .bind(new.at)
        .bind(new.detected_language)
        .bind(new.detected_intent)
        .bind(new.confidence)
        .bind(new.recommended_action)
        .bind(new.generated_customer_draft)
        .bind(new.generated_supplier_draft)
        .bind(new.requires_escalation)
        .bind(new.phase_at_decision.to_string())
        .fetch_one(executor)
        .await
}

pub async fn get_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<AiDecision>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!("SELECT {COLUMNS} FROM ai_decisions WHERE id = $1");
    sqlx::query_as(&query).bind(id).fetch_optional(executor).await
}

pub async fn list_for_ticket<'e, E>(
    executor: E,
    ticket_id: Uuid,
) -> Result<Vec<AiDecision>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let query = format!("SELECT {COLUMNS} FROM ai_decisions WHERE ticket_id = $1 ORDER BY at ASC");
    sqlx::query_as(&query).bind(ticket_id).fetch_all(executor).await
}

/// Attach operator feedback to a previously recorded decision. This is the
/// one mutation ever applied to an `ai_decisions` row.
pub async fn record_feedback<'e, E>(
    executor: E,
    id: Uuid,
    feedback: OperatorFeedback,
    notes: Option<&str>,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query("UPDATE ai_decisions SET operator_feedback = $1, feedback_notes = $2 WHERE id = $3")
        .bind(feedback.as_str())
        .bind(notes)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
