use std::collections::HashMap;
use std::collections::HashSet;

use chrono::DateTime;
use chrono::Utc;
use thiserror::Error;

use crate::domain::Locale;
use crate::store::ticket_state::TicketState;

/// Phrases that unconditionally request a human, in the languages the
/// formatter ships disclaimers/greetings for. Checked deterministically
/// before the LLM call runs (§8 scenario 4) rather than left to the model
/// to recognize reliably.
const ESCALATION_PHRASES: &[&str] = &[
    "ich möchte mit einem menschen sprechen",
    "i want to speak to a human",
    "i want to talk to a person",
    "je veux parler à un humain",
    "quiero hablar con una persona",
];

pub fn requests_human_escalation(body: &str) -> bool {
    let lower = body.to_lowercase();
    ESCALATION_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Internal,
    Customer,
    Supplier,
}

/// One historical message attached to a ticket, independent of storage
/// representation — built from `TicketClient::TicketHistoryEntry` and/or
/// locally stored `InboundMessage` rows.
#[derive(Debug, Clone)]
pub struct HistoryMessage {
    pub message_id: String,
    pub from_address: String,
    /// Role as reported by the ticketing backend's own history metadata,
    /// when it has an opinion.
    pub role_hint: Option<Role>,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct IdentityRoster {
    pub roles: HashMap<String, Role>,
}

impl IdentityRoster {
    pub fn role_of(&self, address: &str) -> Option<Role> {
        self.roles.get(address).copied()
    }
}

#[derive(Debug, Clone)]
pub struct RedactedState {
    pub order_refs: Vec<String>,
    pub participants: Vec<(String, Role)>,
    pub resolution: Option<String>,
    pub next_eta: Option<String>,
    pub tracking: Option<String>,
    pub return_required: bool,
    pub disposal_allowed: bool,
    pub last_message_summaries: Vec<String>,
    pub risks_or_gaps: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BuiltContext {
    pub identity_roster: IdentityRoster,
    pub filtered_history: Vec<HistoryMessage>,
    pub redacted_state: RedactedState,
    pub system_prompt: String,
    pub user_prompt: String,
    pub operator_preview: String,
    pub locale: Locale,
    pub requests_human_escalation: bool,
}

#[derive(Debug, Error)]
pub enum ContextBuilderError {
    #[error("policy-block: {0}")]
    PolicyBlock(String),
}

/// Pure (no I/O) assembler of LLM prompts and operator preview from ticket
/// state + history + configuration (§4.5). Deterministic in its output for
/// a fixed `(TicketState, history, ignored_message_ids)` triple (P7).
pub struct ContextBuilder<'a> {
    internal_agents: &'a [String],
    language_overrides: &'a HashMap<String, Locale>,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(
        internal_agents: &'a [String],
        language_overrides: &'a HashMap<String, Locale>,
    ) -> Self {
        Self { internal_agents, language_overrides }
    }

    fn resolve_role(
        &self,
        address: &str,
        history_role_hint: Option<Role>,
        salutation_hint: Option<Role>,
    ) -> Result<Role, ContextBuilderError> {
        if self.internal_agents.iter().any(|a| a.eq_ignore_ascii_case(address)) {
            return Ok(Role::Internal);
        }
        if let Some(role) = history_role_hint {
            return Ok(role);
        }
        if let Some(role) = salutation_hint {
            return Ok(role);
        }
        Err(ContextBuilderError::PolicyBlock(format!(
            "cannot determine role of participant {address}"
        )))
    }

    fn build_roster(
        &self,
        history: &[HistoryMessage],
        ticket: &TicketState,
    ) -> Result<IdentityRoster, ContextBuilderError> {
        let mut roles = HashMap::new();
        if let Some(customer_email) = &ticket.customer_email {
            roles.insert(customer_email.clone(), Role::Customer);
        }
        if let Some(supplier_email) = &ticket.supplier_email {
            roles.insert(supplier_email.clone(), Role::Supplier);
        }
        for message in history {
            if roles.contains_key(&message.from_address) {
                continue;
            }
            let salutation_hint = salutation_role_heuristic(&message.body);
            let role = self.resolve_role(&message.from_address, message.role_hint, salutation_hint)?;
            roles.insert(message.from_address.clone(), role);
        }
        Ok(IdentityRoster { roles })
    }

    fn locale_for(&self, ticket: &TicketState, roster: &IdentityRoster) -> Locale {
        for (address, role) in &roster.roles {
            if *role == Role::Customer {
                if let Some(locale) = self.language_overrides.get(address) {
                    return locale.clone();
                }
            }
        }
        ticket
            .language
            .as_ref()
            .and_then(|l| Locale::parse(l.clone()).ok())
            .unwrap_or_default()
    }

    /// §4.5: identity roster, filtered history, redacted state, final
    /// prompts, and an operator preview. `preview_only` controls nothing
    /// about the prompt content itself (P7) — only whether the caller goes
    /// on to call the LLM.
    pub fn build(
        &self,
        ticket: &TicketState,
        history: &[HistoryMessage],
        ignored_message_ids: &HashSet<String>,
    ) -> Result<BuiltContext, ContextBuilderError> {
        let roster = self.build_roster(history, ticket)?;
        let filtered_history: Vec<HistoryMessage> = history
            .iter()
            .filter(|m| !ignored_message_ids.contains(&m.message_id))
            .cloned()
            .collect();

        let locale = self.locale_for(ticket, &roster);

        let mut order_refs = Vec::new();
        if let Some(order_number) = &ticket.order_number {
            order_refs.push(order_number.clone());
        }
        if let Some(po) = &ticket.purchase_order_number {
            order_refs.push(po.clone());
        }

        let last_message_summaries = filtered_history
            .iter()
            .rev()
            .take(5)
            .map(|m| format!("{}: {}", m.from_address, truncate(&m.body, 160)))
            .collect();

        let requests_human_escalation = filtered_history
            .last()
            .map(|m| requests_human_escalation(&m.body))
            .unwrap_or(false);

        let mut risks_or_gaps = Vec::new();
        if ticket.order_number.is_none() && ticket.purchase_order_number.is_none() {
            risks_or_gaps.push("no order or purchase-order reference on file".to_string());
        }
        if requests_human_escalation {
            risks_or_gaps.push("customer explicitly requested a human".to_string());
        }

        let redacted_state = RedactedState {
            order_refs,
            participants: roster
                .roles
                .iter()
                .filter(|(_, role)| **role != Role::Internal)
                .map(|(addr, role)| (addr.clone(), *role))
                .collect(),
            resolution: None,
            next_eta: None,
            tracking: None,
            return_required: false,
            disposal_allowed: false,
            last_message_summaries,
            risks_or_gaps,
        };

        let system_prompt = build_system_prompt(&locale);
        let user_prompt = build_user_prompt(ticket, &redacted_state, &filtered_history);
        let operator_preview = format!(
            "locale={locale}\nparticipants={:?}\nrisks={:?}\n---\n{user_prompt}",
            redacted_state.participants, redacted_state.risks_or_gaps
        );

        Ok(BuiltContext {
            identity_roster: roster,
            filtered_history,
            redacted_state,
            system_prompt,
            user_prompt,
            operator_preview,
            locale,
            requests_human_escalation,
        })
    }
}

/// Last-resort heuristic per §4.5/§9: scan for a salutation line naming a
/// known role. Never promoted above an exact internal-agent match or
/// backend-reported role metadata.
fn salutation_role_heuristic(body: &str) -> Option<Role> {
    let lower = body.to_lowercase();
    if lower.contains("dear supplier") || lower.contains("hallo lieferant") {
        Some(Role::Supplier)
    } else if lower.contains("dear customer") || lower.contains("hallo kunde") {
        Some(Role::Customer)
    } else {
        None
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    let truncated: String = s.chars().take(max_chars).collect();
    if truncated.len() < s.len() {
        format!("{truncated}…")
    } else {
        truncated
    }
}

fn build_system_prompt(locale: &Locale) -> String {
    format!(
        "You are a customer support triage assistant. Respond only in valid JSON matching the \
         documented schema. Reply in locale '{locale}' when drafting customer-facing text. Never \
         reveal supplier identity to the customer. Never invent order status, tracking numbers, \
         or ETAs not present in the provided state."
    )
}

fn build_user_prompt(
    ticket: &TicketState,
    state: &RedactedState,
    history: &[HistoryMessage],
) -> String {
    let history_block = history
        .iter()
        .map(|m| format!("[{}] {}: {}", m.sent_at.to_rfc3339(), m.from_address, m.body))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Ticket {ticket_number} (status={status})\nOrder refs: {order_refs:?}\nRisks/gaps: {risks:?}\n\nHistory:\n{history_block}",
        ticket_number = ticket.ticket_number,
        status = ticket.status,
        order_refs = state.order_refs,
        risks = state.risks_or_gaps,
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::collections::HashSet;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn ticket() -> TicketState {
        TicketState {
            id: Uuid::new_v4(),
            ticket_number: "T-1".to_string(),
            ticket_id: "upstream-1".to_string(),
            status: "new".to_string(),
            custom_status_id: None,
            customer_email: Some("kunde@example.com".to_string()),
            language: Some("de".to_string()),
            order_number: Some("123-4567890-1234567".to_string()),
            purchase_order_number: None,
            supplier_email: Some("orders@supplier.example".to_string()),
            supplier_ticket_references: vec![],
            escalated: false,
            escalation_reason: None,
            escalation_at: None,
            last_seen_at: Utc::now(),
            gmail_thread_id: None,
        }
    }

    #[test]
    fn detects_escalation_phrase() {
        assert!(requests_human_escalation(
            "Ich möchte mit einem Menschen sprechen, bitte."
        ));
        assert!(!requests_human_escalation("Wo ist meine Bestellung?"));
    }

    #[test]
    fn builds_context_without_ambiguity() {
        let internal_agents = vec!["agent@ourcompany.example".to_string()];
        let overrides = HashMap::new();
        let builder = ContextBuilder::new(&internal_agents, &overrides);
        let ticket = ticket();
        let history = vec![HistoryMessage {
            message_id: "m1".to_string(),
            from_address: "kunde@example.com".to_string(),
            role_hint: None,
            body: "Wo ist meine Bestellung 123-4567890-1234567?".to_string(),
            sent_at: Utc::now(),
        }];
        let ctx = builder.build(&ticket, &history, &HashSet::new()).unwrap();
        assert_eq!(ctx.identity_roster.role_of("kunde@example.com"), Some(Role::Customer));
        assert_eq!(ctx.locale.language(), "de");
        assert!(!ctx.requests_human_escalation);
    }

    #[test]
    fn ambiguous_participant_is_a_policy_block() {
        let internal_agents = vec![];
        let overrides = HashMap::new();
        let builder = ContextBuilder::new(&internal_agents, &overrides);
        let mut ticket = ticket();
        ticket.customer_email = None;
        ticket.supplier_email = None;
        let history = vec![HistoryMessage {
            message_id: "m1".to_string(),
            from_address: "someone@unknown.example".to_string(),
            role_hint: None,
            body: "hi".to_string(),
            sent_at: Utc::now(),
        }];
        let result = builder.build(&ticket, &history, &HashSet::new());
        assert!(matches!(result, Err(ContextBuilderError::PolicyBlock(_))));
    }

    #[test]
    fn ignored_message_ids_are_filtered_out() {
        let internal_agents = vec![];
        let overrides = HashMap::new();
        let builder = ContextBuilder::new(&internal_agents, &overrides);
        let ticket = ticket();
        let history = vec![HistoryMessage {
            message_id: "m1".to_string(),
            from_address: "kunde@example.com".to_string(),
            role_hint: None,
            body: "hi".to_string(),
            sent_at: Utc::now(),
        }];
        let mut ignored = HashSet::new();
        ignored.insert("m1".to_string());
        let ctx = builder.build(&ticket, &history, &ignored).unwrap();
        assert!(ctx.filtered_history.is_empty());
    }
}
