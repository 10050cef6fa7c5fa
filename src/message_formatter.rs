use std::collections::HashMap;

use crate::domain::Locale;

/// Deterministic builder for outbound bodies (§4, "MessageFormatter").
/// Never invents facts: every piece it emits (greeting, signature,
/// disclaimer) comes from either the caller-supplied name or from
/// configuration, never from the LLM.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    signature_lines: Vec<String>,
    ai_disclaimer: HashMap<String, String>,
}

/// Built-in greeting templates, keyed by 2-3 letter language subtag. A
/// locale with no entry here falls back to the English template — the
/// formatter never fabricates a greeting in a language it doesn't know.
const GREETING_TEMPLATES: &[(&str, &str)] = &[
    ("en", "Hello {name},"),
    ("de", "Hallo {name},"),
    ("fr", "Bonjour {name},"),
    ("es", "Hola {name},"),
    ("it", "Ciao {name},"),
    ("nl", "Hallo {name},"),
    ("pt", "Olá {name},"),
    ("pl", "Witaj {name},"),
];

impl MessageFormatter {
    pub fn new(signature_lines: Vec<String>, ai_disclaimer: HashMap<String, String>) -> Self {
        Self { signature_lines, ai_disclaimer }
    }

    pub fn greeting(&self, locale: &Locale, name: &str) -> String {
        let template = GREETING_TEMPLATES
            .iter()
            .find(|(lang, _)| *lang == locale.language())
            .map(|(_, t)| *t)
            .unwrap_or("Hello {name},");
        template.replace("{name}", name)
    }

    pub fn signature(&self) -> String {
        self.signature_lines.join("\n")
    }

    /// The disclaimer for `locale`'s language, or `None` if the operator has
    /// not configured one for it — callers must not substitute a different
    /// language's disclaimer silently.
    pub fn disclaimer(&self, locale: &Locale) -> Option<&str> {
        self.ai_disclaimer.get(locale.language()).map(String::as_str)
    }

    /// Assemble a full customer-facing body: greeting, body, signature,
    /// disclaimer, each on its own paragraph.
    pub fn compose_customer_body(
        &self,
        locale: &Locale,
        recipient_name: &str,
        body: &str,
    ) -> String {
        let mut parts = vec![self.greeting(locale, recipient_name), body.trim().to_string()];
        let signature = self.signature();
        if !signature.is_empty() {
            parts.push(signature);
        }
        if let Some(disclaimer) = self.disclaimer(locale) {
            parts.push(disclaimer.to_string());
        }
        parts.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatter() -> MessageFormatter {
        let mut disclaimer = HashMap::new();
        disclaimer.insert("de".to_string(), "Diese Antwort wurde KI-unterstützt erstellt.".to_string());
        disclaimer.insert("en".to_string(), "This reply was AI-assisted.".to_string());
        MessageFormatter::new(
            vec!["Best regards,".to_string(), "Support Team".to_string()],
            disclaimer,
        )
    }

    #[test]
    fn german_greeting_and_disclaimer() {
        let f = formatter();
        let locale = Locale::parse("de".to_string()).unwrap();
        let body = f.compose_customer_body(&locale, "Müller", "Ihr Paket ist unterwegs.");
        assert!(body.starts_with("Hallo Müller,"));
        assert!(body.ends_with("Diese Antwort wurde KI-unterstützt erstellt."));
        assert!(body.contains("Best regards,\nSupport Team"));
    }

    #[test]
    fn unknown_language_falls_back_to_english_template_but_no_disclaimer() {
        let f = formatter();
        let locale = Locale::parse("ja".to_string()).unwrap();
        assert_eq!(f.greeting(&locale, "Tanaka"), "Hello Tanaka,");
        assert!(f.disclaimer(&locale).is_none());
    }
}
