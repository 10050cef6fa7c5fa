use whatlang::detect;
use whatlang::Lang;

use crate::domain::Locale;

/// Best-effort language detection over an inbound message body, used by the
/// Pipeline to seed `ContextBuilder`'s locale choice before the LLM's own
/// `detected_language` is available (§4.6 step 5). Falls back to the
/// configured default locale when detection is inconclusive.
pub fn detect_locale(text: &str, default: &Locale) -> Locale {
    match detect(text) {
        Some(info) if info.is_reliable() => lang_to_locale(info.lang()).unwrap_or_else(|| default.clone()),
        _ => default.clone(),
    }
}

fn lang_to_locale(lang: Lang) -> Option<Locale> {
    let code = match lang {
        Lang::Eng => "en",
        Lang::Deu => "de",
        Lang::Fra => "fr",
        Lang::Spa => "es",
        Lang::Ita => "it",
        Lang::Nld => "nl",
        Lang::Por => "pt",
        Lang::Pol => "pl",
        _ => return None,
    };
    Locale::parse(code.to_string()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_german() {
        let default = Locale::default();
        let locale = detect_locale(
            "Ich möchte gerne wissen, wann meine Bestellung ankommt und ob es Verzögerungen gibt.",
            &default,
        );
        assert_eq!(locale.language(), "de");
    }

    #[test]
    fn falls_back_on_short_input() {
        let default = Locale::default();
        let locale = detect_locale("hi", &default);
        assert_eq!(locale, default);
    }
}
