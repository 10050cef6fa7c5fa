use once_cell::sync::Lazy;
use regex::Regex;

static LOCALE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2,3}(-[A-Z]{2})?$").expect("static locale pattern is valid"));

/// A BCP-47-ish language tag (`de`, `en`, `pt-BR`, ...). `LangDetect` and
/// `language_overrides` both produce these; `MessageFormatter` and
/// `ContextBuilder` consume them to pick a signature/disclaimer/date format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    pub fn parse(value: String) -> Result<Self, String> {
        if !LOCALE_PATTERN.is_match(&value) {
            return Err(format!("invalid locale tag: {value:?}"));
        }
        Ok(Self(value))
    }

    /// The 2-3 letter language subtag, ignoring region (`pt-BR` -> `pt`).
    pub fn language(&self) -> &str { self.0.split('-').next().unwrap_or(&self.0) }
}

impl Default for Locale {
    fn default() -> Self { Self("en".to_string()) }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str { &self.0 }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<String> for Locale {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(value) }
}

impl From<Locale> for String {
    fn from(value: Locale) -> Self { value.0 }
}

#[cfg(test)]
mod tests {
    use claims::assert_err;
    use claims::assert_ok;

    use super::Locale;

    #[test]
    fn accepts_bare_language() { assert_ok!(Locale::parse("de".to_string())); }

    #[test]
    fn accepts_language_and_region() { assert_ok!(Locale::parse("pt-BR".to_string())); }

    #[test]
    fn rejects_garbage() {
        assert_err!(Locale::parse("".to_string()));
        assert_err!(Locale::parse("DE".to_string()));
        assert_err!(Locale::parse("deutsch".to_string()));
    }

    #[test]
    fn language_strips_region() {
        assert_eq!(Locale::parse("pt-BR".to_string()).unwrap().language(), "pt");
    }
}
