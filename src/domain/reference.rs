use unicode_segmentation::UnicodeSegmentation;

/// Shared constraint for the three correlation keys (`TicketNumber`,
/// `OrderNumber`, `PurchaseOrderNumber`): non-empty, no surrounding
/// whitespace, bounded length, no characters that would break a ticketing
/// backend URL path segment.
fn parse_reference(kind: &str, value: String) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{kind} cannot be empty"));
    }
    if trimmed.graphemes(true).count() > 64 {
        return Err(format!("{kind} cannot be longer than 64 characters"));
    }
    let bad_chars: [char; 7] = ['/', '(', ')', '"', '<', '>', '\\'];
    if trimmed.chars().any(|c| bad_chars.contains(&c)) {
        return Err(format!("{kind} contains a forbidden character: {trimmed:?}"));
    }
    Ok(trimmed.to_string())
}

macro_rules! reference_newtype {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn parse(value: String) -> Result<Self, String> {
                parse_reference($kind, value).map(Self)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str { &self.0 }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;
            fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(value) }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self { value.0 }
        }
    };
}

reference_newtype!(TicketNumber, "ticket number");
reference_newtype!(OrderNumber, "order number");
reference_newtype!(PurchaseOrderNumber, "purchase order number");

#[cfg(test)]
mod tests {
    use claims::assert_err;
    use claims::assert_ok;

    use super::OrderNumber;
    use super::TicketNumber;

    #[test]
    fn rejects_empty() {
        assert_err!(TicketNumber::parse("".to_string()));
        assert_err!(TicketNumber::parse("   ".to_string()));
    }

    #[test]
    fn rejects_forbidden_characters() {
        assert_err!(OrderNumber::parse("123/456".to_string()));
    }

    #[test]
    fn trims_whitespace() {
        let n = assert_ok!(OrderNumber::parse(" 123-4567890-1234567 \n".to_string()));
        assert_eq!(n.as_ref(), "123-4567890-1234567");
    }

    #[test]
    fn rejects_overlong() {
        assert_err!(TicketNumber::parse("x".repeat(65)));
    }
}
