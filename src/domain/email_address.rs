use validator::ValidateEmail;

/// A validated email address. Used for customer, supplier, and internal-agent
/// addresses alike — the same wire value can play any of those roles
/// depending on where a `TicketState`/`ContextBuilder` places it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(email: String) -> Result<Self, String> {
        ValidateEmail::validate_email(&email)
            .then_some(Self(email.clone()))
            .ok_or(format!("invalid email address: {email:?}"))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str { &self.0 }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<String> for EmailAddress {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(value) }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self { value.0 }
}

#[cfg(test)]
mod tests {
    use claims::assert_err;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;
    use quickcheck::Arbitrary;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::EmailAddress;

    #[derive(Clone, Debug)]
    struct TestEmail(pub String);

    impl Arbitrary for TestEmail {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            let mut rng = StdRng::seed_from_u64(u64::arbitrary(g));
            Self(SafeEmail().fake_with_rng(&mut rng))
        }
    }

    #[quickcheck_macros::quickcheck]
    fn fake_emails_are_accepted(email: TestEmail) -> bool {
        EmailAddress::parse(email.0).is_ok()
    }

    #[test]
    fn empty_is_rejected() { assert_err!(EmailAddress::parse("".to_string())); }

    #[test]
    fn missing_at_is_rejected() { assert_err!(EmailAddress::parse("ursulafoo.com".to_string())); }

    #[test]
    fn missing_subject_is_rejected() { assert_err!(EmailAddress::parse("@foo.com".to_string())); }
}
