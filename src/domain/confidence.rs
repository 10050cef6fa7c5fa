/// An LLM analysis confidence, constrained to `[0, 1]`. Kept as a distinct
/// type (rather than a bare `f64`) so that `Dispatcher`'s threshold
/// comparison can't accidentally be fed an unvalidated score straight off the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    pub fn parse(value: f64) -> Result<Self, String> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(format!("confidence must be in [0, 1], got {value}"));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 { self.0 }

    pub fn meets(self, threshold: Confidence) -> bool { self.0 >= threshold.0 }
}

impl TryFrom<f64> for Confidence {
    type Error = String;
    fn try_from(value: f64) -> Result<Self, Self::Error> { Self::parse(value) }
}

impl From<Confidence> for f64 {
    fn from(value: Confidence) -> Self { value.0 }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use claims::assert_err;
    use claims::assert_ok;

    use super::Confidence;

    #[test]
    fn accepts_bounds() {
        assert_ok!(Confidence::parse(0.0));
        assert_ok!(Confidence::parse(1.0));
    }

    #[test]
    fn rejects_out_of_range() {
        assert_err!(Confidence::parse(-0.01));
        assert_err!(Confidence::parse(1.01));
        assert_err!(Confidence::parse(f64::NAN));
    }

    #[test]
    fn meets_is_inclusive() {
        let threshold = Confidence::parse(0.8).unwrap();
        assert!(Confidence::parse(0.8).unwrap().meets(threshold));
        assert!(!Confidence::parse(0.79).unwrap().meets(threshold));
    }
}
