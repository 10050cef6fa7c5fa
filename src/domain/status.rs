use std::str::FromStr;

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(format!(
                        concat!("invalid ", stringify!($name), ": {:?}"),
                        other
                    )),
                }
            }
        }
    };
}

string_enum!(TicketStatus {
    New => "new",
    AwaitingCustomer => "awaiting-customer",
    AwaitingSupplier => "awaiting-supplier",
    Escalated => "escalated",
    Imported => "imported",
    Closed => "closed",
});

string_enum!(MessageKind {
    Customer => "customer",
    Supplier => "supplier",
    Internal => "internal",
});

string_enum!(PendingStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Sent => "sent",
    Failed => "failed",
});

impl PendingStatus {
    pub fn is_terminal(self) -> bool { matches!(self, Self::Sent | Self::Rejected) }
}

string_enum!(OperatorFeedback {
    Correct => "correct",
    Incorrect => "incorrect",
    Partial => "partial",
});

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::PendingStatus;
    use super::TicketStatus;

    #[test]
    fn round_trips_through_wire_form() {
        for s in [
            TicketStatus::New,
            TicketStatus::AwaitingCustomer,
            TicketStatus::Escalated,
        ] {
            assert_eq!(TicketStatus::from_str(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn rejects_unknown() { assert!(PendingStatus::from_str("bogus").is_err()); }

    #[test]
    fn terminal_states() {
        assert!(PendingStatus::Sent.is_terminal());
        assert!(PendingStatus::Rejected.is_terminal());
        assert!(!PendingStatus::Pending.is_terminal());
        assert!(!PendingStatus::Approved.is_terminal());
        assert!(!PendingStatus::Failed.is_terminal());
    }
}
