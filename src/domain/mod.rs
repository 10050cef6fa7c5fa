mod confidence;
mod email_address;
mod locale;
mod phase;
mod reference;
mod status;

pub use confidence::Confidence;
pub use email_address::EmailAddress;
pub use locale::Locale;
pub use phase::Phase;
pub use reference::OrderNumber;
pub use reference::PurchaseOrderNumber;
pub use reference::TicketNumber;
pub use status::MessageKind;
pub use status::OperatorFeedback;
pub use status::PendingStatus;
pub use status::TicketStatus;
