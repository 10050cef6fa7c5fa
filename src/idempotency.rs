pub mod expiry;
mod key;
pub mod persistence;

pub use key::IdempotencyKey;
pub use persistence::get_saved_response;
pub use persistence::save_response;
pub use persistence::try_save_response;
pub use persistence::NextAction;
