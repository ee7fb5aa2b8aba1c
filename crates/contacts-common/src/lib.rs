pub mod contact;
pub mod error;

pub use contact::{Contact, ContactChanges, NewContact};
pub use error::{Error, Result};
