//! Scout aggregate
//!
//! 1. Contacts are owned values with no identity of their own
//! 2. Contact order is significant and must round-trip exactly
//! 3. Contacts are replaced wholesale on update, never patched
//! 4. Group membership is an association; deleting a group never deletes the scout

pub mod contact;
pub mod entity;

pub use contact::Contact;
pub use entity::Scout;
