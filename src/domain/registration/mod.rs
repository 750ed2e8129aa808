pub mod entity;
pub mod status;

pub use entity::Registration;
pub use status::RegistrationStatus;
