pub mod email;
pub mod registration;
pub mod repositories;
