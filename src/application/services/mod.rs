pub mod mailer;
pub mod registration;
