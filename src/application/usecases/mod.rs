pub mod add_to_basket;
pub mod provision_account;
pub mod record_view;
pub mod update_account;
