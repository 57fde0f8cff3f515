pub mod account;
pub mod basket;
pub mod profile;
pub mod view_event;
pub mod workspace;

pub use account::Account;
pub use basket::BasketEntry;
pub use profile::Profile;
pub use view_event::{RECENT_VIEWS_LIMIT, ViewEvent};
pub use workspace::Workspace;
