//! Client for the GameAnalytics user API: log in, browse the account's studios
//! and games, and store the selected game's keys in the project settings.

pub mod errors;
pub mod links;
pub mod settings;
pub mod structs;
pub mod v1;

pub use errors::LinkError;
pub use settings::{ConfigStore, Platform, TomlConfigStore};
pub use structs::client::{ApiClient, ClientOptions};
pub use structs::organization::{OrganizationTree, Selection};
pub use structs::session::{Session, SessionEvent};
pub use structs::{Credential, Game, SessionToken, Studio};
