mod auth_port;
mod catalog_port;
mod notifier_port;

pub use auth_port::{AuthPort, OAuthProvider};
pub use catalog_port::CatalogPort;
pub use notifier_port::NotifierPort;
