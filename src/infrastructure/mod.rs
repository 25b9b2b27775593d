/// REST adapter for the catalog service.
pub mod catalog;
/// Configuration loading and persistence.
pub mod config;
/// Desktop notifications.
pub mod notifications;
/// External image viewing.
pub mod viewer;

pub use catalog::CatalogHttpClient;
pub use config::{AppConfig, CliArgs, StorageManager, ViewState};
pub use notifications::DesktopNotifier;
pub use viewer::ImageViewer;
