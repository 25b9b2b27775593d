/// Catalog, upload, and user entities.
pub mod entities;
/// Error taxonomy.
pub mod errors;
/// Port definitions for external collaborators.
pub mod ports;
/// View state and cache-key derivation.
pub mod query;
/// Toast notification model.
pub mod toast;

pub use toast::{TOAST_LIFETIME, Toast, ToastId, ToastSeverity};
