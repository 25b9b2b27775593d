/// Shared response cache with coalescing, invalidation, and retry.
pub mod cache;
/// Catalog query binding and pagination view-state.
pub mod queries;
/// Session state and the guard protecting authenticated screens.
pub mod session;
/// Time-boxed toast notifications.
pub mod toasts;
/// Sequential upload pipeline.
pub mod upload;

pub use cache::{CacheReader, CacheStatus, Fetch, RemoteCache};
pub use queries::{PageCache, PageControls, page_cache};
pub use session::{Gate, SessionGuard, SessionKey, SessionReader};
pub use toasts::ToastQueue;
pub use upload::{RunOutcome, UploadPipeline};
