mod api_error;
mod upload_error;

pub use api_error::ApiError;
pub use upload_error::UploadError;
