mod image;
mod upload;
mod user;

pub use image::{DeleteReceipt, ImageHit, ImageId, ImageMeta, ImagePage, ImagePatch, UploadReceipt};
pub use upload::{SpoolFile, UploadItem, UploadItemId, UploadItemView, UploadStatus};
pub use user::{UserProfile, UserRole};
