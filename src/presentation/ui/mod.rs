//! Screens and the application loop.

mod app;
mod gallery_screen;
mod login_screen;
mod splash_screen;
mod upload_screen;

pub use app::App;
pub use gallery_screen::{GalleryOutcome, GalleryScreen};
pub use login_screen::LoginScreen;
pub use splash_screen::SplashScreen;
pub use upload_screen::{UploadOutcome, UploadScreen};
