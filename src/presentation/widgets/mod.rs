mod input;
mod status_bar;
mod tag_row;
mod toast_popup;

pub use input::{InputAction, TextInput};
pub use status_bar::{StatusBar, StatusLevel};
pub use tag_row::TagRow;
pub use toast_popup::ToastStack;
