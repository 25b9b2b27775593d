/// Event handling.
pub mod events;
/// Pure layout computation.
pub mod layout;
/// Screens and the application loop.
pub mod ui;
/// Reusable widgets.
pub mod widgets;

pub use ui::App;
