pub mod editor;
pub mod setup;
pub mod terminal;

pub use self::editor::LineEditor;
pub use self::terminal::{Flow, Shell};
