pub mod ai;
pub mod command;
pub mod config;
pub mod extract;

pub use self::ai::AiTranslator;
pub use self::command::ShellCommandExecutor;
pub use self::config::ConfigStore;
pub use self::extract::extract_command;
