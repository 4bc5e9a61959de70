pub mod classifier;
pub mod config;
pub mod lib;
pub mod platform;
pub mod session;

pub use self::classifier::{classify, Builtin, Verdict};
pub use self::config::{Config, Provider};
pub use self::lib::{
    AIProcessor, CommandExecutor, ConfigError, ExecOutcome, ExecutionError, Input, OpshError,
    OpshResult, ParseError, TerminalInterface, TranslationError, TranslationRequest,
};
pub use self::platform::{Platform, PlatformProfile};
pub use self::session::{CommandRecord, History, Session, Source};
