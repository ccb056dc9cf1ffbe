//! Infrastructure layer for configuration, logging, document sessions and parsing
//!
//! Everything that touches the outside world lives here: the config file,
//! log outputs, HTTP, and the HTML of result pages.

pub mod config;
pub mod http_client;
pub mod http_session;
pub mod logging;
pub mod parsing;
pub mod scripted_session;
pub mod session;

pub use config::{AppConfig, ConfigManager, SearchConfig, SiteProfile};
pub use http_client::{HttpClient, HttpClientConfig};
pub use http_session::HttpSession;
pub use logging::{get_log_directory, init_logging_with_config};
pub use parsing::{ElementRole, ItemExtractor, LocatorResolver, ParsingError, ParsingResult, SiteSelectors};
pub use scripted_session::{ScriptedSession, SessionJournal, SessionRecorder};
pub use session::{DocumentSession, OptionChoice, SessionError, SessionResult};
