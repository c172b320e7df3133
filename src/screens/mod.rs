//! Admin screen state. Each screen owns its rows exclusively and keeps them
//! in step with the backend through full reloads or optimistic patches.

pub mod ads;
pub mod blacklist;
pub mod settings;
pub mod stats;
pub mod traffic;

pub use ads::AdScreen;
pub use blacklist::BlacklistScreen;
pub use settings::SettingsPanel;
pub use stats::{ClickStatsScreen, VisitorStatsScreen};
pub use traffic::TrafficScreen;

/// The person driving the console: answers confirmations and receives
/// failure notices.
pub trait Operator {
    fn confirm(&self, prompt: &str) -> bool;

    fn notify(&self, message: &str);
}
