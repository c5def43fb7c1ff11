//! matinee: a reactive DOM-observation-and-intervention engine for a
//! streaming-player page. Independent watchers monitor an externally
//! controlled document tree and react to the appearance and disappearance of
//! specific UI elements, suppressing spoiler panels, dismissing ad prompts,
//! managing pointer-cursor visibility, and auto-advancing to the next item,
//! without ever blocking the host.

pub mod advance;
pub mod config;
pub mod cursor;
pub mod dismisser;
pub mod enhancer;
pub mod logging;
pub mod net;
pub mod page;
pub mod schedule;
pub mod shortcuts;
pub mod style;
pub mod suppressor;
pub mod watch;

pub use config::Config;
pub use enhancer::Enhancer;
pub use net::{Fetch, ObservedFetch, SettleFeed};
pub use page::{EventKind, HostPage, KeyEvent};
