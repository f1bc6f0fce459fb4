// Library surface for the binary and integration tests.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod levenshtein;
pub mod logging;
pub mod result;
pub mod score;
pub mod sentences;
pub mod session;

pub use error::ScoreError;
pub use levenshtein::edit_distance;
pub use result::TypingResult;
pub use score::{score, ScoreRequest};
