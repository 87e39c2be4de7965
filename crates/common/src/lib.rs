//! Shared building blocks for the workspace: logging setup and the small
//! response envelopes every HTTP surface agrees on.

pub mod types;

pub mod utils {
    pub mod logging;
}
