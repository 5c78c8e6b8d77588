//! Generation engine.
//!
//! - [`Engine`]: cooperatively scheduled single-threaded search, either on
//!   the caller's thread or a background thread
//! - Multi-threaded variant via [`Engine::spawn_parallel`]
//! - Progress, match and summary events

mod cpu;
mod handle;
mod pool;
mod search;
mod state;

pub use handle::{CancelToken, SearchHandle};
pub use search::{
    Engine, EngineError, NoYield, SearchParams, ThreadYield, YieldHook, DEFAULT_BATCH_SIZE,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_PROGRESS_INTERVAL,
};
pub use state::{Match, Outcome, ProgressSnapshot, SearchEvent, SearchState, Summary};
