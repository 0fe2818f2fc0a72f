//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Application::new → serve round
//!
//! Serve round (startup.rs):
//!     Activate detector → start listeners → wait for LifecycleEvent
//!     → listeners drain → activation guard released
//!
//! Shutdown (signals.rs):
//!     SIGINT/SIGTERM → Lifecycle::shutdown → round ends → exit
//!
//! Restart (recovery action):
//!     Lifecycle::restart → round ends → config re-read → next round
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{wait_for_event, Lifecycle, LifecycleError, LifecycleEvent};
pub use signals::spawn_signal_handler;
pub use startup::{Application, ServeError};
