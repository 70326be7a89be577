//! UI components built with Leptos.
//!
//! - [`router`] - Application routing (main entry point)

pub mod router;

pub use router::AppRouter;
