//! Addressing core for the diskweb client.
//!
//! Converts positions in the storage hierarchy (disk → partition → mount →
//! directory → file) into canonical addresses and back:
//!
//! - [`codec`] - segment-safe percent encoding
//! - [`table`] - the ordered [`RouteTable`]
//! - [`resolver`] - address → [`Target`] or redirect
//! - [`navigator`] - the stateful [`Navigator`]
//! - [`backend`] - commands that fetch a screen's content

pub mod address;
pub mod backend;
pub mod codec;
pub mod config;
pub mod navigator;
pub mod resolver;
pub mod table;

pub use address::{MountId, StorageAddress};
pub use backend::{BackendCommand, CommandError, CommandRequest, CommandResponse};
pub use codec::{DecodeError, EncodedSegment, decode, encode};
pub use navigator::{NavState, Navigation, NavigationError, Navigator, Screen};
pub use resolver::{Params, ResolutionOutcome, ResolveError, Resolved, Resolver, Target, resolve};
pub use table::{RouteTable, RoutePattern, Segment, TableError, TargetKind};
