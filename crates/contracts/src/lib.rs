//! # Contracts
//!
//! Frozen interface contracts shared by every relay crate: records, outcomes,
//! configuration, and the traits at the object-store and dispatch seams.
//! Business crates depend on this crate only, never on each other in reverse.
//!
//! ## Unit of work
//! - One notification names one object in a bucket
//! - One line of that object is one [`Record`]
//! - One record is one outbound request

mod config;
mod error;
mod notification;
mod outcome;
mod record;
mod sender;
mod store;

pub use config::*;
pub use error::*;
pub use notification::ObjectRef;
pub use outcome::*;
pub use record::*;
pub use sender::*;
pub use store::*;
