//! # troupe
//!
//! A capability-oriented dispatch engine for screenplay-style test steps:
//! actors learn abilities, tasks, questions, conditions, and sayings, then
//! invoke them by name with automatic parameter resolution.
//!
//! ## Architecture
//!
//! - **Actor** (`actor`): five insertion-ordered registries plus the
//!   ingestion engine, invocation core, and dispatch resolver
//! - **Capabilities** (`capability`): explicit descriptors pairing a name,
//!   role, declared parameter list, and body
//! - **Sayings** (`saying`, `sayings`): naming-convention resolvers tried in
//!   registration order, first match wins
//! - **Poll engine** (`wait`): the `wait`/`on`/`to` chain of derived actors
//!   with a pluggable clock
//! - **Conditions** (`conditions`): reusable equality, ordering, and
//!   containment predicates
//!
//! ## Library usage
//!
//! ```
//! use troupe::actor::Actor;
//! use troupe::args::Args;
//! use troupe::capability::{Capability, Signature};
//! use troupe::value::TraitValue;
//!
//! let mut actor = Actor::with_standard_sayings();
//! actor.knows(Capability::question(
//!     "page_title",
//!     Signature::new().param("browser"),
//!     |args| {
//!         let browser = args.get("browser").and_then(TraitValue::as_str).unwrap_or("?");
//!         Ok(TraitValue::new(format!("Welcome ({browser})")))
//!     },
//! )).unwrap();
//! actor.knows_trait("browser", "headless");
//!
//! let title = actor.say("get_page_title").unwrap().invoke(Args::new()).unwrap();
//! assert_eq!(title.as_str(), Some("Welcome (headless)"));
//! ```

pub mod actor;
pub mod args;
pub mod capability;
pub mod conditions;
pub mod config;
pub mod error;
pub mod module;
pub mod role;
pub mod saying;
pub mod sayings;
pub mod value;
pub mod wait;

pub use actor::{Actor, Knowable};
pub use args::Args;
pub use capability::{Capability, Signature};
pub use error::{TroupeError, TroupeResult};
pub use value::TraitValue;
