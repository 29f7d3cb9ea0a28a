//! Turning raw input into commands: where it comes from ([`router`]) and what it
//! means ([`classify`]).

pub mod classify;
pub mod router;

pub use classify::{classify, Command, PrefixSet, Substitution, TagSet, DEFAULT_PREFIXES};
pub use router::{route, select_source, Frontend, Handlers, InputStream, Source, StdinStream};
