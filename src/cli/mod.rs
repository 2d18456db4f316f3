//! CLI command handling

pub mod bootstrap;
pub mod ingest;
pub mod run;
pub mod watch;

pub use bootstrap::*;
pub use ingest::*;
pub use run::*;
pub use watch::*;
