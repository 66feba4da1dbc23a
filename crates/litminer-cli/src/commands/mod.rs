//! Command implementations.

pub mod init;
pub mod providers;
pub mod run;

pub use init::execute_init;
pub use providers::execute_providers;
pub use run::execute_run;
