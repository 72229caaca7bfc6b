mod manager;
mod run;

pub use manager::BootstrapManager;
pub use run::run;
