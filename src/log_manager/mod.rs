mod log_manager;

pub use log_manager::LogManager;
pub use log_manager::LogManagerError;
