pub mod config;
pub mod error;
pub mod logging;

pub use config::{data_dir, default_database_path, ensure_dir_mode_0700, ensure_file_mode_0600, xdg_or_home};
pub use error::{Error, ErrorKind};
pub use logging::init;
