pub mod migrate;
pub mod normalize;
pub mod sqlh;
mod store;

pub use normalize::{NormalizeOptions, normalize};
pub use store::{DirEntry, Store, default_database_path};
