pub mod column;
pub mod dataloader;
pub mod table;

pub use column::*;
pub use dataloader::*;
pub use table::{Groups, Table};
pub(crate) use table::describe_key;
