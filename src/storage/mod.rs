pub mod store;

pub use store::{PostStore, StoredPost};
