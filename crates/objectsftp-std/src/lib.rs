pub mod handle;
pub mod listing;
pub mod path;
pub mod pipeline;
pub mod stat;
pub mod store;

pub use handle::FileHandle;
pub use listing::NamespaceLister;
pub use stat::StatResolver;
