pub mod memory;
pub mod rest;
pub mod traits;
pub mod types;

pub use memory::MemoryPropertyStore;
pub use rest::RestPropertyStore;
pub use traits::PropertyStore;
pub use types::{CountField, EqualityField, PriceRange, StorePage, StoreQuery};
