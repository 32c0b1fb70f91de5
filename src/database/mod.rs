pub mod manager;
pub mod memory;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryItineraryStore;
pub use postgres::PgItineraryStore;
pub use store::ItineraryStore;
