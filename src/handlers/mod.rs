pub mod days;
pub mod itineraries;
pub mod system;
