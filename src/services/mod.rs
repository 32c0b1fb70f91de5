pub mod generator;
pub mod guard;
pub mod itinerary_service;

pub use generator::{parse_generated_days, DayGenerator, GenerationRequest, GeneratorError, ModelOutputGenerator};
pub use guard::OwnershipGuard;
pub use itinerary_service::ItineraryService;
