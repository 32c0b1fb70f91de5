pub mod days;
pub mod token;
pub mod translate;
