pub mod frequency;
pub mod multi_location;
pub mod registry;
pub mod speed;
