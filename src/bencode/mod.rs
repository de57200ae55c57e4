pub mod encoder;
pub mod response;
pub mod value;
