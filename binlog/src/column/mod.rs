pub mod datetime;
pub mod decimal;
pub mod json;
pub mod value_decoder;
