pub mod interpolate;
pub mod validate;
