pub mod params;
pub mod validation;

pub use params::Params;
pub use validation::Valid;
