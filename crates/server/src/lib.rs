pub mod errors;
pub mod gate;
pub mod openapi;
pub mod routes;
pub mod startup;

pub use startup::run;
