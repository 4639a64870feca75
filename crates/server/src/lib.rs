pub mod errors;
pub mod controllers;
pub mod routes;
pub mod openapi;
pub mod startup;

pub use startup::run;
