// Library for tests to access modules

pub mod collector;
pub mod config;
pub mod coverage;
pub mod grouping;
pub mod metrics;
pub mod models;
pub mod probe;
pub mod routes;
pub mod version;
