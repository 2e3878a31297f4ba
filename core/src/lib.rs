pub mod bundle;
pub mod chart;
pub mod engine;
pub mod geometry;
pub mod ledger;
pub mod photo;
pub mod render;

pub fn version() -> &'static str {
    "0.1.0"
}
