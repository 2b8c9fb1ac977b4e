pub mod engine;
pub mod labels;
pub mod preprocess;
pub mod ranker;
pub mod risk;
