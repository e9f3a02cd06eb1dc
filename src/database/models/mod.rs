pub mod contraindication;
pub mod trend;

pub use contraindication::Contraindication;
pub use trend::TrendBucket;
