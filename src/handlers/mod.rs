pub mod admin;
pub mod contraindications;
pub mod interactions;
pub mod refresh;
pub mod trends;
