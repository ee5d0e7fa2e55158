pub mod cars;
pub mod rating;
