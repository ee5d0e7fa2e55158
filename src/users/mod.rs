pub mod phone;
pub mod users;
