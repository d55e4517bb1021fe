pub mod api;
pub mod visits;
