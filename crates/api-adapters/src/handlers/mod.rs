pub mod availability;
pub mod ops;
pub mod pages;
pub mod rooms;
