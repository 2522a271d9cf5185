pub mod health;
pub mod pages;
pub mod players;
pub mod team;
