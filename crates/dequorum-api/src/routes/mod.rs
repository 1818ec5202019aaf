pub mod health;
pub mod tags;
pub mod threads;
