// src/handlers/mod.rs

pub mod assessment;
