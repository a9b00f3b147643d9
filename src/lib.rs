pub mod browse;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod observable;
pub mod repository;
pub mod tmdb;
pub mod usecase;
pub mod viewmodel;
