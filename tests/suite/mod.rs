mod config;
mod consumer;
mod hydration;
mod scenarios;
