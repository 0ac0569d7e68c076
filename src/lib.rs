//! Faction AI - Rule-Driven Computer Player for Real-Time Strategy Games

pub mod ai;
pub mod core;
pub mod world;
