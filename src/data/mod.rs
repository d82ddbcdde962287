pub mod export;
pub mod reader;
pub mod regression;
pub mod series;
pub mod simulation;
