// Domain types and value objects
mod bar;
mod instrument;

// Re-export commonly used types to the world
pub use bar::Bar;
pub use instrument::Instrument;
