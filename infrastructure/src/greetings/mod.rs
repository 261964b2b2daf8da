//! Greeting provider adapters

mod table;

pub use table::TableGreetingProvider;
