pub mod child;
pub mod process_launcher;
pub mod wire;
