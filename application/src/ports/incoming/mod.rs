pub mod conversion;
pub mod delivery;
