pub mod blocks;
pub mod model;
pub mod repository;

pub use blocks::{BlockList, SealError, Sealed, SizeMismatch, StagedBlock};
pub use model::{CacheId, Reservation};
pub use repository::ReservationTable;
