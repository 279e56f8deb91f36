pub mod lease;
pub mod persistence;
pub mod reservation;
mod store;

pub use lease::Lease;
pub use reservation::Reservation;
pub use store::Pool;
