pub mod clock;
pub mod dates;
pub mod http;
pub mod limits;
pub mod model;
pub mod observability;
pub mod scheduler;
pub mod store;
pub mod wal;
