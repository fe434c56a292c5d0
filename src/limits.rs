/// Longest guest name accepted, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// Default maximum `end - start` in days.
pub const DEFAULT_MAX_STAY_NIGHTS: i64 = 3;

/// Default number of days ahead of today a stay may start or end.
pub const DEFAULT_BOOKING_HORIZON_DAYS: i64 = 30;

/// Longest room name accepted, in characters.
pub const MAX_ROOM_NAME_LEN: usize = 50;

/// Upper bound on stored reservations per room.
pub const MAX_RESERVATIONS_PER_ROOM: usize = 100_000;
