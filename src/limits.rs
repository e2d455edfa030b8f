/// Longest stay a single request may cover, in nights.
pub const MAX_STAY_DAYS: i64 = 365;

/// Widest calendar window a single query may render, in days.
pub const MAX_CALENDAR_DAYS: i64 = 731;

/// Upper bound on pages fetched when walking the bookings listing.
pub const MAX_BOOKING_PAGES: u32 = 50;

/// Venues whose availability snapshots are kept in memory at once.
pub const MAX_SNAPSHOTS: usize = 1024;

/// Largest page size the API honors.
pub const MAX_PAGE_SIZE: u32 = 100;
