use crate::model::Ms;

/// 1970-01-01T00:00:00Z
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;
/// 9999-12-31T23:59:59.999Z
pub const MAX_VALID_TIMESTAMP_MS: Ms = 253_402_300_799_999;

/// Spot names must stay strictly below this many characters.
pub const MAX_NAME_LEN: usize = 50;
pub const MAX_FIELD_LEN: usize = 255;
pub const MAX_DESCRIPTION_LEN: usize = 10_000;
pub const MAX_REVIEW_LEN: usize = 10_000;
pub const MAX_URL_LEN: usize = 2048;

pub const MAX_IMAGES_PER_SPOT: usize = 100;
pub const MAX_BOOKINGS_PER_SPOT: usize = 100_000;
pub const MAX_SPOTS: usize = 1_000_000;
