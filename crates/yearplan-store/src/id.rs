use uuid::Uuid;

/// Length of a calendar id in hex characters.
pub const CALENDAR_ID_LEN: usize = 12;

/// New random calendar id: the first 12 lowercase hex digits of a v4 UUID.
pub fn generate_calendar_id() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(CALENDAR_ID_LEN)
        .collect()
}
