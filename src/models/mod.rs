mod attendance;
mod employee;
mod user;

pub use attendance::{
    local_today, status_for_day, AttendanceLog, DailyStatus, PunchDirection,
};
pub use employee::Employee;
pub use user::AdminUser;

use serde::{Deserialize, Deserializer};

/// Sheet cells typed as text can still come back as bare JSON numbers when
/// every character happens to be a digit. Accept both and normalize to a
/// string so id comparisons stay exact.
pub(crate) fn sheet_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
