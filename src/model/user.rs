use strum_macros::{AsRefStr, Display, EnumString};

/// Account status; inactive users cannot log in.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
}
