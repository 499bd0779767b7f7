pub const IS_ADMIN: &str = "is_admin";
