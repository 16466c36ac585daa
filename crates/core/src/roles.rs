//! Role names carried in access-token claims.
//!
//! Users have no role table; the role is derived from the `is_staff` flag.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Resolve the claim role for a user's staff flag.
pub fn role_for(is_staff: bool) -> &'static str {
    if is_staff {
        ROLE_ADMIN
    } else {
        ROLE_USER
    }
}
