//! Operator endpoints over all user accounts. Every handler requires the
//! caller's role to be `admin`.

pub mod handlers;

pub const ROLES: [&str; 2] = ["user", "admin"];

pub fn is_valid_role(role: &str) -> bool {
    ROLES.contains(&role)
}
