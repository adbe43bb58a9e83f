//! Email and password authentication.
//!
//! This module contains everything related to authenticating users:
//! - The `User` model and its database functions
//! - Password validation and hashing
//! - The encrypted auth cookie and the token stored inside it
//! - Router middleware that guards protected routes
//! - Route handlers for logging in, logging out, and registering

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register;
mod token;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use register::{get_register_page, register_user};
pub(super) use token::Token;
pub use user::{Email, User, UserID, create_user, create_user_table, get_user_by_id};
pub(super) use user::get_user_by_email;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;

#[cfg(test)]
pub use middleware::AuthState;
