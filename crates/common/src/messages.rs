//! Coarse response messages and the user-facing detail strings.

pub const SUCCESS: &str = "Success";
pub const CREATED: &str = "Created";
pub const BAD_REQUEST: &str = "Bad Request";
pub const UNAUTHORIZED: &str = "Unauthorized";
pub const CONFLICT: &str = "Conflict";
pub const NOT_FOUND: &str = "Not Found";
pub const UNPROCESSABLE_ENTITY: &str = "Unprocessable Entity";
pub const SERVICE_UNAVAILABLE: &str = "Service Unavailable";

pub const USER_CREATED: &str = "User created successfully";
pub const LOGIN_SUCCESS: &str = "Login successfully";
pub const TOKEN_REFRESHED: &str = "Token refreshed successfully";
pub const LOGOUT_SUCCESS: &str = "Logout successfully";
pub const EMAIL_VERIFIED: &str = "Email verified successfully";
pub const EMAIL_ALREADY_VERIFIED: &str = "Email already verified";
pub const VERIFY_EMAIL_SENT: &str = "Verification email sent";
