//! Service layer providing the account and token lifecycle behind the HTTP surface.
//! - Separates business logic from the web framework.
//! - Keeps persistence behind repository traits so stores can be swapped.
//! - Provides clear error types and documented interfaces.

pub mod auth;
