//! Authentication & authorization module
//!
//! - [`JwtService`] - JWT token service
//! - [`CurrentUser`] - authenticated member context
//! - [`require_auth`] - authentication middleware (includes account status gate)
//! - [`require_admin`] / [`require_leader_or_admin`] - role guards

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth, require_leader_or_admin};
pub use password::{hash_password, verify_password};
