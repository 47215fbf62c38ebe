/// Authentication module
///
/// Password hashing, JWT signing/verification, the session & token
/// lifecycle engine and the background session sweeper.

mod claims;
mod jwt;
mod password;
mod service;
mod sweeper;

pub use claims::{AccessClaims, RefreshClaims};
pub use jwt::{JwtTokenManager, TokenManager, TokenPair};
pub use password::{validate_password_strength, BcryptHasher, PasswordHasher, PasswordRule};
pub use service::AuthService;
pub use sweeper::{SessionSweeper, SweeperHandle};
