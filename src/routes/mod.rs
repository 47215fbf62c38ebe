mod auth;
mod health_check;

pub use auth::{
    get_current_user, login, refresh, register, validate, AuthResponse, LoginRequest, RefreshRequest,
    RegisterRequest, ValidateRequest, ValidateResponse,
};
pub use health_check::health_check;
