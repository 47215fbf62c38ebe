/// Middleware module
///
/// Bearer-token guard for resource routes.

mod jwt_middleware;

pub use jwt_middleware::{AuthenticatedUser, JwtMiddleware};
