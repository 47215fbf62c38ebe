use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use actix_web::dev::Server;

use crate::auth::AuthService;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{get_current_user, health_check, login, refresh, register, validate};

pub fn run(listener: TcpListener, auth_service: AuthService) -> Result<Server, std::io::Error> {
    let auth_data = web::Data::new(auth_service.clone());

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(auth_data.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/validate", web::post().to(validate))
            .route("/auth/refresh", web::post().to(refresh))

            // Protected routes (require JWT authentication)
            .service(
                web::scope("/api")
                    .wrap(JwtMiddleware::new(auth_service.clone()))
                    .route("/me", web::get().to(get_current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
