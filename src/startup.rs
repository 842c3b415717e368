use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::middleware::{BearerAuth, RequestLogger};
use crate::routes::{health_check, login, logout, profile, refresh, signup};

pub fn run(listener: TcpListener, auth: web::Data<AuthService>) -> Result<Server, std::io::Error> {
    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            .app_data(auth.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/auth")
                    // Public routes
                    .route("/signup", web::post().to(signup))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/logout", web::post().to(logout))
                    // Protected routes
                    .service(
                        web::resource("/profile")
                            .wrap(BearerAuth::new(auth.clone()))
                            .route(web::get().to(profile)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
