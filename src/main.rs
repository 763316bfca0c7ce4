use actix_cors::Cors;
use actix_web::{App, HttpServer};
use std::io;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod database;
mod error;
mod models;
mod routes;

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db_uri: String =
        std::env::var("MONGODB_URI").unwrap_or_else(|_| String::from("mongodb://localhost:27017"));

    database::connect(db_uri).await;

    info!("permit server listening on 127.0.0.1:8000");

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .service(routes::permit::get_permits)
            .service(routes::permit::get_permit)
            .service(routes::permit::create_permit)
            .service(routes::permit::activate_permit)
            .service(routes::permit::update_checklist_answer)
            .service(routes::permit::update_risk_answer)
            .service(routes::permit::update_close_approach)
            .service(routes::permit::update_high_risk)
            .service(routes::permit::update_signature)
            .service(routes::permit::register_crew_member)
            .service(routes::permit::sign_on_crew)
            .service(routes::permit::assign_role)
            .service(routes::permit::sign_on_receiver)
            .service(routes::permit::clear_role)
            .service(routes::permit::record_handover)
            .service(routes::permit::close_permit)
            .service(routes::permit::add_note)
            .service(routes::permit::remove_note)
            .service(routes::permit::add_photo)
            .service(routes::permit::remove_photo)
    })
    .bind(("127.0.0.1", 8000))?
    .run()
    .await
}
