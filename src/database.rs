use mongodb::{Client, Database};
use std::sync::OnceLock;

static DB: OnceLock<Database> = OnceLock::new();

pub async fn connect(uri: String) {
    let client = Client::with_uri_str(uri)
        .await
        .expect("Failed to connect to database");
    if DB.set(client.database("eba_permits")).is_err() {
        panic!("Database is already connected");
    }
}

pub fn get_db() -> Database {
    DB.get().cloned().expect("Database is not available yet!")
}
