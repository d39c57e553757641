//! Petstore Example
//!
//! Serves `demos/petstore.yaml` with handlers resolved by REST conventions,
//! and shows the response optimizer: the HTML listing is cached, minified
//! and gzipped, and adding or removing a pet clears the cached page.
//!
//! Run with:
//! ```bash
//! cargo run --example petstore
//! ```
//!
//! Then test:
//! ```bash
//! # HTML listing (served from cache after the first request)
//! curl -H "Accept-Encoding: gzip" --compressed http://localhost:3000/v1/pets
//!
//! # Add a pet
//! curl -X POST http://localhost:3000/v1/pets \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Tom"}'
//!
//! # A pet and its toys
//! curl http://localhost:3000/v1/pets/1
//! curl http://localhost:3000/v1/pets/1/toys
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::on,
};
use axum_openapi_plus::{
    Config, FluentRouter, HandlerRegistry, MultipleResourceResolver, Optimize, OptimizeContext,
    Result, openapi::ApiSpec,
};
use serde::{Deserialize, Serialize};
use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

#[derive(Clone, Serialize)]
struct Pet {
    id: u64,
    name: String,
    toys: Vec<String>,
}

#[derive(Deserialize)]
struct NewPet {
    name: String,
}

#[derive(Default)]
struct AppState {
    pets: RwLock<Vec<Pet>>,
}

type SharedState = Arc<AppState>;

async fn list_pets(State(state): State<SharedState>) -> Html<String> {
    let pets = state.pets.read().unwrap();
    let items: String = pets
        .iter()
        .map(|pet| format!("\n    <li>{}</li>", pet.name))
        .collect();
    Html(format!(
        "<html>\n  <body>\n    <h1>Pets</h1>\n    <ul>{items}\n    </ul>\n  </body>\n</html>"
    ))
}

async fn add_pet(
    State(state): State<SharedState>,
    ctx: OptimizeContext,
    Json(new_pet): Json<NewPet>,
) -> impl IntoResponse {
    let pet = {
        let mut pets = state.pets.write().unwrap();
        let pet = Pet {
            id: pets.iter().map(|p| p.id).max().unwrap_or(0) + 1,
            name: new_pet.name,
            toys: vec![],
        };
        pets.push(pet.clone());
        pet
    };
    // The listing is cached under the collection's key
    ctx.set_key("GET/v1/pets");
    ctx.clear_key().await.ok();
    (StatusCode::CREATED, Json(pet))
}

async fn get_pet(State(state): State<SharedState>, Path(id): Path<u64>) -> impl IntoResponse {
    let pets = state.pets.read().unwrap();
    match pets.iter().find(|pet| pet.id == id) {
        Some(pet) => Json(pet.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_pet(
    State(state): State<SharedState>,
    ctx: OptimizeContext,
    Path(id): Path<u64>,
) -> StatusCode {
    state.pets.write().unwrap().retain(|pet| pet.id != id);
    ctx.set_key("GET/v1/pets");
    ctx.clear_key().await.ok();
    StatusCode::NO_CONTENT
}

async fn list_toys(State(state): State<SharedState>, Path(id): Path<u64>) -> impl IntoResponse {
    let pets = state.pets.read().unwrap();
    match pets.iter().find(|pet| pet.id == id) {
        Some(pet) => Json(pet.toys.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // In production, use Config::default() to load from config/{RUST_ENV}.toml
    let config: Config = r#"
[http]
bind_addr = "127.0.0.1"
bind_port = 3000
request_timeout = "30s"
with_metrics = false

[http.optimizer]
minify = true
compress = true
default_cache_timeout = "5m"

[http.optimizer.cache]
sweep_interval = "1m"

[logging]
format = "default"
"#
    .parse()?;

    config.setup_tracing();

    let state = Arc::new(AppState::default());
    state.pets.write().unwrap().push(Pet {
        id: 1,
        name: "Rex".into(),
        toys: vec!["ball".into(), "bone".into()],
    });

    let registry = HandlerRegistry::<SharedState>::new()
        .with_factory("api.Pets.search", |filter| {
            on(filter, list_pets).layer(Optimize::cache_for(Duration::from_secs(300)))
        })
        .with_handler("api.Pets.post", add_pet)
        .with_handler("api.Pets.get", get_pet)
        .with_handler("api.Pets.delete", delete_pet)
        .with_handler("api.Pets.Toys.search", list_toys);

    let spec = ApiSpec::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/petstore.yaml"))?;

    println!("Starting server on http://127.0.0.1:3000/v1/pets");

    FluentRouter::<SharedState>::with_state(config, state)?
        .add_api(&spec, &MultipleResourceResolver::default(), &registry)?
        .setup_middleware()
        .await?
        .start()
        .await
}
