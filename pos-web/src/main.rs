//! Servidor HTTP Axum para anotação POS com um modelo carregado na inicialização

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::{ArgGroup, Parser};
use pos_core::{demo::demo_model, DecodeStrategy, Engine, ModelPaths, TaggedToken, TaggerOptions};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Os três artefatos do modelo vêm juntos ou nenhum vem.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("model").args(["weights", "classes", "tags"]).multiple(true)))]
struct Args {
    /// Tabela de pesos (JSON `{feature: {tag: peso}}`)
    #[arg(long, requires_all = ["classes", "tags"])]
    weights: Option<PathBuf>,

    /// Templates de features (JSON)
    #[arg(long, requires_all = ["weights", "tags"])]
    classes: Option<PathBuf>,

    /// Conjunto de tags (JSON ou uma por linha)
    #[arg(long, requires_all = ["weights", "classes"])]
    tags: Option<PathBuf>,

    /// Dicionário opcional de palavras não ambíguas
    #[arg(long, requires = "model")]
    tag_dict: Option<PathBuf>,

    #[arg(long, default_value = "0.0.0.0:3000")]
    addr: SocketAddr,

    /// Largura do beam; 0 usa decodificação gulosa
    #[arg(long, default_value_t = 0)]
    beam: usize,
}

struct AppState {
    engine: Engine,
}

#[derive(Deserialize)]
struct AnnotateRequest {
    sentence: String,
}

#[derive(Serialize)]
struct AnnotateResponse {
    tokens: Vec<TaggedToken>,
    total_tokens: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let options = TaggerOptions {
        strategy: DecodeStrategy::beam(args.beam),
        ..TaggerOptions::default()
    };

    let engine = match (&args.weights, &args.classes, &args.tags) {
        (Some(weights), Some(classes), Some(tags)) => {
            let mut paths = ModelPaths::new(weights, classes, tags);
            if let Some(dict) = &args.tag_dict {
                paths = paths.with_tag_dictionary(dict);
            }
            Engine::load_with_options(&paths, options)?
        }
        _ => {
            warn!("nenhum modelo informado (--weights/--classes/--tags), usando o modelo de demonstração");
            Engine::with_options(demo_model()?, options)
        }
    };
    info!(
        tags = engine.model().tags().len(),
        strategy = ?engine.options().strategy,
        "motor pronto"
    );

    let state = Arc::new(AppState { engine });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    info!("Servidor POS iniciado em http://{}", args.addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/annotate", post(annotate_handler))
        .route("/tags", get(tags_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

/// Anotação de uma sentença via HTTP POST
async fn annotate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnnotateRequest>,
) -> Response {
    // decodificação é CPU pura, fora do runtime assíncrono
    let result = tokio::task::spawn_blocking(move || state.engine.tag(&req.sentence)).await;
    match result {
        Ok(tokens) => {
            let total_tokens = tokens.len();
            Json(AnnotateResponse { tokens, total_tokens }).into_response()
        }
        Err(e) => {
            warn!("falha na anotação: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }
}

/// Tags que o modelo carregado pode emitir, na ordem do conjunto
async fn tags_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.engine.model().tags().symbols().to_vec())
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_model_flags_come_together() {
        let args = Args::try_parse_from([
            "pos-web", "--weights", "w.json", "--classes", "c.json", "--tags", "t.txt",
        ])
        .unwrap();
        assert_eq!(args.weights, Some(PathBuf::from("w.json")));
        assert_eq!(args.beam, 0);

        let demo = Args::try_parse_from(["pos-web"]).unwrap();
        assert!(demo.weights.is_none() && demo.classes.is_none() && demo.tags.is_none());

        for partial in [
            vec!["pos-web", "--classes", "c.json", "--tags", "t.txt"],
            vec!["pos-web", "--tags", "t.txt"],
            vec!["pos-web", "--weights", "w.json", "--classes", "c.json"],
            vec!["pos-web", "--tag-dict", "d.json"],
        ] {
            assert!(Args::try_parse_from(partial.clone()).is_err(), "{partial:?}");
        }
    }
}
