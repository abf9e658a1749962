//! # Motor de Etiquetagem
//!
//! O [`Engine`] é a unidade de ciclo de vida: carrega um modelo uma vez e atende
//! qualquer número de chamadas de anotação. O modelo fica atrás de um [`Arc`] e
//! nunca é modificado, então o mesmo `Engine` pode ser usado por várias threads
//! ao mesmo tempo; cada chamada mantém seu estado (tokens, histórico, scores)
//! localmente.
//!
//! A liberação é o `Drop`: não existe "usar depois de liberar" na API Rust.
//! Para chamadores estrangeiros que trabalham com handles numéricos, ver
//! [`crate::handle::HandleTable`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decoder::{DecodeStrategy, Decoder};
use crate::errors::{LoadError, Result};
use crate::model::{Model, ModelPaths};
use crate::tagger::TaggedToken;
use crate::tokenizer::tokenize;

/// Opções de decodificação de um motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerOptions {
    pub strategy: DecodeStrategy,
    /// Usa o dicionário de palavras não ambíguas, se o modelo tiver um.
    pub use_tag_dictionary: bool,
}

impl Default for TaggerOptions {
    fn default() -> Self {
        Self {
            strategy: DecodeStrategy::Greedy,
            use_tag_dictionary: true,
        }
    }
}

/// Motor de etiquetagem POS.
#[derive(Debug, Clone)]
pub struct Engine {
    model: Arc<Model>,
    options: TaggerOptions,
}

impl Engine {
    pub fn new(model: Model) -> Self {
        Self::with_options(model, TaggerOptions::default())
    }

    pub fn with_options(model: Model, options: TaggerOptions) -> Self {
        Self {
            model: Arc::new(model),
            options,
        }
    }

    pub fn load(paths: &ModelPaths) -> Result<Self, LoadError> {
        Self::load_with_options(paths, TaggerOptions::default())
    }

    pub fn load_with_options(paths: &ModelPaths, options: TaggerOptions) -> Result<Self, LoadError> {
        Model::load(paths).map(|model| Self::with_options(model, options))
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn options(&self) -> TaggerOptions {
        self.options
    }

    /// Etiqueta a sentença: uma entrada por token, na ordem da entrada.
    ///
    /// Sentença vazia ou só com espaços devolve um vetor vazio.
    pub fn tag(&self, sentence: &str) -> Vec<TaggedToken> {
        let tokens = tokenize(sentence);
        let decoded = Decoder::new(&self.model, self.options.strategy)
            .use_dictionary(self.options.use_tag_dictionary)
            .decode(&tokens);
        debug!(tokens = tokens.len(), score = decoded.score, "sentence tagged");

        let tags = self.model.tags();
        tokens
            .into_iter()
            .zip(decoded.tags.iter().zip(decoded.confidences.iter()))
            .map(|(token, (&tag, &confidence))| TaggedToken {
                word: token.text,
                tag: tags.symbol(tag).to_string(),
                confidence,
            })
            .collect()
    }

    /// Como [`Engine::tag`], serializado como array JSON de `{word, tag, conf}`.
    pub fn annotate(&self, sentence: &str) -> Result<String> {
        Ok(serde_json::to_string(&self.tag(sentence))?)
    }
}
