//! # pos-core — Etiquetador Morfossintático (POS Tagging)
//!
//! Este crate implementa a inferência de um etiquetador POS baseado em um
//! **perceptron médio** pré-treinado: dada uma sentença, atribui a cada token uma
//! tag gramatical (substantivo, verbo, adjetivo...) e uma confiança.
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Carga** ([`model`]): pesos, tags e templates de features são lidos uma vez.
//! 2.  **Tokenização** ([`tokenizer`]): a sentença é dividida por espaços em branco.
//! 3.  **Extração de Features** ([`features`]): cada posição vira um conjunto de
//!     features (`word=fox`, `prev_tag=DT`...), olhando só para tags já decididas.
//! 4.  **Scoring** ([`perceptron`]): soma de pesos `(feature, tag)` para cada tag.
//! 5.  **Decodificação** ([`decoder`]): gulosa da esquerda para a direita, ou beam search.
//! 6.  **Saída**: lista de [`TaggedToken`] `{word, tag, conf}`.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use pos_core::{demo::demo_model, Engine};
//!
//! let engine = Engine::new(demo_model().unwrap());
//! for token in engine.tag("the fox jumps") {
//!     println!("{} {} {:.2}", token.word, token.tag, token.confidence);
//! }
//! ```
//!
//! ## Módulos Principais
//!
//! - [`engine`]: o motor (dono do modelo) e suas opções.
//! - [`handle`]: handles opacos para a fronteira FFI.
//! - [`errors`]: erros de carga e de uso.

pub mod decoder;
pub mod demo;
pub mod engine;
pub mod errors;
pub mod features;
pub mod handle;
pub mod model;
pub mod perceptron;
pub mod tagger;
pub mod tokenizer;

pub use decoder::{DecodeStrategy, Decoder};
pub use engine::{Engine, TaggerOptions};
pub use errors::{Artifact, EngineError, LoadError, LoadErrorKind, Result};
pub use features::{FeatureClasses, FeatureSet};
pub use handle::{Handle, HandleTable};
pub use model::{Model, ModelPaths};
pub use tagger::{TagSet, TaggedToken};
pub use tokenizer::Token;
