//! # Modelo de Demonstração
//!
//! Um modelo pequeno com as tags `DT`, `JJ`, `NN` e `VB`, escrito à mão para
//! demonstrações, testes e para subir o servidor sem artefatos treinados.
//! Os pesos refletem intuições simples sobre o inglês:
//!
//! - Determinantes ("the", "a") quase sempre são `DT`.
//! - Depois de `DT` ou `JJ` vem um substantivo; depois de `NN`, um verbo.
//! - Sufixos como `-ing` e `-ous` indicam verbo e adjetivo.

use std::fs;
use std::io;
use std::path::Path;

use crate::errors::LoadError;
use crate::model::{Model, ModelPaths};

pub const DEMO_TAGS: &str = "\
# tags de demonstração (ordem = desempate)
DT
JJ
NN
VB
";

pub const DEMO_CLASSES: &str = r#"[
    {"name": "bias", "kind": "bias"},
    {"name": "word", "kind": "word"},
    {"name": "suffix3", "kind": "suffix", "length": 3},
    {"name": "prev_tag", "kind": "tag", "offset": -1},
    {"name": "prev2_tag", "kind": "tag", "offset": -2}
]"#;

pub const DEMO_WEIGHTS: &str = r#"{
    "bias": {"NN": 0.5},
    "word=the": {"DT": 6.0},
    "word=a": {"DT": 6.0},
    "word=an": {"DT": 6.0},
    "word=this": {"DT": 4.0, "NN": 0.5},
    "word=quick": {"JJ": 4.0},
    "word=brown": {"JJ": 4.0, "NN": 0.5},
    "word=lazy": {"JJ": 4.0},
    "word=old": {"JJ": 3.0, "NN": 1.0},
    "word=big": {"JJ": 3.0},
    "word=fox": {"NN": 5.0},
    "word=dog": {"NN": 5.0},
    "word=man": {"NN": 4.0, "VB": 1.0},
    "word=cat": {"NN": 4.0},
    "word=jumps": {"VB": 5.0, "NN": 0.5},
    "word=runs": {"VB": 4.0, "NN": 1.0},
    "word=sleeps": {"VB": 4.0},
    "word=sees": {"VB": 3.0},
    "suffix3=ing": {"VB": 1.5, "NN": 0.5},
    "suffix3=ous": {"JJ": 1.5},
    "suffix3=ful": {"JJ": 1.5},
    "suffix3=ion": {"NN": 1.5},
    "prev_tag=-START-": {"DT": 0.5},
    "prev_tag=DT": {"NN": 1.5, "JJ": 1.0, "VB": -1.0},
    "prev_tag=JJ": {"NN": 1.5, "JJ": 0.5},
    "prev_tag=NN": {"VB": 1.5, "NN": 0.3},
    "prev_tag=VB": {"DT": 0.8, "NN": 0.5},
    "prev2_tag=DT": {"NN": 0.3}
}"#;

pub const DEMO_TAG_DICTIONARY: &str = r#"{
    "the": "DT",
    "The": "DT",
    "a": "DT",
    "A": "DT"
}"#;

/// Modelo de demonstração, sem dicionário.
pub fn demo_model() -> Result<Model, LoadError> {
    Model::from_json(DEMO_WEIGHTS, DEMO_CLASSES, DEMO_TAGS, None)
}

/// Escreve os artefatos de demonstração em `dir` e devolve os caminhos.
pub fn write_demo_artifacts(dir: &Path) -> io::Result<ModelPaths> {
    let paths = ModelPaths::new(
        dir.join("weights.json"),
        dir.join("classes.json"),
        dir.join("tags.txt"),
    )
    .with_tag_dictionary(dir.join("tagdict.json"));

    fs::write(&paths.weights, DEMO_WEIGHTS)?;
    fs::write(&paths.classes, DEMO_CLASSES)?;
    fs::write(&paths.tags, DEMO_TAGS)?;
    if let Some(dict) = &paths.tag_dictionary {
        fs::write(dict, DEMO_TAG_DICTIONARY)?;
    }
    Ok(paths)
}

/// Frases de exemplo para demonstração.
pub fn demo_sentences() -> &'static [&'static str] {
    &[
        "the fox jumps",
        "The quick brown fox jumps over the lazy dog",
        "a big cat sleeps",
        "the old man runs",
        "this dog sees a famous fox",
    ]
}
