//! # Conjunto de Tags e Tokens Etiquetados
//!
//! O [`TagSet`] é o vocabulário de tags morfossintáticas do modelo (ex: `DT`, `NN`, `VB`).
//! A **ordem** das tags no arquivo é significativa:
//!
//! - O índice de cada tag ([`TagId`]) é o que indexa os vetores de score.
//! - Em caso de **empate** de scores, vence a tag listada primeiro.
//!
//! | Símbolo | Significado (Penn Treebank) |
//! |---------|-----------------------------|
//! | DT      | Determinante                |
//! | JJ      | Adjetivo                    |
//! | NN      | Substantivo                 |
//! | VB      | Verbo                       |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::InvalidModelError;

/// Identificador canônico de uma tag: sua posição no [`TagSet`].
pub type TagId = usize;

/// Vocabulário ordenado de tags, imutável após a carga.
///
/// Invariantes: não vazio, sem símbolos duplicados, sem espaço em branco dentro
/// de um símbolo (o espaço é usado como separador nas features de conjunção).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    symbols: Vec<String>,
    index: HashMap<String, TagId>,
}

impl TagSet {
    pub fn new<I, S>(symbols: I) -> Result<Self, InvalidModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        if symbols.is_empty() {
            return Err(InvalidModelError::new("tag set is empty"));
        }

        let mut index = HashMap::with_capacity(symbols.len());
        for (id, symbol) in symbols.iter().enumerate() {
            if symbol.is_empty() {
                return Err(InvalidModelError::new(format!("tag #{id} is empty")));
            }
            if symbol.chars().any(char::is_whitespace) {
                return Err(InvalidModelError::new(format!(
                    "tag '{symbol}' contains whitespace"
                )));
            }
            if index.insert(symbol.clone(), id).is_some() {
                return Err(InvalidModelError::new(format!("duplicate tag '{symbol}'")));
            }
        }

        Ok(Self { symbols, index })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Sempre `false`: um `TagSet` vazio não pode ser construído.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Símbolo da tag `id`. Entra em pânico se `id` estiver fora do conjunto.
    pub fn symbol(&self, id: TagId) -> &str {
        &self.symbols[id]
    }

    pub fn id(&self, symbol: &str) -> Option<TagId> {
        self.index.get(symbol).copied()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.index.contains_key(symbol)
    }

    /// Itera sobre os símbolos na ordem do arquivo.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

/// Dicionário de palavras não ambíguas (palavra exata → tag).
///
/// Palavras presentes aqui são etiquetadas diretamente, sem passar pelo scoring,
/// com confiança 1.0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDictionary {
    entries: HashMap<String, TagId>,
}

impl TagDictionary {
    /// Constrói o dicionário validando cada tag contra o `TagSet`.
    pub fn new<I, W, T>(entries: I, tags: &TagSet) -> Result<Self, InvalidModelError>
    where
        I: IntoIterator<Item = (W, T)>,
        W: Into<String>,
        T: AsRef<str>,
    {
        let mut map = HashMap::new();
        for (word, tag) in entries {
            let word = word.into();
            let tag = tag.as_ref();
            let id = tags.id(tag).ok_or_else(|| {
                InvalidModelError::new(format!("word '{word}' maps to unknown tag '{tag}'"))
            })?;
            map.insert(word, id);
        }
        Ok(Self { entries: map })
    }

    pub fn get(&self, word: &str) -> Option<TagId> {
        self.entries.get(word).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Unidade de saída: palavra original, tag escolhida e confiança em [0, 1].
///
/// Serializa como `{"word": ..., "tag": ..., "conf": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub word: String,
    pub tag: String,
    #[serde(rename = "conf")]
    pub confidence: f64,
}
