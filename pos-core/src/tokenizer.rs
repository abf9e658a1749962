//! # Tokenizador por Espaços em Branco
//!
//! Divide a sentença de entrada em tokens separados por espaço em branco (Unicode
//! `White_Space`). O texto de cada token é preservado exatamente como veio:
//! maiúsculas, pontuação colada e acentos não são alterados.
//!
//! Também contém a **normalização** usada pelas features de palavra: formas que
//! aparecem raramente no treino (números, anos, compostos com hífen) são
//! colapsadas em classes fixas para que o modelo generalize.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use pos_core::tokenizer::{tokenize, normalize};
//!
//! let tokens = tokenize("  The fox, in 1999 ");
//! assert_eq!(tokens.len(), 4);
//! assert_eq!(tokens[1].text, "fox,");
//! assert_eq!(normalize(&tokens[3].text), "!YEAR");
//! ```

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Um token extraído da sentença original.
///
/// Mantém os offsets de byte (`start`, `end`) para que o chamador possa
/// reconstruir a posição exata de cada palavra na entrada.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    /// O texto do token, sem nenhuma alteração.
    pub text: String,
    /// Índice de byte inicial na sentença (inclusive).
    pub start: usize,
    /// Índice de byte final na sentença (exclusivo).
    pub end: usize,
    /// Posição do token na sentença (0, 1, 2...).
    pub index: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, start: usize, end: usize, index: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            index,
        }
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\S+").expect("static token pattern"))
}

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{4}$").expect("static year pattern"))
}

/// Tokeniza a sentença por espaços em branco.
///
/// Sentença vazia ou só com espaços produz um vetor vazio.
pub fn tokenize(sentence: &str) -> Vec<Token> {
    token_pattern()
        .find_iter(sentence)
        .enumerate()
        .map(|(index, m)| Token::new(m.as_str(), m.start(), m.end(), index))
        .collect()
}

/// Normaliza uma palavra para a feature de forma.
///
/// - Contém `-` e não começa com `-` → `!HYPHEN`
/// - Exatamente quatro dígitos ASCII → `!YEAR`
/// - Começa com dígito ASCII → `!DIGITS`
/// - Caso contrário, a palavra em minúsculas
pub fn normalize(word: &str) -> String {
    if word.contains('-') && !word.starts_with('-') {
        "!HYPHEN".to_string()
    } else if year_pattern().is_match(word) {
        "!YEAR".to_string()
    } else if word.starts_with(|c: char| c.is_ascii_digit()) {
        "!DIGITS".to_string()
    } else {
        word.to_lowercase()
    }
}
