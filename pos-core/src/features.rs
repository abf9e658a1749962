//! # Extração de Features para POS Tagging
//!
//! Cada posição da sentença é convertida num conjunto de identificadores de
//! features ativas (ex: `word=fox`, `suffix3=ing`, `prev_tag=DT`). Quais features
//! existem é definido pelo artefato de **classes** do modelo: uma lista de
//! templates nomeados ([`FeatureClass`]), cada um com um tipo ([`FeatureKind`])
//! que diz de onde o valor é derivado.
//!
//! ## Tipos de Template
//!
//! | kind             | valor derivado                                   |
//! |------------------|--------------------------------------------------|
//! | `bias`           | constante (id é só o nome da classe)             |
//! | `word`           | texto do vizinho (normalizado, minúsculo ou cru)  |
//! | `prefix`/`suffix`| primeiros/últimos N grafemas (`form`, padrão `lower`) |
//! | `shape`          | forma colapsada (`Xx`, `d`, `X.X.`)              |
//! | `capitalization` | `upper`, `title`, `lower`, `mixed`, `none`       |
//! | `has_digit`      | `true`/`false`                                   |
//! | `has_hyphen`     | `true`/`false`                                   |
//! | `tag`            | tag já decidida em `i-1` ou `i-2`                |
//! | `conjunction`    | valores das partes unidos por espaço             |
//!
//! ## Dependência da esquerda para a direita
//!
//! Features de tag só podem olhar para trás (offset −1 ou −2). Isso é validado
//! na carga e é o que torna a decodificação gulosa bem definida: a decisão na
//! posição `i` depende apenas de decisões em posições `< i`.
//!
//! ## Sentinelas
//!
//! Vizinhos fora da sentença viram valores reservados: `-START-` (i−1),
//! `-START2-` (i−2), `-END-` (i+1) e `-END2-` (i+2). Qualquer template avaliado
//! num vizinho ausente produz a própria sentinela.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::errors::InvalidModelError;
use crate::tokenizer::{normalize, Token};

/// Maior distância (em tokens) que um template pode olhar.
pub const WINDOW: isize = 2;

pub const START: &str = "-START-";
pub const START2: &str = "-START2-";
pub const END: &str = "-END-";
pub const END2: &str = "-END2-";

/// Forma do texto usada pelo template `word`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordForm {
    /// Ver [`crate::tokenizer::normalize`].
    #[default]
    Normalized,
    Lower,
    Raw,
}

impl WordForm {
    fn lower() -> Self {
        WordForm::Lower
    }

    fn apply(self, word: &str) -> String {
        match self {
            WordForm::Normalized => normalize(word),
            WordForm::Lower => word.to_lowercase(),
            WordForm::Raw => word.to_string(),
        }
    }
}

/// Como o valor de uma feature é derivado do contexto.
///
/// Offsets são relativos à posição atual (`0` = token atual, `-1` = anterior...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureKind {
    Bias,
    Word {
        #[serde(default)]
        offset: isize,
        #[serde(default)]
        form: WordForm,
    },
    Prefix {
        #[serde(default)]
        offset: isize,
        length: usize,
        #[serde(default = "WordForm::lower")]
        form: WordForm,
    },
    Suffix {
        #[serde(default)]
        offset: isize,
        length: usize,
        #[serde(default = "WordForm::lower")]
        form: WordForm,
    },
    Shape {
        #[serde(default)]
        offset: isize,
    },
    Capitalization {
        #[serde(default)]
        offset: isize,
    },
    HasDigit {
        #[serde(default)]
        offset: isize,
    },
    HasHyphen {
        #[serde(default)]
        offset: isize,
    },
    Tag {
        offset: isize,
    },
    Conjunction {
        parts: Vec<FeatureKind>,
    },
}

impl FeatureKind {
    fn validate(&self, nested: bool) -> Result<(), String> {
        let check_offset = |offset: isize| {
            if (-WINDOW..=WINDOW).contains(&offset) {
                Ok(())
            } else {
                Err(format!("offset {offset} is outside the window [-{WINDOW}, {WINDOW}]"))
            }
        };
        match self {
            FeatureKind::Bias if nested => Err("bias cannot be part of a conjunction".into()),
            FeatureKind::Bias => Ok(()),
            FeatureKind::Word { offset, .. }
            | FeatureKind::Shape { offset }
            | FeatureKind::Capitalization { offset }
            | FeatureKind::HasDigit { offset }
            | FeatureKind::HasHyphen { offset } => check_offset(*offset),
            FeatureKind::Prefix { offset, length, .. }
            | FeatureKind::Suffix { offset, length, .. } => {
                check_offset(*offset)?;
                if *length == 0 {
                    return Err("affix length must be at least 1".into());
                }
                Ok(())
            }
            FeatureKind::Tag { offset } => {
                // só tags já decididas
                if *offset == -1 || *offset == -2 {
                    Ok(())
                } else {
                    Err(format!("tag offset must be -1 or -2, got {offset}"))
                }
            }
            FeatureKind::Conjunction { .. } if nested => {
                Err("conjunctions cannot be nested".into())
            }
            FeatureKind::Conjunction { parts } => {
                if parts.is_empty() {
                    return Err("conjunction has no parts".into());
                }
                parts.iter().try_for_each(|p| p.validate(true))
            }
        }
    }
}

/// Um template nomeado. No JSON: `{"name": "suffix3", "kind": "suffix", "length": 3}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureClass {
    pub name: String,
    #[serde(flatten)]
    pub kind: FeatureKind,
}

impl FeatureClass {
    pub fn new(name: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Conjunto ordenado de identificadores de features ativas.
///
/// A ordem de iteração depende só do conteúdo, então a soma de pesos em
/// ponto flutuante é sempre feita na mesma ordem para o mesmo contexto.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureSet {
    ids: BTreeSet<String>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Separador padrão entre nome da classe e valor: `word=fox`.
pub const DEFAULT_SEPARATOR: &str = "=";

/// Lista de templates do modelo, na ordem de declaração. Imutável após a carga.
///
/// O id de uma feature é `nome{separador}valor`. Modelos treinados pelo
/// perceptron clássico usam espaço (`i word fox`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureClasses {
    classes: Vec<FeatureClass>,
    separator: String,
}

impl FeatureClasses {
    pub fn new(classes: Vec<FeatureClass>) -> Result<Self, InvalidModelError> {
        Self::with_separator(classes, DEFAULT_SEPARATOR)
    }

    /// Como [`FeatureClasses::new`], com outro separador entre nome e valor.
    ///
    /// Um separador que não é espaço em branco não pode aparecer nos nomes.
    pub fn with_separator(
        classes: Vec<FeatureClass>,
        separator: impl Into<String>,
    ) -> Result<Self, InvalidModelError> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(InvalidModelError::new("empty feature id separator"));
        }
        let strict = !separator.chars().all(char::is_whitespace);
        if classes.is_empty() {
            return Err(InvalidModelError::new("no feature classes defined"));
        }
        let mut seen = HashSet::new();
        for class in &classes {
            if class.name.is_empty() {
                return Err(InvalidModelError::new("feature class with empty name"));
            }
            if strict && class.name.contains(separator.as_str()) {
                return Err(InvalidModelError::new(format!(
                    "feature class name '{}' contains '{separator}'",
                    class.name
                )));
            }
            if !seen.insert(class.name.as_str()) {
                return Err(InvalidModelError::new(format!(
                    "duplicate class name '{}'",
                    class.name
                )));
            }
            class
                .kind
                .validate(false)
                .map_err(|msg| InvalidModelError::new(format!("class '{}': {msg}", class.name)))?;
        }
        Ok(Self { classes, separator })
    }

    /// Templates do perceptron médio clássico (NLTK / textblob), com os nomes e o
    /// formato de id originais: `i word fox`, `i suffix Fox`, `i-1 tag+i word DT fox`.
    ///
    /// Afixos do token atual mantêm a caixa original; os dos vizinhos usam a forma
    /// normalizada.
    pub fn perceptron_default() -> Self {
        use FeatureKind::*;

        let word = |offset| Word {
            offset,
            form: WordForm::Normalized,
        };
        let classes = vec![
            FeatureClass::new("bias", Bias),
            FeatureClass::new("i suffix", Suffix { offset: 0, length: 3, form: WordForm::Raw }),
            FeatureClass::new("i pref1", Prefix { offset: 0, length: 1, form: WordForm::Raw }),
            FeatureClass::new("i-1 tag", Tag { offset: -1 }),
            FeatureClass::new("i-2 tag", Tag { offset: -2 }),
            FeatureClass::new(
                "i tag+i-2 tag",
                Conjunction {
                    parts: vec![Tag { offset: -1 }, Tag { offset: -2 }],
                },
            ),
            FeatureClass::new("i word", word(0)),
            FeatureClass::new(
                "i-1 tag+i word",
                Conjunction {
                    parts: vec![Tag { offset: -1 }, word(0)],
                },
            ),
            FeatureClass::new("i-1 word", word(-1)),
            FeatureClass::new("i-1 suffix", Suffix { offset: -1, length: 3, form: WordForm::Normalized }),
            FeatureClass::new("i-2 word", word(-2)),
            FeatureClass::new("i+1 word", word(1)),
            FeatureClass::new("i+1 suffix", Suffix { offset: 1, length: 3, form: WordForm::Normalized }),
            FeatureClass::new("i+2 word", word(2)),
        ];
        Self {
            classes,
            separator: " ".to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureClass> {
        self.classes.iter()
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn get(&self, name: &str) -> Option<&FeatureClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Extrai as features ativas na posição `position`.
    ///
    /// `history` são as tags já decididas para as posições `< position`; entradas
    /// em `position` ou além são ignoradas.
    pub fn extract(&self, tokens: &[Token], position: usize, history: &[&str]) -> FeatureSet {
        debug_assert!(position < tokens.len());
        debug_assert!(history.len() >= position, "history shorter than position");

        let ctx = Context {
            tokens,
            position,
            history: &history[..position.min(history.len())],
        };

        self.classes
            .iter()
            .map(|class| match class.kind {
                FeatureKind::Bias => class.name.clone(),
                ref kind => format!("{}{}{}", class.name, self.separator, ctx.value(kind)),
            })
            .collect()
    }
}

/// Sentinela para uma posição fora da sentença de `len` tokens.
fn sentinel(position: isize, len: usize) -> &'static str {
    if position == -1 {
        START
    } else if position < 0 {
        START2
    } else if position as usize == len {
        END
    } else {
        END2
    }
}

struct Context<'a> {
    tokens: &'a [Token],
    position: usize,
    history: &'a [&'a str],
}

impl<'a> Context<'a> {
    fn absolute(&self, offset: isize) -> isize {
        self.position as isize + offset
    }

    fn token(&self, offset: isize) -> Result<&'a str, &'static str> {
        let p = self.absolute(offset);
        if p < 0 || p as usize >= self.tokens.len() {
            Err(sentinel(p, self.tokens.len()))
        } else {
            Ok(self.tokens[p as usize].text.as_str())
        }
    }

    fn tag(&self, offset: isize) -> &'a str {
        let p = self.absolute(offset);
        if p < 0 {
            return sentinel(p, self.tokens.len());
        }
        self.history.get(p as usize).copied().unwrap_or(START)
    }

    fn on_token(&self, offset: isize, f: impl FnOnce(&str) -> String) -> String {
        match self.token(offset) {
            Ok(word) => f(word),
            Err(sentinel) => sentinel.to_string(),
        }
    }

    fn value(&self, kind: &FeatureKind) -> String {
        match kind {
            FeatureKind::Bias => String::new(),
            FeatureKind::Word { offset, form } => self.on_token(*offset, |w| form.apply(w)),
            FeatureKind::Prefix { offset, length, form } => {
                self.on_token(*offset, |w| prefix(&form.apply(w), *length))
            }
            FeatureKind::Suffix { offset, length, form } => {
                self.on_token(*offset, |w| suffix(&form.apply(w), *length))
            }
            FeatureKind::Shape { offset } => self.on_token(*offset, shape),
            FeatureKind::Capitalization { offset } => {
                self.on_token(*offset, |w| capitalization(w).to_string())
            }
            FeatureKind::HasDigit { offset } => {
                self.on_token(*offset, |w| w.chars().any(|c| c.is_numeric()).to_string())
            }
            FeatureKind::HasHyphen { offset } => {
                self.on_token(*offset, |w| w.contains('-').to_string())
            }
            FeatureKind::Tag { offset } => self.tag(*offset).to_string(),
            FeatureKind::Conjunction { parts } => parts
                .iter()
                .map(|part| self.value(part))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn prefix(word: &str, n: usize) -> String {
    word.graphemes(true).take(n).collect()
}

fn suffix(word: &str, n: usize) -> String {
    let graphemes: Vec<&str> = word.graphemes(true).collect();
    graphemes[graphemes.len().saturating_sub(n)..].concat()
}

/// `Fox` → `Xx`, `1999` → `d`, `U.S.` → `X.X.`
fn shape(word: &str) -> String {
    let mut out = String::new();
    let mut last = None;
    for c in word.chars() {
        let class = if c.is_uppercase() {
            'X'
        } else if c.is_lowercase() {
            'x'
        } else if c.is_numeric() {
            'd'
        } else {
            c
        };
        if last != Some(class) {
            out.push(class);
            last = Some(class);
        }
    }
    out
}

fn capitalization(word: &str) -> &'static str {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        "none"
    } else if letters.iter().all(|c| c.is_uppercase()) {
        "upper"
    } else if letters.iter().all(|c| c.is_lowercase()) {
        "lower"
    } else if letters[0].is_uppercase() && letters[1..].iter().all(|c| c.is_lowercase()) {
        "title"
    } else {
        "mixed"
    }
}
