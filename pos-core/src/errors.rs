//! # Erros do Etiquetador
//!
//! Dois níveis de erro:
//!
//! - [`LoadError`]: falhas ao carregar os artefatos do modelo (só acontecem na construção).
//! - [`EngineError`]: tudo que pode dar errado do lado de quem chama o motor
//!   (handle inválido, entrada malformada, falha de carga repassada).
//!
//! A decodificação em si não produz erros: com um modelo válido, extração de
//! features e scoring são funções totais.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use std::error::Error;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Qual dos artefatos do modelo falhou.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Weights,
    Tags,
    Classes,
    TagDictionary,
}

impl Artifact {
    pub fn name(&self) -> &'static str {
        match self {
            Artifact::Weights => "weights",
            Artifact::Tags => "tags",
            Artifact::Classes => "classes",
            Artifact::TagDictionary => "tag dictionary",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadErrorKind {
    /// O arquivo não existe.
    NotFound,
    /// O arquivo existe mas não pôde ser lido ou não é JSON/texto válido.
    ParseError,
    /// O conteúdo é sintaticamente válido mas viola as regras do modelo.
    SchemaError,
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadErrorKind::NotFound => "NotFound",
            LoadErrorKind::ParseError => "ParseError",
            LoadErrorKind::SchemaError => "SchemaError",
        };
        f.write_str(s)
    }
}

/// Falha ao carregar um artefato do modelo.
///
/// Sempre identifica o artefato e o caminho responsáveis. Nenhum modelo parcial
/// é construído quando este erro é retornado.
#[derive(Debug)]
pub struct LoadError {
    pub artifact: Artifact,
    pub path: PathBuf,
    pub kind: LoadErrorKind,
    pub reason: String,
}

impl LoadError {
    pub(crate) fn new<P, S>(artifact: Artifact, path: P, kind: LoadErrorKind, reason: S) -> Self
    where
        P: AsRef<Path>,
        S: Into<String>,
    {
        Self {
            artifact,
            path: path.as_ref().to_path_buf(),
            kind,
            reason: reason.into(),
        }
    }

    /// Converte um erro de I/O: `NotFound` vira [`LoadErrorKind::NotFound`],
    /// qualquer outro (permissão, UTF-8 inválido) vira `ParseError`.
    pub(crate) fn from_io(artifact: Artifact, path: &Path, error: io::Error) -> Self {
        let kind = match error.kind() {
            io::ErrorKind::NotFound => LoadErrorKind::NotFound,
            _ => LoadErrorKind::ParseError,
        };
        Self::new(artifact, path, kind, error.to_string())
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to load {} artifact '{}': {}: {}",
            self.artifact,
            self.path.display(),
            self.kind,
            self.reason
        )
    }
}

impl Error for LoadError {}

/// Erro usado quando um componente do modelo viola uma regra de consistência
/// (tag duplicada, offset fora da janela, peso não finito...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidModelError {
    pub(crate) msg: String,
}

impl InvalidModelError {
    pub(crate) fn new<S: Into<String>>(msg: S) -> Self {
        Self { msg: msg.into() }
    }

    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl fmt::Display for InvalidModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InvalidModelError: {}", self.msg)
    }
}

impl Error for InvalidModelError {}

/// Erros vistos por quem chama o motor.
#[derive(Debug)]
pub enum EngineError {
    Load(LoadError),
    /// Handle desconhecido ou já liberado. É um erro de programação do chamador:
    /// não há recuperação possível para esse handle.
    InvalidHandle(u64),
    /// Ponteiro nulo, UTF-8 inválido e afins.
    InvalidInput(String),
    Serialization(serde_json::Error),
}

impl EngineError {
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => e.fmt(f),
            Self::InvalidHandle(h) => write!(f, "InvalidHandle: {h} is not a live tagger handle"),
            Self::InvalidInput(msg) => write!(f, "InvalidInput: {msg}"),
            Self::Serialization(e) => e.fmt(f),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            Self::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LoadError> for EngineError {
    fn from(error: LoadError) -> Self {
        Self::Load(error)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}
