//! # Modelo POS Pré-treinado
//!
//! O modelo agrega os artefatos carregados uma única vez:
//!
//! - **Tags** ([`TagSet`]): vocabulário ordenado de tags.
//! - **Classes** ([`FeatureClasses`]): templates de features.
//! - **Pesos** ([`WeightTable`]): tabela esparsa `(feature, tag) → peso`.
//! - **Dicionário** ([`TagDictionary`], opcional): palavras não ambíguas.
//!
//! ## Formato dos Artefatos
//!
//! ```text
//! weights.json   {"word=the": {"DT": 4.2}, "prev_tag=DT": {"NN": 1.1, "JJ": 0.6}}
//! tags.txt       uma tag por linha (ou um array JSON: ["DT", "JJ", "NN"])
//! classes.json   [{"name": "word", "kind": "word"}, {"name": "prev_tag", "kind": "tag", "offset": -1}]
//!                {"separator": " ", "classes": [...]}
//!                {"preset": "perceptron"}
//! tagdict.json   {"the": "DT", "of": "IN"}
//! ```
//!
//! Depois de construído o modelo nunca é modificado, então pode ser
//! compartilhado entre threads sem sincronização.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{Artifact, InvalidModelError, LoadError, LoadErrorKind};
use crate::features::{FeatureClass, FeatureClasses, FeatureSet, DEFAULT_SEPARATOR};
use crate::perceptron::WeightTable;
use crate::tagger::{TagDictionary, TagId, TagSet};
use crate::tokenizer::Token;

/// Caminhos dos artefatos do modelo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPaths {
    pub weights: PathBuf,
    pub classes: PathBuf,
    pub tags: PathBuf,
    #[serde(default)]
    pub tag_dictionary: Option<PathBuf>,
}

impl ModelPaths {
    pub fn new(
        weights: impl Into<PathBuf>,
        classes: impl Into<PathBuf>,
        tags: impl Into<PathBuf>,
    ) -> Self {
        Self {
            weights: weights.into(),
            classes: classes.into(),
            tags: tags.into(),
            tag_dictionary: None,
        }
    }

    pub fn with_tag_dictionary(mut self, path: impl Into<PathBuf>) -> Self {
        self.tag_dictionary = Some(path.into());
        self
    }
}

/// O modelo completo: `(TagSet, FeatureClasses, WeightTable)` + dicionário opcional.
#[derive(Debug, Clone)]
pub struct Model {
    tags: TagSet,
    classes: FeatureClasses,
    weights: WeightTable,
    dictionary: Option<TagDictionary>,
}

impl Model {
    pub fn new(
        tags: TagSet,
        classes: FeatureClasses,
        weights: WeightTable,
    ) -> Result<Self, InvalidModelError> {
        if weights.n_tags() != tags.len() {
            return Err(InvalidModelError::new(format!(
                "weight rows have {} tags but the tag set has {}",
                weights.n_tags(),
                tags.len()
            )));
        }
        Ok(Self {
            tags,
            classes,
            weights,
            dictionary: None,
        })
    }

    pub fn with_dictionary(mut self, dictionary: TagDictionary) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    /// Carrega o modelo dos arquivos. Falha por completo se qualquer artefato falhar.
    pub fn load(paths: &ModelPaths) -> Result<Self, LoadError> {
        let tags_text = read_artifact(Artifact::Tags, &paths.tags)?;
        let classes_text = read_artifact(Artifact::Classes, &paths.classes)?;
        let weights_text = read_artifact(Artifact::Weights, &paths.weights)?;
        let dict_text = paths
            .tag_dictionary
            .as_deref()
            .map(|p| read_artifact(Artifact::TagDictionary, p))
            .transpose()?;

        let model = Self::from_sources(
            Source::new(&paths.weights, &weights_text),
            Source::new(&paths.classes, &classes_text),
            Source::new(&paths.tags, &tags_text),
            paths
                .tag_dictionary
                .as_deref()
                .zip(dict_text.as_deref())
                .map(|(p, text)| Source::new(p, text)),
        )?;

        info!(
            tags = model.tags.len(),
            classes = model.classes.len(),
            features = model.weights.len(),
            dictionary = model.dictionary.as_ref().map_or(0, TagDictionary::len),
            "model loaded from {}",
            paths.weights.display()
        );
        Ok(model)
    }

    /// Constrói o modelo a partir do conteúdo dos artefatos já em memória.
    pub fn from_json(
        weights: &str,
        classes: &str,
        tags: &str,
        tag_dictionary: Option<&str>,
    ) -> Result<Self, LoadError> {
        let inline = Path::new("<inline>");
        Self::from_sources(
            Source::new(inline, weights),
            Source::new(inline, classes),
            Source::new(inline, tags),
            tag_dictionary.map(|text| Source::new(inline, text)),
        )
    }

    fn from_sources(
        weights: Source<'_>,
        classes: Source<'_>,
        tags: Source<'_>,
        dictionary: Option<Source<'_>>,
    ) -> Result<Self, LoadError> {
        let tag_set = parse_tags(tags.text).map_err(|e| tags.error(Artifact::Tags, e))?;
        let feature_classes =
            parse_classes(classes.text).map_err(|e| classes.error(Artifact::Classes, e))?;
        let weight_table = parse_weights(weights.text, &tag_set)
            .map_err(|e| weights.error(Artifact::Weights, e))?;
        let dict = dictionary
            .map(|d| {
                parse_dictionary(d.text, &tag_set).map_err(|e| d.error(Artifact::TagDictionary, e))
            })
            .transpose()?;

        debug!(
            tags = tag_set.len(),
            classes = feature_classes.len(),
            features = weight_table.len(),
            "artifacts parsed"
        );

        let model = Self::new(tag_set, feature_classes, weight_table).map_err(|e| {
            weights.error(Artifact::Weights, (LoadErrorKind::SchemaError, e.msg))
        })?;
        Ok(match dict {
            Some(d) => model.with_dictionary(d),
            None => model,
        })
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn classes(&self) -> &FeatureClasses {
        &self.classes
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn dictionary(&self) -> Option<&TagDictionary> {
        self.dictionary.as_ref()
    }

    /// Features ativas na posição `position`, dadas as tags já decididas.
    pub fn extract(&self, tokens: &[Token], position: usize, history: &[&str]) -> FeatureSet {
        self.classes.extract(tokens, position, history)
    }

    /// Score de uma tag pelo símbolo. `None` se a tag não pertence ao modelo.
    pub fn score(&self, features: &FeatureSet, tag: &str) -> Option<f64> {
        self.tags.id(tag).map(|id| self.weights.score(features, id))
    }

    pub fn score_all(&self, features: &FeatureSet) -> Vec<f64> {
        self.weights.score_all(features)
    }

    /// Tag do dicionário para a palavra exata, se houver.
    pub fn lookup(&self, word: &str) -> Option<TagId> {
        self.dictionary.as_ref().and_then(|d| d.get(word))
    }
}

struct Source<'a> {
    path: &'a Path,
    text: &'a str,
}

impl<'a> Source<'a> {
    fn new(path: &'a Path, text: &'a str) -> Self {
        Self { path, text }
    }

    fn error(&self, artifact: Artifact, (kind, reason): (LoadErrorKind, String)) -> LoadError {
        LoadError::new(artifact, self.path, kind, reason)
    }
}

type ParseResult<T> = Result<T, (LoadErrorKind, String)>;

fn read_artifact(artifact: Artifact, path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|e| LoadError::from_io(artifact, path, e))
}

fn parse_error(e: serde_json::Error) -> (LoadErrorKind, String) {
    (LoadErrorKind::ParseError, e.to_string())
}

fn schema_error(e: InvalidModelError) -> (LoadErrorKind, String) {
    (LoadErrorKind::SchemaError, e.msg)
}

/// Array JSON de strings ou uma tag por linha.
///
/// Linhas como `# penn subset` são comentários; um `#` sozinho é a tag `#`.
fn parse_tags(text: &str) -> ParseResult<TagSet> {
    let symbols: Vec<String> = if text.trim_start().starts_with('[') {
        serde_json::from_str(text).map_err(parse_error)?
    } else {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !is_comment(line))
            .map(str::to_string)
            .collect()
    };
    TagSet::new(symbols).map_err(schema_error)
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#') && line != "#"
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum Preset {
    Perceptron,
}

/// Forma objeto do artefato de classes.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassesFile {
    #[serde(default)]
    preset: Option<Preset>,
    #[serde(default)]
    separator: Option<String>,
    #[serde(default)]
    classes: Option<Vec<FeatureClass>>,
}

fn parse_classes(text: &str) -> ParseResult<FeatureClasses> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(parse_error)?;
    if value.is_array() {
        let list: Vec<FeatureClass> = serde_json::from_value(value).map_err(parse_error)?;
        return FeatureClasses::new(list).map_err(schema_error);
    }

    let file: ClassesFile = serde_json::from_value(value).map_err(parse_error)?;
    match (file.preset, file.classes) {
        (Some(_), Some(_)) => Err((
            LoadErrorKind::SchemaError,
            "'preset' and 'classes' are mutually exclusive".to_string(),
        )),
        (Some(_), None) if file.separator.is_some() => Err((
            LoadErrorKind::SchemaError,
            "a preset fixes its own separator".to_string(),
        )),
        (Some(Preset::Perceptron), None) => Ok(FeatureClasses::perceptron_default()),
        (None, Some(list)) => {
            let separator = file.separator.as_deref().unwrap_or(DEFAULT_SEPARATOR);
            FeatureClasses::with_separator(list, separator).map_err(schema_error)
        }
        (None, None) => Err((
            LoadErrorKind::SchemaError,
            "classes object needs 'preset' or 'classes'".to_string(),
        )),
    }
}

fn parse_weights(text: &str, tags: &TagSet) -> ParseResult<WeightTable> {
    let nested: HashMap<String, HashMap<String, f64>> =
        serde_json::from_str(text).map_err(parse_error)?;
    WeightTable::from_nested(nested, tags).map_err(schema_error)
}

fn parse_dictionary(text: &str, tags: &TagSet) -> ParseResult<TagDictionary> {
    let entries: HashMap<String, String> = serde_json::from_str(text).map_err(parse_error)?;
    TagDictionary::new(entries, tags).map_err(schema_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSES: &str = r#"[
        {"name": "bias", "kind": "bias"},
        {"name": "word", "kind": "word"}
    ]"#;

    #[test]
    fn test_parse_tags_text_and_json() {
        let text = "# penn subset\nDT\n  NN \n\nVB\n";
        let tags = parse_tags(text).unwrap();
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["DT", "NN", "VB"]);

        let tags = parse_tags(r#"["DT", "NN"]"#).unwrap();
        assert_eq!(tags.len(), 2);

        let (kind, _) = parse_tags("").unwrap_err();
        assert_eq!(kind, LoadErrorKind::SchemaError);
        let (kind, _) = parse_tags("[\"DT\",").unwrap_err();
        assert_eq!(kind, LoadErrorKind::ParseError);
        let (kind, reason) = parse_tags("NN\nNN").unwrap_err();
        assert_eq!(kind, LoadErrorKind::SchemaError);
        assert!(reason.contains("duplicate"));
    }

    #[test]
    fn test_bare_hash_is_a_tag() {
        let tags = parse_tags("# penn punctuation\nNN\n#\n$\n").unwrap();
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["NN", "#", "$"]);

        let model = Model::from_json(r##"{"bias": {"#": 1.0}}"##, CLASSES, "NN\n#\n$\n", None)
            .unwrap();
        let fs: FeatureSet = ["bias"].into_iter().collect();
        assert_eq!(model.score(&fs, "#"), Some(1.0));
    }

    #[test]
    fn test_classes_object_forms() {
        let fc = parse_classes(r#"{"preset": "perceptron"}"#).unwrap();
        assert_eq!(fc, FeatureClasses::perceptron_default());

        let fc = parse_classes(r#"{"separator": " ", "classes": [{"name": "w", "kind": "word"}]}"#)
            .unwrap();
        assert_eq!(fc.separator(), " ");

        let fc = parse_classes(r#"{"classes": [{"name": "w", "kind": "word"}]}"#).unwrap();
        assert_eq!(fc.separator(), "=");

        for bad in [
            r#"{"preset": "perceptron", "classes": []}"#,
            r#"{"preset": "perceptron", "separator": "="}"#,
            r#"{}"#,
        ] {
            let (kind, _) = parse_classes(bad).unwrap_err();
            assert_eq!(kind, LoadErrorKind::SchemaError, "{bad}");
        }
        for bad in [r#"{"preset": "crf"}"#, r#"{"clases": []}"#] {
            let (kind, _) = parse_classes(bad).unwrap_err();
            assert_eq!(kind, LoadErrorKind::ParseError, "{bad}");
        }
    }

    #[test]
    fn test_classic_perceptron_weights_score() {
        let weights = r#"{
            "i word fox": {"NN": 1.0},
            "i suffix Fox": {"NN": 1.0},
            "i pref1 F": {"NN": 0.5},
            "i-1 tag -START-": {"DT": 0.25}
        }"#;
        let model = Model::from_json(weights, r#"{"preset": "perceptron"}"#, "DT\nNN", None).unwrap();
        let tokens = crate::tokenizer::tokenize("Fox");
        let fs = model.extract(&tokens, 0, &[]);
        assert_eq!(model.score(&fs, "NN"), Some(2.5));
        assert_eq!(model.score(&fs, "DT"), Some(0.25));
    }

    #[test]
    fn test_from_json_builds_model() {
        let model = Model::from_json(
            r#"{"word=the": {"DT": 3.0}, "bias": {"NN": 0.5}, "word=unseen": {}}"#,
            CLASSES,
            "DT\nNN",
            Some(r#"{"The": "DT"}"#),
        )
        .unwrap();
        assert_eq!(model.tags().len(), 2);
        assert_eq!(model.classes().len(), 2);
        assert_eq!(model.weights().len(), 3);
        assert_eq!(model.lookup("The"), Some(0));
        assert_eq!(model.lookup("the"), None);

        let fs: FeatureSet = ["bias", "word=the"].into_iter().collect();
        assert_eq!(model.score(&fs, "DT"), Some(3.0));
        assert_eq!(model.score(&fs, "NN"), Some(0.5));
        assert_eq!(model.score(&fs, "VB"), None);

        // feature com objeto interno vazio é válida e não contribui
        let fs: FeatureSet = ["bias", "word=unseen"].into_iter().collect();
        assert_eq!(model.score(&fs, "DT"), Some(0.0));
        assert_eq!(model.score(&fs, "NN"), Some(0.5));
    }

    #[test]
    fn test_errors_name_the_failing_artifact() {
        let err = Model::from_json(r#"{"bias": {"VB": 1.0}}"#, CLASSES, "DT\nNN", None)
            .unwrap_err();
        assert_eq!(err.artifact, Artifact::Weights);
        assert_eq!(err.kind, LoadErrorKind::SchemaError);

        let err = Model::from_json(r#"{"bias": {"NN": "high"}}"#, CLASSES, "DT\nNN", None)
            .unwrap_err();
        assert_eq!(err.artifact, Artifact::Weights);
        assert_eq!(err.kind, LoadErrorKind::ParseError);

        let err = Model::from_json("{}", r#"[{"name": "t", "kind": "tag", "offset": 1}]"#, "NN", None)
            .unwrap_err();
        assert_eq!(err.artifact, Artifact::Classes);
        assert_eq!(err.kind, LoadErrorKind::SchemaError);

        let err = Model::from_json("{}", r#"[{"name": "x", "kind": "telepathy"}]"#, "NN", None)
            .unwrap_err();
        assert_eq!(err.artifact, Artifact::Classes);
        assert_eq!(err.kind, LoadErrorKind::ParseError);

        let err = Model::from_json("{}", CLASSES, "NN", Some(r#"{"run": "VB"}"#)).unwrap_err();
        assert_eq!(err.artifact, Artifact::TagDictionary);
        assert_eq!(err.kind, LoadErrorKind::SchemaError);
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let paths = ModelPaths::new(
            "/nonexistent/weights.json",
            "/nonexistent/classes.json",
            "/nonexistent/tags.txt",
        );
        let err = Model::load(&paths).unwrap_err();
        assert_eq!(err.kind, LoadErrorKind::NotFound);
        assert_eq!(err.artifact, Artifact::Tags);
        assert_eq!(err.path, PathBuf::from("/nonexistent/tags.txt"));
    }
}
