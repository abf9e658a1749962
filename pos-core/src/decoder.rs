//! # Decodificação — Gulosa ou Beam Search
//!
//! Percorre a sentença da esquerda para a direita. Em cada posição:
//!
//! ```text
//! features = extract(tokens, i, history[..i])
//! scores   = [score(features, t) for t in TagSet]
//! escolhe a tag, anexa ao histórico, registra (palavra, tag, confiança)
//! ```
//!
//! ## Estratégias
//!
//! - **Greedy** (padrão): fica com a melhor tag de cada posição e nunca volta atrás.
//!   Latência previsível, `O(N × T × F)`.
//! - **Beam { width }**: mantém as `width` melhores sequências parciais pelo score
//!   acumulado. `width = 1` reproduz exatamente o guloso.
//!
//! Diferente do Viterbi do CRF, aqui não há programação dinâmica exata: as
//! features dependem de até duas tags anteriores através de templates
//! arbitrários, então o beam é a aproximação natural.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::model::Model;
use crate::perceptron::{argmax, confidence, sanitize};
use crate::tagger::TagId;
use crate::tokenizer::Token;

/// Política de decisão do decodificador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum DecodeStrategy {
    #[default]
    Greedy,
    Beam { width: NonZeroUsize },
}

impl DecodeStrategy {
    /// `Beam` com a largura dada; `0` cai no guloso.
    pub fn beam(width: usize) -> Self {
        NonZeroUsize::new(width).map_or(DecodeStrategy::Greedy, |width| DecodeStrategy::Beam { width })
    }
}

/// Resultado da decodificação de uma sentença.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decoded {
    /// Uma tag por token.
    pub tags: Vec<TagId>,
    /// Confiança de cada tag, em [0, 1].
    pub confidences: Vec<f64>,
    /// Soma dos scores brutos das tags escolhidas (dicionário conta 0).
    pub score: f64,
}

impl Decoded {
    fn empty() -> Self {
        Self {
            tags: vec![],
            confidences: vec![],
            score: 0.0,
        }
    }
}

/// Decodificador de uma chamada. Todo estado mutável vive dentro de `decode`.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'m> {
    model: &'m Model,
    strategy: DecodeStrategy,
    use_dictionary: bool,
}

impl<'m> Decoder<'m> {
    pub fn new(model: &'m Model, strategy: DecodeStrategy) -> Self {
        Self {
            model,
            strategy,
            use_dictionary: true,
        }
    }

    pub fn use_dictionary(mut self, enabled: bool) -> Self {
        self.use_dictionary = enabled;
        self
    }

    pub fn decode(&self, tokens: &[Token]) -> Decoded {
        if tokens.is_empty() {
            return Decoded::empty();
        }
        match self.strategy {
            DecodeStrategy::Greedy => self.greedy(tokens),
            DecodeStrategy::Beam { width } => self.beam(tokens, width.get()),
        }
    }

    fn lookup(&self, token: &Token) -> Option<TagId> {
        if self.use_dictionary {
            self.model.lookup(&token.text)
        } else {
            None
        }
    }

    fn symbols(&self, ids: &[TagId]) -> Vec<&'m str> {
        let tags = self.model.tags();
        ids.iter().map(|&id| tags.symbol(id)).collect()
    }

    fn greedy(&self, tokens: &[Token]) -> Decoded {
        let tags = self.model.tags();
        let mut history: Vec<&str> = Vec::with_capacity(tokens.len());
        let mut out = Decoded {
            tags: Vec::with_capacity(tokens.len()),
            confidences: Vec::with_capacity(tokens.len()),
            score: 0.0,
        };

        for (position, token) in tokens.iter().enumerate() {
            let (tag, conf) = match self.lookup(token) {
                Some(tag) => (tag, 1.0),
                None => {
                    let features = self.model.extract(tokens, position, &history);
                    let scores = self.model.score_all(&features);
                    let best = argmax(&scores);
                    out.score += sanitize(scores[best]);
                    (best, confidence(&scores, best))
                }
            };
            history.push(tags.symbol(tag));
            out.tags.push(tag);
            out.confidences.push(conf);
        }
        out
    }

    fn beam(&self, tokens: &[Token], width: usize) -> Decoded {
        let mut beam = vec![Decoded::empty()];

        for (position, token) in tokens.iter().enumerate() {
            let mut candidates: Vec<Candidate> = Vec::new();

            for (parent, hyp) in beam.iter().enumerate() {
                if let Some(tag) = self.lookup(token) {
                    candidates.push(Candidate {
                        parent,
                        tag,
                        confidence: 1.0,
                        score: hyp.score,
                    });
                    continue;
                }

                let history = self.symbols(&hyp.tags);
                let features = self.model.extract(tokens, position, &history);
                let scores = self.model.score_all(&features);
                for (tag, &s) in scores.iter().enumerate() {
                    candidates.push(Candidate {
                        parent,
                        tag,
                        confidence: confidence(&scores, tag),
                        score: sanitize(hyp.score + sanitize(s)),
                    });
                }
            }

            // sort estável: empates ficam na ordem (hipótese pai, TagSet)
            candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
            candidates.truncate(width);

            beam = candidates
                .into_iter()
                .map(|c| {
                    let parent = &beam[c.parent];
                    let mut tags = Vec::with_capacity(position + 1);
                    tags.extend_from_slice(&parent.tags);
                    tags.push(c.tag);
                    let mut confidences = Vec::with_capacity(position + 1);
                    confidences.extend_from_slice(&parent.confidences);
                    confidences.push(c.confidence);
                    Decoded {
                        tags,
                        confidences,
                        score: c.score,
                    }
                })
                .collect();
        }

        beam.into_iter().next().unwrap_or_else(Decoded::empty)
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    parent: usize,
    tag: TagId,
    confidence: f64,
    score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureClass, FeatureClasses, FeatureKind, WordForm};
    use crate::perceptron::WeightTable;
    use crate::tagger::{TagDictionary, TagSet};
    use crate::tokenizer::tokenize;

    fn model(weights: &[(&str, &str, f64)]) -> Model {
        let tags = TagSet::new(["DT", "JJ", "NN", "VB"]).unwrap();
        let classes = FeatureClasses::new(vec![
            FeatureClass::new("bias", FeatureKind::Bias),
            FeatureClass::new("word", FeatureKind::Word { offset: 0, form: WordForm::Normalized }),
            FeatureClass::new("prev_tag", FeatureKind::Tag { offset: -1 }),
        ])
        .unwrap();
        let mut table = WeightTable::new(tags.len());
        for (feature, tag, w) in weights {
            table.set(feature, tags.id(tag).unwrap(), *w).unwrap();
        }
        Model::new(tags, classes, table).unwrap()
    }

    fn labels(model: &Model, decoded: &Decoded) -> Vec<String> {
        decoded
            .tags
            .iter()
            .map(|&t| model.tags().symbol(t).to_string())
            .collect()
    }

    #[test]
    fn test_greedy_uses_history() {
        let m = model(&[
            ("word=the", "DT", 5.0),
            ("prev_tag=DT", "NN", 1.0),
            ("prev_tag=NN", "VB", 1.0),
        ]);
        let decoded = Decoder::new(&m, DecodeStrategy::Greedy).decode(&tokenize("the blorf zaps"));
        assert_eq!(labels(&m, &decoded), vec!["DT", "NN", "VB"]);
        assert!(decoded.confidences.iter().all(|&c| c > 0.5));
    }

    #[test]
    fn test_greedy_tie_picks_first_tag() {
        let m = model(&[]);
        let decoded = Decoder::new(&m, DecodeStrategy::Greedy).decode(&tokenize("x y z"));
        assert_eq!(labels(&m, &decoded), vec!["DT", "DT", "DT"]);
        assert!(decoded.confidences.iter().all(|&c| c == 0.5));

        let m = model(&[("bias", "NN", 1.0), ("bias", "VB", 1.0)]);
        let decoded = Decoder::new(&m, DecodeStrategy::Greedy).decode(&tokenize("x"));
        assert_eq!(labels(&m, &decoded), vec!["NN"]);
        assert_eq!(decoded.confidences, vec![0.5]);
    }

    #[test]
    fn test_empty_sentence() {
        let m = model(&[]);
        for strategy in [DecodeStrategy::Greedy, DecodeStrategy::beam(3)] {
            let decoded = Decoder::new(&m, strategy).decode(&[]);
            assert!(decoded.tags.is_empty());
            assert!(decoded.confidences.is_empty());
        }
    }

    #[test]
    fn test_beam_width_one_matches_greedy() {
        let m = model(&[
            ("word=the", "DT", 2.0),
            ("word=old", "JJ", 1.0),
            ("word=old", "NN", 0.9),
            ("prev_tag=JJ", "NN", 1.5),
            ("prev_tag=NN", "VB", 1.2),
            ("prev_tag=NN", "NN", 1.0),
            ("bias", "NN", 0.1),
        ]);
        let tokens = tokenize("the old man the boats");
        let greedy = Decoder::new(&m, DecodeStrategy::Greedy).decode(&tokens);
        let beam = Decoder::new(&m, DecodeStrategy::beam(1)).decode(&tokens);
        assert_eq!(greedy.tags, beam.tags);
        assert_eq!(greedy.confidences, beam.confidences);
    }

    #[test]
    fn test_beam_recovers_garden_path() {
        // Guloso prefere "JJ" em "fast" (1.0 vs 0.8), mas JJ → "runs" é fraco,
        // enquanto NN → VB em "runs" compensa.
        let m = model(&[
            ("word=fast", "JJ", 1.0),
            ("word=fast", "NN", 0.8),
            ("prev_tag=NN", "VB", 3.0),
            ("prev_tag=JJ", "NN", 0.5),
        ]);
        let tokens = tokenize("fast runs");

        let greedy = Decoder::new(&m, DecodeStrategy::Greedy).decode(&tokens);
        assert_eq!(labels(&m, &greedy), vec!["JJ", "NN"]);

        let beam = Decoder::new(&m, DecodeStrategy::beam(4)).decode(&tokens);
        assert_eq!(labels(&m, &beam), vec!["NN", "VB"]);
        assert!(beam.score > greedy.score);
        // NN não era o favorito local em "fast": confiança abaixo da metade
        assert!(beam.confidences[0] < 0.5);
        assert!(beam.confidences.iter().all(|c| (0.0..=1.0).contains(c)));
    }

    #[test]
    fn test_dictionary_short_circuit() {
        let m = model(&[("prev_tag=VB", "NN", 2.0)]);
        let dict = TagDictionary::new([("Run", "VB")], m.tags()).unwrap();
        let m = m.with_dictionary(dict);
        let tokens = tokenize("Run home");

        for strategy in [DecodeStrategy::Greedy, DecodeStrategy::beam(2)] {
            let decoded = Decoder::new(&m, strategy).decode(&tokens);
            assert_eq!(labels(&m, &decoded), vec!["VB", "NN"]);
            assert_eq!(decoded.confidences[0], 1.0);
        }

        let decoded = Decoder::new(&m, DecodeStrategy::Greedy)
            .use_dictionary(false)
            .decode(&tokens);
        assert_eq!(labels(&m, &decoded)[0], "DT");
    }

    #[test]
    fn test_strategy_serde() {
        let s: DecodeStrategy = serde_json::from_str(r#"{"strategy": "beam", "width": 4}"#).unwrap();
        assert_eq!(s, DecodeStrategy::beam(4));
        let s: DecodeStrategy = serde_json::from_str(r#"{"strategy": "greedy"}"#).unwrap();
        assert_eq!(s, DecodeStrategy::Greedy);
        assert!(serde_json::from_str::<DecodeStrategy>(r#"{"strategy": "beam", "width": 0}"#).is_err());
        assert_eq!(DecodeStrategy::beam(0), DecodeStrategy::Greedy);
    }
}
