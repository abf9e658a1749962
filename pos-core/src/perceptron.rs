//! # Pesos do Perceptron Médio e Scoring
//!
//! O modelo é linear: o score de uma tag `t` numa posição é a soma dos pesos
//! `w(f, t)` de todas as features ativas `f`:
//!
//! $$ \text{score}(t) = \sum_{f \in F} w(f, t) $$
//!
//! A tabela é **esparsa** no eixo das features (só features vistas no treino têm
//! linha) e densa no eixo das tags: cada linha é um vetor indexado por [`TagId`].
//! Pares ausentes valem 0.
//!
//! ## Confiança
//!
//! A confiança da tag escolhida `c` é a logística da margem entre o seu score e o
//! melhor score entre as demais tags:
//!
//! $$ \text{conf} = \sigma\big(s_c - \max_{t \ne c} s_t\big), \quad \sigma(x) = \frac{1}{1 + e^{-x}} $$
//!
//! Empate dá exatamente 0.5; com uma única tag no conjunto a confiança é 1.0.

use std::collections::HashMap;

use crate::errors::InvalidModelError;
use crate::features::FeatureSet;
use crate::tagger::{TagId, TagSet};

/// Tabela esparsa `(feature, tag) → peso`. Imutável após a carga.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightTable {
    rows: HashMap<String, Box<[f64]>>,
    n_tags: usize,
}

impl WeightTable {
    /// Tabela vazia para um conjunto de `n_tags` tags.
    pub fn new(n_tags: usize) -> Self {
        Self {
            rows: HashMap::new(),
            n_tags,
        }
    }

    /// Constrói a partir do formato aninhado `{feature: {tag: peso}}`.
    pub fn from_nested<F, T>(nested: F, tags: &TagSet) -> Result<Self, InvalidModelError>
    where
        F: IntoIterator<Item = (String, T)>,
        T: IntoIterator<Item = (String, f64)>,
    {
        let mut table = Self::new(tags.len());
        for (feature, weights) in nested {
            let row = table.row_mut(&feature);
            for (tag, weight) in weights {
                let id = tags.id(&tag).ok_or_else(|| {
                    InvalidModelError::new(format!(
                        "feature '{feature}' has a weight for unknown tag '{tag}'"
                    ))
                })?;
                if !weight.is_finite() {
                    return Err(InvalidModelError::new(format!(
                        "weight of ('{feature}', '{tag}') is not finite"
                    )));
                }
                row[id] = weight;
            }
        }
        Ok(table)
    }

    fn row_mut(&mut self, feature: &str) -> &mut [f64] {
        let n_tags = self.n_tags;
        self.rows
            .entry(feature.to_string())
            .or_insert_with(|| vec![0.0; n_tags].into_boxed_slice())
    }

    /// Define um peso. Usado na construção de modelos em memória.
    pub fn set(&mut self, feature: &str, tag: TagId, weight: f64) -> Result<(), InvalidModelError> {
        if tag >= self.n_tags {
            return Err(InvalidModelError::new(format!(
                "tag id {tag} out of range (n_tags = {})",
                self.n_tags
            )));
        }
        if !weight.is_finite() {
            return Err(InvalidModelError::new(format!(
                "weight of ('{feature}', #{tag}) is not finite"
            )));
        }
        self.row_mut(feature)[tag] = weight;
        Ok(())
    }

    pub fn weight(&self, feature: &str, tag: TagId) -> f64 {
        self.rows
            .get(feature)
            .and_then(|row| row.get(tag))
            .copied()
            .unwrap_or(0.0)
    }

    /// Número de tags de cada linha.
    pub fn n_tags(&self) -> usize {
        self.n_tags
    }

    /// Número de features com pelo menos uma linha.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Score de uma única tag: soma de `w(f, tag)` sobre as features ativas.
    pub fn score(&self, features: &FeatureSet, tag: TagId) -> f64 {
        features
            .iter()
            .filter_map(|f| self.rows.get(f))
            .fold(0.0, |acc, row| acc + row[tag])
    }

    /// Scores de todas as tags numa só passada pelas features.
    ///
    /// A soma é feita na mesma ordem que [`WeightTable::score`], então os
    /// resultados são idênticos bit a bit.
    pub fn score_all(&self, features: &FeatureSet) -> Vec<f64> {
        let mut scores = vec![0.0; self.n_tags];
        for row in features.iter().filter_map(|f| self.rows.get(f)) {
            for (score, w) in scores.iter_mut().zip(row.iter()) {
                *score += w;
            }
        }
        scores
    }
}

/// Trata NaN como −∞ para que nunca vença uma comparação.
pub(crate) fn sanitize(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}

/// Índice do maior score. Empates vão para a tag listada primeiro no `TagSet`.
pub fn argmax(scores: &[f64]) -> TagId {
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (id, &score) in scores.iter().enumerate() {
        let score = sanitize(score);
        if score > best_score {
            best = id;
            best_score = score;
        }
    }
    best
}

pub fn logistic(x: f64) -> f64 {
    if x.is_nan() {
        0.5
    } else if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Confiança da tag `chosen` dados os scores de todas as tags na posição.
///
/// Sempre finita e em [0, 1].
pub fn confidence(scores: &[f64], chosen: TagId) -> f64 {
    let own = sanitize(scores[chosen]);
    let rival = scores
        .iter()
        .enumerate()
        .filter(|&(id, _)| id != chosen)
        .map(|(_, &s)| sanitize(s))
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));

    let Some(rival) = rival else {
        return 1.0;
    };
    let margin = own - rival;
    let conf = if margin == f64::INFINITY {
        1.0
    } else if margin == f64::NEG_INFINITY {
        0.0
    } else {
        // −∞ − (−∞) = NaN → empate
        logistic(margin)
    };
    conf.clamp(0.0, 1.0)
}
