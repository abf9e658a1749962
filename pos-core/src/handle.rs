//! # Tabela de Handles
//!
//! Chamadores estrangeiros (C, JNI) não têm como segurar um [`Engine`] Rust.
//! Eles recebem um **handle opaco** (`u64` não nulo) que indexa esta tabela.
//!
//! - Handles nunca são reutilizados: um handle liberado continua inválido para sempre.
//! - `annotate` num handle desconhecido ou liberado devolve
//!   [`EngineError::InvalidHandle`] em vez de tocar memória liberada.
//! - Cada chamada clona o `Arc<Engine>`; um `release` concorrente só remove a
//!   entrada da tabela, e o motor é destruído quando a última chamada em voo termina.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::engine::{Engine, TaggerOptions};
use crate::errors::{EngineError, Result};
use crate::model::ModelPaths;
use crate::tagger::TaggedToken;

pub type Handle = u64;

#[derive(Debug)]
pub struct HandleTable {
    next: AtomicU64,
    engines: RwLock<HashMap<Handle, Arc<Engine>>>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            engines: RwLock::new(HashMap::new()),
        }
    }

    /// Tabela do processo, usada pela camada FFI.
    pub fn global() -> &'static HandleTable {
        static TABLE: OnceLock<HandleTable> = OnceLock::new();
        TABLE.get_or_init(HandleTable::new)
    }

    /// Carrega um modelo e registra o motor. Nenhum handle é criado se a carga falhar.
    pub fn create(&self, paths: &ModelPaths, options: TaggerOptions) -> Result<Handle> {
        match Engine::load_with_options(paths, options) {
            Ok(engine) => Ok(self.insert(engine)),
            Err(e) => {
                warn!("tagger creation failed: {e}");
                Err(e.into())
            }
        }
    }

    pub fn insert(&self, engine: Engine) -> Handle {
        let handle = self.next.fetch_add(1, Ordering::Relaxed);
        self.engines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, Arc::new(engine));
        debug!(handle, "tagger registered");
        handle
    }

    pub fn get(&self, handle: Handle) -> Result<Arc<Engine>> {
        self.engines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .cloned()
            .ok_or(EngineError::InvalidHandle(handle))
    }

    pub fn tag(&self, handle: Handle, sentence: &str) -> Result<Vec<TaggedToken>> {
        Ok(self.get(handle)?.tag(sentence))
    }

    /// Anota a sentença e devolve o array JSON `[{word, tag, conf}, ...]`.
    pub fn annotate(&self, handle: Handle, sentence: &str) -> Result<String> {
        self.get(handle)?.annotate(sentence)
    }

    /// Invalida o handle. Liberar duas vezes é [`EngineError::InvalidHandle`].
    pub fn release(&self, handle: Handle) -> Result<()> {
        let removed = self
            .engines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        match removed {
            Some(_) => {
                debug!(handle, "tagger released");
                Ok(())
            }
            None => Err(EngineError::InvalidHandle(handle)),
        }
    }

    /// Número de handles vivos.
    pub fn len(&self) -> usize {
        self.engines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}
