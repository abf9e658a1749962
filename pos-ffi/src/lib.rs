//! # Interface C do Etiquetador POS
//!
//! Fronteira FFI consumida por wrappers de outras linguagens (C, Java via JNA,
//! Python via ctypes). O ciclo de vida é:
//!
//! ```text
//! handle = pos_tagger_create(weights, classes, tags)   // 0 em caso de falha
//! json   = pos_tagger_annotate(handle, "the fox jumps") // [{"word":..,"tag":..,"conf":..}]
//! pos_tagger_string_free(json)
//! pos_tagger_release(handle)
//! ```
//!
//! Handles são índices na [`HandleTable`] global, não ponteiros: usar um handle
//! já liberado é detectado e reportado, nunca lê memória liberada.
//! A mensagem da última falha fica disponível em [`pos_tagger_last_error`].

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;

use pos_core::{EngineError, Handle, HandleTable, ModelPaths, TaggerOptions};
use tracing::warn;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = RefCell::new(None);
}

fn set_last_error(error: &EngineError) {
    let msg = CString::new(error.to_string().replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(msg));
}

fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

fn finish<T>(result: Result<T, EngineError>, failure: T) -> T {
    match result {
        Ok(value) => {
            clear_last_error();
            value
        }
        Err(error) => {
            warn!("ffi call failed: {error}");
            set_last_error(&error);
            failure
        }
    }
}

unsafe fn read_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, EngineError> {
    if ptr.is_null() {
        return Err(EngineError::invalid_input(format!("{what} is null")));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|e| EngineError::invalid_input(format!("{what} is not valid UTF-8: {e}")))
}

unsafe fn create(
    weights: *const c_char,
    classes: *const c_char,
    tags: *const c_char,
    dictionary: *const c_char,
) -> Result<Handle, EngineError> {
    let mut paths = ModelPaths::new(
        read_str(weights, "weights path")?,
        read_str(classes, "classes path")?,
        read_str(tags, "tags path")?,
    );
    if !dictionary.is_null() {
        paths = paths.with_tag_dictionary(read_str(dictionary, "tag dictionary path")?);
    }
    HandleTable::global().create(&paths, TaggerOptions::default())
}

unsafe fn annotate(handle: Handle, sentence: *const c_char) -> Result<CString, EngineError> {
    let sentence = read_str(sentence, "sentence")?;
    let json = HandleTable::global().annotate(handle, sentence)?;
    CString::new(json).map_err(|e| EngineError::invalid_input(e.to_string()))
}

/// Carrega o modelo e devolve um handle não nulo, ou `0` em caso de falha.
///
/// # Safety
///
/// Os três ponteiros devem ser nulos ou apontar para strings C terminadas em NUL.
#[no_mangle]
pub unsafe extern "C" fn pos_tagger_create(
    weights_path: *const c_char,
    classes_path: *const c_char,
    tags_path: *const c_char,
) -> u64 {
    finish(create(weights_path, classes_path, tags_path, ptr::null()), 0)
}

/// Como [`pos_tagger_create`], com um dicionário de palavras não ambíguas.
///
/// # Safety
///
/// Os quatro ponteiros devem ser nulos ou apontar para strings C terminadas em NUL.
/// `tag_dictionary_path` nulo equivale a [`pos_tagger_create`].
#[no_mangle]
pub unsafe extern "C" fn pos_tagger_create_with_dictionary(
    weights_path: *const c_char,
    classes_path: *const c_char,
    tags_path: *const c_char,
    tag_dictionary_path: *const c_char,
) -> u64 {
    finish(
        create(weights_path, classes_path, tags_path, tag_dictionary_path),
        0,
    )
}

/// Anota a sentença e devolve um array JSON alocado pela biblioteca, ou `NULL`.
///
/// O resultado deve ser devolvido com [`pos_tagger_string_free`].
///
/// # Safety
///
/// `sentence` deve ser nulo ou apontar para uma string C terminada em NUL.
#[no_mangle]
pub unsafe extern "C" fn pos_tagger_annotate(handle: u64, sentence: *const c_char) -> *mut c_char {
    finish(annotate(handle, sentence).map(CString::into_raw), ptr::null_mut())
}

/// Libera uma string devolvida por [`pos_tagger_annotate`]. Aceita `NULL`.
///
/// # Safety
///
/// `s` deve ter vindo de [`pos_tagger_annotate`] e não pode ser liberado duas vezes.
#[no_mangle]
pub unsafe extern "C" fn pos_tagger_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Invalida o handle. Devolve `0`, ou `-1` se o handle não estava vivo.
#[no_mangle]
pub extern "C" fn pos_tagger_release(handle: u64) -> c_int {
    finish(HandleTable::global().release(handle).map(|()| 0), -1)
}

/// Mensagem da última falha nesta thread, ou `NULL` se a última chamada teve sucesso.
///
/// O ponteiro vale até a próxima chamada à biblioteca na mesma thread.
#[no_mangle]
pub extern "C" fn pos_tagger_last_error() -> *const c_char {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map_or(ptr::null(), |s| s.as_ptr()))
}
