use std::ffi::{CStr, CString};
use std::ptr;

use pos_core::demo::write_demo_artifacts;
use postagger::*;

fn c(s: impl AsRef<std::path::Path>) -> CString {
    CString::new(s.as_ref().to_str().unwrap()).unwrap()
}

#[test]
fn ffi_create_annotate_release() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_demo_artifacts(dir.path()).unwrap();
    let (weights, classes, tags) = (c(&paths.weights), c(&paths.classes), c(&paths.tags));

    unsafe {
        let handle = pos_tagger_create(weights.as_ptr(), classes.as_ptr(), tags.as_ptr());
        assert_ne!(handle, 0);
        assert!(pos_tagger_last_error().is_null());

        let sentence = CString::new("the fox jumps").unwrap();
        let out = pos_tagger_annotate(handle, sentence.as_ptr());
        assert!(!out.is_null());
        let json = CStr::from_ptr(out).to_str().unwrap().to_owned();
        pos_tagger_string_free(out);

        let items: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        let tags: Vec<&str> = items.iter().map(|v| v["tag"].as_str().unwrap()).collect();
        assert_eq!(tags, vec!["DT", "NN", "VB"]);
        assert_eq!(items[1]["word"], "fox");

        assert_eq!(pos_tagger_release(handle), 0);

        // uso depois de liberar é rejeitado
        let out = pos_tagger_annotate(handle, sentence.as_ptr());
        assert!(out.is_null());
        let err = CStr::from_ptr(pos_tagger_last_error()).to_str().unwrap();
        assert!(err.contains("InvalidHandle"));
        assert_eq!(pos_tagger_release(handle), -1);
    }
}

#[test]
fn ffi_dictionary_variant() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_demo_artifacts(dir.path()).unwrap();
    let dict = paths.tag_dictionary.clone().unwrap();
    let (weights, classes, tags, dict) = (
        c(&paths.weights),
        c(&paths.classes),
        c(&paths.tags),
        c(&dict),
    );

    unsafe {
        let handle = pos_tagger_create_with_dictionary(
            weights.as_ptr(),
            classes.as_ptr(),
            tags.as_ptr(),
            dict.as_ptr(),
        );
        assert_ne!(handle, 0);

        let sentence = CString::new("The dog").unwrap();
        let out = pos_tagger_annotate(handle, sentence.as_ptr());
        let items: Vec<serde_json::Value> =
            serde_json::from_str(CStr::from_ptr(out).to_str().unwrap()).unwrap();
        pos_tagger_string_free(out);
        assert_eq!(items[0]["tag"], "DT");
        assert_eq!(items[0]["conf"], 1.0);

        assert_eq!(pos_tagger_release(handle), 0);
    }
}

#[test]
fn ffi_create_failure_reports_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_demo_artifacts(dir.path()).unwrap();
    let missing = c(dir.path().join("missing.json"));
    let (classes, tags) = (c(&paths.classes), c(&paths.tags));

    unsafe {
        let handle = pos_tagger_create(missing.as_ptr(), classes.as_ptr(), tags.as_ptr());
        assert_eq!(handle, 0);
        let err = CStr::from_ptr(pos_tagger_last_error()).to_str().unwrap();
        assert!(err.contains("weights"));
        assert!(err.contains("NotFound"));

        let handle = pos_tagger_create(ptr::null(), classes.as_ptr(), tags.as_ptr());
        assert_eq!(handle, 0);
        let err = CStr::from_ptr(pos_tagger_last_error()).to_str().unwrap();
        assert!(err.contains("InvalidInput"));
    }
}

#[test]
fn ffi_rejects_bad_sentence_pointers() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_demo_artifacts(dir.path()).unwrap();
    let (weights, classes, tags) = (c(&paths.weights), c(&paths.classes), c(&paths.tags));

    unsafe {
        let handle = pos_tagger_create(weights.as_ptr(), classes.as_ptr(), tags.as_ptr());
        assert!(pos_tagger_annotate(handle, ptr::null()).is_null());

        let invalid = [0xffu8, 0xfe, 0x00];
        assert!(pos_tagger_annotate(handle, invalid.as_ptr().cast()).is_null());
        let err = CStr::from_ptr(pos_tagger_last_error()).to_str().unwrap();
        assert!(err.contains("UTF-8"));

        let empty = CString::new("   ").unwrap();
        let out = pos_tagger_annotate(handle, empty.as_ptr());
        assert_eq!(CStr::from_ptr(out).to_str().unwrap(), "[]");
        pos_tagger_string_free(out);

        pos_tagger_string_free(ptr::null_mut());
        assert_eq!(pos_tagger_release(handle), 0);
    }
}
