//! Listing of policy and repository documents

use std::path::Path;

use crate::error::Result;

/// Basenames of the files in `dir` with extension `ext`, sorted.
pub fn document_names(dir: &Path, ext: &str) -> Result<Vec<String>> {
    let ext = ext.trim_start_matches('.');
    let mut names = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }

    names.sort();
    Ok(names)
}

/// Run the list command
pub fn run_list(dir: &Path, ext: &str) -> Result<()> {
    for name in document_names(dir, ext)? {
        println!("{name}");
    }
    Ok(())
}
