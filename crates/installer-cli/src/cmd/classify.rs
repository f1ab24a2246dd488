//! Classify command

use installer_schema::{AssetPattern, FileType, file_extension};

/// One line per name: `name -> os/arch (type)`, `?` for anything unknown.
pub fn describe(name: &str) -> String {
    let pattern = AssetPattern::from_filename(name);
    let os = pattern.os.map_or("?", |os| os.as_str());
    let arch = pattern.arch.map_or("?", |arch| arch.as_str());
    let file_type = file_extension(name)
        .and_then(FileType::from_extension)
        .map_or("?", |t| t.as_str());
    format!("{name} -> {os}/{arch} ({file_type})")
}

pub fn classify(names: &[String]) {
    for name in names {
        println!("{}", describe(name));
    }
}
