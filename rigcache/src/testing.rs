//! Fixture helpers shared by unit tests.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::OverlayError;
use crate::overlay::{AssetEntry, DirectoryOverlay, Overlay, OverlayKind};

/// Write `contents` to `root/relative`, creating parent folders.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Write a zip archive holding `entries`; names ending in `/` become folders.
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for (name, contents) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
    }

    zip.finish().unwrap();
}

/// A small valid animation document with one animation called `name`.
pub fn animation_json(name: &str) -> String {
    format!(
        r#"{{
            "format_version": "1.8.0",
            "animations": {{
                "{name}": {{
                    "loop": true,
                    "animation_length": 2.0,
                    "bones": {{
                        "head": {{
                            "rotation": {{
                                "0.0": [0, 0, 0],
                                "1.0": ["math.sin(query.anim_time * 90) * 5", 0, 0]
                            }},
                            "position": [0, 1, 0]
                        }}
                    }}
                }}
            }}
        }}"#
    )
}

/// A small valid geometry document with identifier `identifier`.
pub fn model_json(identifier: &str) -> String {
    format!(
        r#"{{
            "format_version": "1.12.0",
            "minecraft:geometry": [
                {{
                    "description": {{
                        "identifier": "{identifier}",
                        "texture_width": 64,
                        "texture_height": 32
                    }},
                    "bones": [
                        {{ "name": "root", "pivot": [0, 0, 0] }},
                        {{
                            "name": "head",
                            "parent": "root",
                            "pivot": [0, 24, 0],
                            "cubes": [
                                {{ "origin": [-4, 24, -4], "size": [8, 8, 8], "uv": [0, 0] }}
                            ]
                        }}
                    ]
                }}
            ]
        }}"#
    )
}

/// A directory overlay whose enumeration of one subfolder always fails.
#[derive(Debug)]
pub struct BrokenSubfolder {
    inner: DirectoryOverlay,
    subfolder: &'static str,
}

impl BrokenSubfolder {
    pub fn new(root: &Path, subfolder: &'static str) -> Self {
        Self {
            inner: DirectoryOverlay::with_name("half", root),
            subfolder,
        }
    }
}

impl Overlay for BrokenSubfolder {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> OverlayKind {
        self.inner.kind()
    }

    fn namespaces(&self) -> Result<BTreeSet<String>, OverlayError> {
        self.inner.namespaces()
    }

    fn enumerate(
        &self,
        subfolder: &str,
        filter: &(dyn Fn(&str) -> bool + Sync),
    ) -> Result<Vec<AssetEntry>, OverlayError> {
        if subfolder == self.subfolder {
            return Err(OverlayError::Unreadable {
                container: self.name().to_string(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            });
        }
        self.inner.enumerate(subfolder, filter)
    }

    fn read(&self, entry: &AssetEntry) -> Result<Vec<u8>, OverlayError> {
        self.inner.read(entry)
    }

    fn modified(&self) -> Option<SystemTime> {
        self.inner.modified()
    }
}
