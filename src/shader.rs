//! Two-stage shader files.
//!
//! A shader file holds both stages, each introduced by a marker line:
//!
//! ```text
//! // shared declarations
//! #shader vertex
//! ...
//! #shader fragment
//! ...
//! ```
//!
//! Anything before the first marker is a preamble prepended to both stages.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

const MARKER: &str = "#shader";

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("unable to read shader file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown shader stage `{name}` on line {line}")]
    UnknownStage { name: String, line: usize },
    #[error("{stage} stage declared twice (again on line {line})")]
    DuplicateStage { stage: ShaderStage, line: usize },
    #[error("shader file has no {0} stage")]
    MissingStage(ShaderStage),
    #[error("{stage} shader failed to compile: {message}")]
    Compile { stage: ShaderStage, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("vertex") {
            Some(Self::Vertex)
        } else if name.eq_ignore_ascii_case("fragment") {
            Some(Self::Fragment)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// Source text for both stages, preamble already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ShaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ShaderError> {
        let mut preamble = String::new();
        let mut vertex: Option<String> = None;
        let mut fragment: Option<String> = None;
        let mut current: Option<ShaderStage> = None;

        for (line_no, line) in text.lines().enumerate() {
            if let Some(name) = marker_argument(line) {
                let stage = ShaderStage::from_name(name).ok_or_else(|| {
                    ShaderError::UnknownStage {
                        name: name.to_string(),
                        line: line_no + 1,
                    }
                })?;
                let slot = match stage {
                    ShaderStage::Vertex => &mut vertex,
                    ShaderStage::Fragment => &mut fragment,
                };
                if slot.is_some() {
                    return Err(ShaderError::DuplicateStage {
                        stage,
                        line: line_no + 1,
                    });
                }
                *slot = Some(String::new());
                current = Some(stage);
                continue;
            }

            let target = match current {
                None => &mut preamble,
                Some(ShaderStage::Vertex) => vertex.get_or_insert_with(String::new),
                Some(ShaderStage::Fragment) => fragment.get_or_insert_with(String::new),
            };
            target.push_str(line);
            target.push('\n');
        }

        let vertex = vertex.ok_or(ShaderError::MissingStage(ShaderStage::Vertex))?;
        let fragment = fragment.ok_or(ShaderError::MissingStage(ShaderStage::Fragment))?;
        Ok(Self {
            vertex: format!("{preamble}{vertex}"),
            fragment: format!("{preamble}{fragment}"),
        })
    }
}

/// Returns the stage name when `line` is a marker line. The marker itself is
/// matched case-insensitively.
fn marker_argument(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let (head, rest) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    head.eq_ignore_ascii_case(MARKER).then(|| rest.trim())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::uniforms::{MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS};

    const BUNDLED: &str = include_str!("../assets/shaders/basic.shader");

    #[test]
    fn splits_stages_and_shares_preamble() {
        let text = "struct Common { x: f32 }\n#shader vertex\nfn vs() {}\n#Shader Fragment\nfn fs() {}\n";
        let source = ShaderSource::parse(text).unwrap();
        assert_eq!(source.vertex, "struct Common { x: f32 }\nfn vs() {}\n");
        assert_eq!(source.fragment, "struct Common { x: f32 }\nfn fs() {}\n");
    }

    #[test]
    fn markers_ignore_case() {
        let source = ShaderSource::parse("#SHADER VERTEX\nV\n  #Shader Fragment\nF\n").unwrap();
        assert_eq!(source.vertex, "V\n");
        assert_eq!(source.fragment, "F\n");

        assert_eq!(marker_argument("#ShAdEr\tvertex "), Some("vertex"));
        assert_eq!(marker_argument("#shaders vertex"), None);
        assert_eq!(marker_argument("// #shader vertex"), None);
    }

    #[test]
    fn stage_order_does_not_matter() {
        let source = ShaderSource::parse("#shader fragment\nF\n#shader vertex\nV\n").unwrap();
        assert_eq!(source.vertex, "V\n");
        assert_eq!(source.fragment, "F\n");
    }

    #[test]
    fn reports_missing_stage() {
        let err = ShaderSource::parse("#shader vertex\nfn vs() {}\n").unwrap_err();
        assert!(matches!(err, ShaderError::MissingStage(ShaderStage::Fragment)));
        let err = ShaderSource::parse("no markers at all").unwrap_err();
        assert!(matches!(err, ShaderError::MissingStage(ShaderStage::Vertex)));
    }

    #[test]
    fn reports_duplicate_and_unknown_stages() {
        let err = ShaderSource::parse("#shader vertex\n#shader vertex\n").unwrap_err();
        assert!(matches!(
            err,
            ShaderError::DuplicateStage {
                stage: ShaderStage::Vertex,
                line: 2
            }
        ));

        let err = ShaderSource::parse("#shader vertex\n#shader geometry\n").unwrap_err();
        match err {
            ShaderError::UnknownStage { name, line } => {
                assert_eq!(name, "geometry");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"#shader vertex\nV\n#shader fragment\nF\n").unwrap();
        let source = ShaderSource::load(file.path()).unwrap();
        assert_eq!(source.vertex, "V\n");

        let err = ShaderSource::load(file.path().with_extension("missing")).unwrap_err();
        assert!(matches!(err, ShaderError::Io { .. }));
    }

    #[test]
    fn bundled_shader_matches_light_capacity() {
        let source = ShaderSource::parse(BUNDLED).unwrap();
        for stage in [&source.vertex, &source.fragment] {
            assert!(stage.contains("struct FrameUniform"));
            assert!(stage.contains(&format!("array<PointLight, {MAX_POINT_LIGHTS}>")));
            assert!(stage.contains(&format!("array<SpotLight, {MAX_SPOT_LIGHTS}>")));
        }
        assert!(source.vertex.contains("fn vs_main"));
        assert!(source.fragment.contains("fn fs_main"));
    }
}
