use serde::Serialize;

/// A name token found on a changed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    pub name: String,
    /// Zero-based column of the token's first character, in UTF-16 code
    /// units (the LSP default position encoding).
    pub character: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Addition,
    Deletion,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Addition => write!(f, "addition"),
            ChangeKind::Deletion => write!(f, "deletion"),
        }
    }
}

/// A single added or deleted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    /// Zero-based line in the new file for additions, the old file for
    /// deletions.
    pub line: usize,
    /// Line content without the diff marker or trailing whitespace.
    pub text: String,
    pub kind: ChangeKind,
    pub identifiers: Vec<Identifier>,
}

/// The changes under one `@@` header, in patch order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    pub old_file: Option<String>,
    pub new_file: Option<String>,
    pub changes: Vec<Change>,
}

impl Hunk {
    pub fn additions(&self) -> usize {
        self.count(ChangeKind::Addition)
    }

    pub fn deletions(&self) -> usize {
        self.count(ChangeKind::Deletion)
    }

    fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }

    /// File a change of `kind` is addressed in.
    pub fn file_for(&self, kind: ChangeKind) -> Option<&str> {
        match kind {
            ChangeKind::Addition => self.new_file.as_deref(),
            ChangeKind::Deletion => self.old_file.as_deref(),
        }
    }

    /// Flatten into the `(path, line, character)` positions a language
    /// server can answer definition and reference lookups for.
    pub fn lookup_targets(&self) -> Vec<LookupTarget> {
        self.changes
            .iter()
            .filter_map(|change| Some((self.file_for(change.kind)?, change)))
            .flat_map(|(path, change)| {
                change.identifiers.iter().map(move |identifier| LookupTarget {
                    path: path.to_string(),
                    line: change.line,
                    character: identifier.character,
                    name: identifier.name.clone(),
                    kind: change.kind,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupTarget {
    pub path: String,
    pub line: usize,
    pub character: usize,
    pub name: String,
    pub kind: ChangeKind,
}

/// The digest of one patch input.
#[derive(Debug, Clone, Serialize)]
pub struct PatchDigest {
    pub source: String,
    #[serde(rename = "digest")]
    pub hunks: Vec<Hunk>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifier(name: &str, character: usize) -> Identifier {
        Identifier {
            name: name.to_string(),
            character,
        }
    }

    fn sample_hunk() -> Hunk {
        Hunk {
            old_file: Some("a.py".to_string()),
            new_file: None,
            changes: vec![
                Change {
                    line: 3,
                    text: "x = y".to_string(),
                    kind: ChangeKind::Deletion,
                    identifiers: vec![identifier("x", 0), identifier("y", 4)],
                },
                Change {
                    line: 3,
                    text: "z".to_string(),
                    kind: ChangeKind::Addition,
                    identifiers: vec![identifier("z", 0)],
                },
            ],
        }
    }

    #[test]
    fn test_change_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ChangeKind::Addition).unwrap(), "\"addition\"");
        assert_eq!(ChangeKind::Deletion.to_string(), "deletion");
    }

    #[test]
    fn test_hunk_json_shape() {
        let value = serde_json::to_value(sample_hunk()).unwrap();
        assert_eq!(value["old_file"], "a.py");
        assert!(value["new_file"].is_null());
        assert_eq!(value["changes"][0]["kind"], "deletion");
        assert_eq!(value["changes"][0]["identifiers"][1]["name"], "y");
        assert_eq!(value["changes"][0]["identifiers"][1]["character"], 4);
    }

    #[test]
    fn test_counts() {
        let hunk = sample_hunk();
        assert_eq!(hunk.additions(), 1);
        assert_eq!(hunk.deletions(), 1);
    }

    #[test]
    fn test_lookup_targets_skip_missing_side() {
        let targets = sample_hunk().lookup_targets();
        assert_eq!(targets.len(), 2);
        assert!(targets.iter().all(|t| t.path == "a.py" && t.kind == ChangeKind::Deletion));
        assert_eq!(targets[1].character, 4);
        assert_eq!(targets[1].line, 3);
    }

    #[test]
    fn test_patch_digest_field_name() {
        let digest = PatchDigest {
            source: "<stdin>".to_string(),
            hunks: vec![],
        };
        let value = serde_json::to_value(digest).unwrap();
        assert!(value["digest"].as_array().unwrap().is_empty());
    }
}
