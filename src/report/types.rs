use crate::digest::{LookupTarget, PatchDigest};

/// Digests of every input plus the totals shown in summaries.
#[derive(Debug)]
pub struct Report {
    pub patches: Vec<PatchDigest>,
    /// Hunks across all patches
    pub hunks: usize,
    /// Added lines across all patches
    pub additions: usize,
    /// Deleted lines across all patches
    pub deletions: usize,
    /// Identifiers found on changed lines
    pub identifiers: usize,
}

impl Report {
    pub fn lookup_targets(&self) -> Vec<LookupTarget> {
        self.patches
            .iter()
            .flat_map(|patch| patch.hunks.iter())
            .flat_map(|hunk| hunk.lookup_targets())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{Change, ChangeKind, Hunk, Identifier};

    #[test]
    fn test_lookup_targets_across_patches() {
        let hunk = Hunk {
            old_file: Some("a.py".to_string()),
            new_file: Some("a.py".to_string()),
            changes: vec![Change {
                line: 0,
                text: "run(job)".to_string(),
                kind: ChangeKind::Addition,
                identifiers: vec![
                    Identifier { name: "run".to_string(), character: 0 },
                    Identifier { name: "job".to_string(), character: 4 },
                ],
            }],
        };
        let report = Report {
            patches: vec![
                PatchDigest { source: "one".to_string(), hunks: vec![hunk.clone()] },
                PatchDigest { source: "two".to_string(), hunks: vec![hunk] },
            ],
            hunks: 2,
            additions: 2,
            deletions: 0,
            identifiers: 4,
        };
        let names: Vec<String> = report.lookup_targets().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["run", "job", "run", "job"]);
    }
}
