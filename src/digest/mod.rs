pub mod types;

pub use types::{Change, ChangeKind, Hunk, Identifier, LookupTarget, PatchDigest};

use thiserror::Error;
use tracing::{debug, info, info_span, instrument};

use crate::diff::{self, DiffError, NodeKind};
use crate::identifiers::extract_identifiers;
use crate::language::{diff_parser, get_language_parser, Language, LanguageError};

#[derive(Debug, Error)]
pub enum DigestError {
    #[error(transparent)]
    Language(#[from] LanguageError),

    #[error("Malformed diff in hunk {hunk}: {reason}")]
    MalformedDiff { hunk: String, reason: String },

    #[error("Failed to digest {name}: {error}")]
    Patch {
        name: String,
        #[source]
        error: Box<DigestError>,
    },

    #[error("Digest task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl DigestError {
    /// True for failures caused by the request itself (unknown language,
    /// malformed patch) rather than by this process.
    pub fn is_client_error(&self) -> bool {
        match self {
            DigestError::Language(LanguageError::Unsupported(_)) => true,
            DigestError::MalformedDiff { .. } => true,
            DigestError::Patch { error, .. } => error.is_client_error(),
            DigestError::Language(LanguageError::Grammar { .. }) | DigestError::Task(_) => false,
        }
    }
}

/// Digest a patch, identifying changed-line tokens with the grammar named by
/// `source_language` (e.g. "Python").
pub fn parse_diff_patch(patch: &[u8], source_language: &str) -> Result<Vec<Hunk>, DigestError> {
    let language = source_language.parse::<Language>()?;
    digest_patch(patch, language)
}

/// Digest a patch into hunks in block order, then hunk order.
///
/// Fails on the first hunk whose header cannot be indexed; no hunk is ever
/// returned with guessed line numbers.
#[instrument(skip(patch), fields(patch_bytes = patch.len()))]
pub fn digest_patch(patch: &[u8], language: Language) -> Result<Vec<Hunk>, DigestError> {
    let mut parser = diff_parser();
    let mut source_parser = get_language_parser(language)?;

    let tree = parser.parse(patch);
    let mut hunks = Vec::new();

    for block in diff::select(tree.root_node(), NodeKind::Block) {
        let old_file = diff::block_file(&tree, block, NodeKind::OldFile);
        let new_file = diff::block_file(&tree, block, NodeKind::NewFile);
        let hunk_nodes = diff::select(block, NodeKind::Hunk);
        debug!(?old_file, ?new_file, hunks = hunk_nodes.len(), "digesting block");

        for hunk_node in hunk_nodes {
            let lines = diff::reindex_hunk(&tree, hunk_node).map_err(|e| match e {
                DiffError::MalformedHunk { header, reason } => DigestError::MalformedDiff {
                    hunk: format!(
                        "#{} `{}` of {}",
                        hunks.len() + 1,
                        header,
                        new_file.as_deref().or(old_file.as_deref()).unwrap_or("<unnamed file>")
                    ),
                    reason,
                },
            })?;

            let changes = lines
                .into_iter()
                .map(|line| Change {
                    identifiers: extract_identifiers(&mut source_parser, &line.text),
                    line: line.line,
                    text: line.text,
                    kind: line.kind,
                })
                .collect();

            hunks.push(Hunk {
                old_file: old_file.clone(),
                new_file: new_file.clone(),
                changes,
            });
        }
    }

    debug!(hunks = hunks.len(), "digested patch");
    Ok(hunks)
}

/// A named patch waiting to be digested.
#[derive(Debug, Clone)]
pub struct PatchInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Digest several patches concurrently, returning digests in input order.
///
/// Each task builds its own parsers, so nothing is shared between tasks.
#[instrument(skip(inputs), fields(patches = inputs.len()))]
pub async fn digest_all(
    inputs: Vec<PatchInput>,
    language: Language,
) -> Result<Vec<PatchDigest>, DigestError> {
    let handles: Vec<_> = inputs
        .into_iter()
        .map(|input| {
            let span = info_span!("digest", patch = %input.name);
            tokio::task::spawn_blocking(move || {
                let _entered = span.entered();
                match digest_patch(&input.bytes, language) {
                    Ok(hunks) => Ok(PatchDigest {
                        source: input.name,
                        hunks,
                    }),
                    Err(error) => Err(DigestError::Patch {
                        name: input.name,
                        error: Box::new(error),
                    }),
                }
            })
        })
        .collect();

    let mut digests = Vec::with_capacity(handles.len());
    for handle in handles {
        digests.push(handle.await??);
    }
    info!(patches = digests.len(), "digest complete");
    Ok(digests)
}
