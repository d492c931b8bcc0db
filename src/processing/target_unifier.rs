//! # Target unification
//!
//! Builds the single OI_TARGET table of the output from the distinct selected targets and fills
//! the per-file `old TARGET_ID → new TARGET_ID` tables.
//!
//! New identifiers are dense: the `k`-th selected target (0-based) gets `k + 1`. In every input
//! directory, **all** local identifiers denoting a selected target map to its new identifier,
//! so a source duplicated under several rows collapses to one output row. Identifiers denoting
//! no selected target are left out; they become extras when the row filter meets them.

use tracing::debug;

use crate::{
    collection::{FileId, TargetKey, TargetResolver},
    constants::TargetId,
    model::{OIFitsStandard, OITarget},
    oimerge_errors::MergeError,
};

use super::id_remapper::IdRemapper;

/// Build the output OI_TARGET table and register every selected target in `remapper`.
///
/// Arguments
/// -----------------
/// * `resolver`: target identity resolver of the collection.
/// * `targets`: distinct selected targets, in selection order.
/// * `directories`: the OI_TARGET table of every file owning selected data, keyed by file.
/// * `version`: revision of the output (CATEGORY only exists in OIFITS v2).
/// * `remapper`: per-file identifier mapping, one scope per entry of `directories`.
///
/// Return
/// ----------
/// * The output OI_TARGET table, or [`MergeError::InvalidInput`] if a key is unknown to the
///   resolver or the selection holds more targets than TARGET_ID can number.
pub fn unify_targets<R>(
    resolver: &R,
    targets: &[TargetKey],
    directories: &[(FileId, &OITarget)],
    version: OIFitsStandard,
    remapper: &mut IdRemapper<FileId, TargetId>,
) -> Result<OITarget, MergeError>
where
    R: TargetResolver + ?Sized,
{
    let mut oi_target = OITarget::with_capacity(targets.len());

    for (idx, key) in targets.iter().enumerate() {
        let new_id = TargetId::try_from(idx + 1).map_err(|_| {
            MergeError::InvalidInput(format!(
                "{} targets selected, TARGET_ID cannot number them",
                targets.len()
            ))
        })?;
        let mut target = resolver
            .target(*key)
            .ok_or_else(|| {
                MergeError::InvalidInput(format!("unknown target key #{}", key.index()))
            })?
            .clone();
        if version == OIFitsStandard::Version1 {
            target.category = None;
        }
        oi_target.push(new_id, target);
    }

    for (file, directory) in directories {
        remapper.open_scope(*file);

        for (idx, key) in targets.iter().enumerate() {
            let new_id = oi_target.entries()[idx].target_id;
            for old_id in resolver.target_ids(directory, *key) {
                remapper.insert(*file, old_id, new_id);
            }
        }
        debug!(
            "file #{}: {} target ids mapped",
            file.index(),
            remapper.scope_len(*file)
        );
    }

    Ok(oi_target)
}
