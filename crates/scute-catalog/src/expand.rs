//! Meta-buildpack order expansion.

use crate::catalog::{Catalog, Descriptor};
use crate::CatalogError;
use scute_schema::{BuildpackRef, Group};

/// Expand one declared group into leaf member sequences.
///
/// Every member contributes a list of variants: a leaf buildpack is its own
/// single variant, a meta-buildpack contributes one variant per leaf group of
/// its (recursively expanded) nested order. The result is the Cartesian
/// product of member variants, preserving member order; a meta-buildpack
/// whose expansion is empty therefore eliminates every candidate.
///
/// `stack` tracks the meta-buildpacks currently being expanded so that a
/// nested order referencing an ancestor fails instead of recursing forever.
pub(crate) fn expand_group(
    catalog: &Catalog,
    group: &Group,
    stack: &mut Vec<(String, String)>,
) -> Result<Vec<Vec<BuildpackRef>>, CatalogError> {
    let mut leaves: Vec<Vec<BuildpackRef>> = vec![Vec::new()];

    for member in &group.group {
        let variants = match catalog.lookup(member)? {
            Descriptor::Leaf(_) => vec![vec![member.clone()]],
            Descriptor::Meta(meta) => {
                let frame = (member.id.clone(), member.version.clone());
                if stack.contains(&frame) {
                    return Err(CatalogError::OrderCycle(member.buildpack()));
                }
                stack.push(frame);
                let mut expanded = Vec::new();
                for nested in &meta.order {
                    expanded.extend(expand_group(catalog, nested, stack)?);
                }
                stack.pop();
                expanded
            }
        };

        let mut next = Vec::with_capacity(leaves.len() * variants.len());
        for prefix in &leaves {
            for variant in &variants {
                let mut candidate = prefix.clone();
                candidate.extend(variant.iter().cloned());
                next.push(candidate);
            }
        }
        leaves = next;
    }

    Ok(leaves)
}
