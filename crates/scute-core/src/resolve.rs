//! Plan resolution: matching provides against requires across a group.

use scute_schema::{BuildpackRef, DetectPlan, Plan, PlanEntry, Provide, Require};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::Write;

/// One passing group member together with its selectable plan blocks: the
/// primary provides/requires block first, then each alternative in
/// declaration order.
#[derive(Debug, Clone)]
pub(crate) struct Trial {
    pub buildpack: BuildpackRef,
    pub options: Vec<PlanBlock>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PlanBlock {
    pub provides: Vec<Provide>,
    pub requires: Vec<Require>,
}

impl Trial {
    pub fn new(buildpack: BuildpackRef, plan: DetectPlan) -> Self {
        let mut options = vec![PlanBlock {
            provides: plan.provides,
            requires: plan.requires,
        }];
        options.extend(plan.alternatives.into_iter().map(|alt| PlanBlock {
            provides: alt.provides,
            requires: alt.requires,
        }));
        Self { buildpack, options }
    }
}

/// Search for a block selection and member subset under which every require
/// is provided by an earlier (or the same) member and every provide is
/// consumed.
///
/// Selections are enumerated over the Cartesian product of block choices in
/// right-most-odometer order: all primaries first, then the last member's
/// alternatives vary fastest. Each numbered attempt makes a single forward
/// pass over the chosen blocks; an optional member whose require stays unmet
/// or whose provide stays unused is dropped from the attempt once its own
/// alternatives are exhausted, and the pass restarts on the reduced group.
/// Any other mismatch fails the attempt and advances the enumeration. The
/// first successful selection wins.
pub(crate) fn resolve(
    trials: &[Trial],
    out: &mut dyn Write,
) -> Option<(Vec<BuildpackRef>, Plan)> {
    let counts: Vec<usize> = trials.iter().map(|t| t.options.len()).collect();
    let total: usize = counts.iter().product();
    let mut selection = vec![0usize; trials.len()];

    for attempt in 1..=total {
        let _ = writeln!(out, "Resolving plan... (try #{attempt})");
        if let Some((group, plan)) = run_attempt(trials, &counts, &selection, out) {
            let _ = writeln!(out, "Success! ({})", group.len());
            return Some((group, plan));
        }
        for slot in (0..selection.len()).rev() {
            selection[slot] += 1;
            if selection[slot] < counts[slot] {
                break;
            }
            selection[slot] = 0;
        }
    }
    None
}

fn run_attempt(
    trials: &[Trial],
    counts: &[usize],
    selection: &[usize],
    out: &mut dyn Write,
) -> Option<(Vec<BuildpackRef>, Plan)> {
    let mut live: Vec<usize> = (0..trials.len()).collect();

    loop {
        if live.is_empty() {
            let _ = writeln!(out, "fail: no viable buildpacks in group");
            return None;
        }

        let deps = DepMap::build(trials, selection, &live);
        let mut demoted: Vec<usize> = Vec::new();

        for (name, owner) in deps.unmet_requires() {
            let bp = &trials[owner].buildpack;
            if bp.optional && selection[owner] + 1 == counts[owner] {
                let _ = writeln!(out, "skip: {bp} requires {name}");
                if !demoted.contains(&owner) {
                    demoted.push(owner);
                }
            } else {
                let _ = writeln!(out, "fail: {bp} requires {name}");
                return None;
            }
        }
        for (name, owner) in deps.unused_provides() {
            let bp = &trials[owner].buildpack;
            if bp.optional && selection[owner] + 1 == counts[owner] {
                let _ = writeln!(out, "skip: {bp} provides unused {name}");
                if !demoted.contains(&owner) {
                    demoted.push(owner);
                }
            } else {
                let _ = writeln!(out, "fail: {bp} provides unused {name}");
                return None;
            }
        }

        if demoted.is_empty() {
            let group = live.iter().map(|&i| trials[i].buildpack.clone()).collect();
            return Some((group, deps.into_plan(trials)));
        }
        live.retain(|i| !demoted.contains(i));
    }
}

#[derive(Debug, Default)]
struct DepEntry {
    /// Members whose provide has been consumed by at least one require.
    providers: Vec<usize>,
    /// Matched requires, in group order, duplicates preserved.
    requires: Vec<Require>,
    /// Members whose require arrived before any provide of this name.
    early_requires: Vec<usize>,
    /// Members whose provide has not been consumed yet.
    extra_provides: Vec<usize>,
}

/// Forward-pass bookkeeping over one block selection.
///
/// Provides are recorded before requires within each member, so a member's
/// own provide satisfies its own require. A provide satisfies every
/// subsequent require of the same name; requires seen before any provide of
/// their name stay unmet, and provides after the last require stay unused.
#[derive(Debug, Default)]
struct DepMap {
    names: Vec<String>,
    require_order: Vec<String>,
    entries: HashMap<String, DepEntry>,
}

impl DepMap {
    fn build(trials: &[Trial], selection: &[usize], live: &[usize]) -> Self {
        let mut map = Self::default();
        for &i in live {
            let block = &trials[i].options[selection[i]];
            for provide in &block.provides {
                map.provide(i, provide);
            }
            for require in &block.requires {
                map.require(i, require);
            }
        }
        map
    }

    fn touch(&mut self, name: &str) -> &mut DepEntry {
        match self.entries.entry(name.to_owned()) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                self.names.push(name.to_owned());
                vacant.insert(DepEntry::default())
            }
        }
    }

    fn provide(&mut self, owner: usize, provide: &Provide) {
        self.touch(&provide.name).extra_provides.push(owner);
    }

    fn require(&mut self, owner: usize, require: &Require) {
        let entry = self.touch(&require.name);
        let first_require = entry.requires.is_empty() && entry.early_requires.is_empty();
        let mut pending = std::mem::take(&mut entry.extra_provides);
        entry.providers.append(&mut pending);
        if entry.providers.is_empty() {
            entry.early_requires.push(owner);
        } else {
            entry.requires.push(require.clone());
        }
        if first_require {
            self.require_order.push(require.name.clone());
        }
    }

    /// Unmet requires in first-appearance order, one owner (the earliest)
    /// per name.
    fn unmet_requires(&self) -> Vec<(String, usize)> {
        self.names
            .iter()
            .filter_map(|name| {
                let entry = self.entries.get(name)?;
                let owner = entry.early_requires.first()?;
                Some((name.clone(), *owner))
            })
            .collect()
    }

    /// Unused provides in first-appearance order, one owner per name.
    fn unused_provides(&self) -> Vec<(String, usize)> {
        self.names
            .iter()
            .filter_map(|name| {
                let entry = self.entries.get(name)?;
                let owner = entry.extra_provides.first()?;
                Some((name.clone(), *owner))
            })
            .collect()
    }

    /// Consolidate into plan entries, ordered by first appearance of each
    /// name as a require.
    fn into_plan(mut self, trials: &[Trial]) -> Plan {
        let mut entries = Vec::new();
        for name in &self.require_order {
            let Some(entry) = self.entries.remove(name) else {
                continue;
            };
            if entry.requires.is_empty() {
                continue;
            }
            entries.push(PlanEntry {
                providers: entry
                    .providers
                    .iter()
                    .map(|&i| trials[i].buildpack.buildpack())
                    .collect(),
                requires: entry.requires,
            });
        }
        Plan { entries }
    }
}
