//! Alias groups of struct fields.
//!
//! serde lists a field's aliases in the same flat table as every other field
//! name, so which names belong together only shows when two of them reach the
//! visitor and it reports a duplicate. Each collision is recorded once per
//! struct, and [`Decoder::decode`](crate::Decoder::decode) retries the attempt
//! it broke.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{OnceLock, PoisonError, RwLock};

use tracing::debug;

type StructKey = (&'static str, &'static [&'static str]);

#[derive(Debug, Default)]
struct Groups {
    /// Alias to the field name it stands for.
    fields: HashMap<&'static str, &'static str>,
    /// Absent field names to offer ahead of the present ones, so that the
    /// next collision names the alias.
    early: HashSet<&'static str>,
}

impl Groups {
    fn field_of(&self, name: &'static str) -> &'static str {
        self.fields.get(name).copied().unwrap_or(name)
    }
}

static LEARNED: OnceLock<RwLock<HashMap<StructKey, Groups>>> = OnceLock::new();
static GENERATION: AtomicUsize = AtomicUsize::new(0);

fn learned() -> &'static RwLock<HashMap<StructKey, Groups>> {
    LEARNED.get_or_init(Default::default)
}

/// Bumped whenever something new is recorded.
pub(crate) fn generation() -> usize {
    GENERATION.load(Ordering::Acquire)
}

/// The names to offer a struct visitor: every present name, plus one absent
/// name for each field no present name covers.
pub(crate) fn struct_keys(
    name: &'static str,
    fields: &'static [&'static str],
    is_present: impl Fn(&str) -> bool,
) -> Vec<String> {
    let table = learned().read().unwrap_or_else(PoisonError::into_inner);
    let empty = Groups::default();
    let groups = table.get(&(name, fields)).unwrap_or(&empty);

    let (present, absent): (Vec<&'static str>, Vec<&'static str>) =
        fields.iter().copied().partition(|field| is_present(field));
    let mut covered: HashSet<&'static str> =
        present.iter().map(|field| groups.field_of(*field)).collect();
    let (early, late): (Vec<&'static str>, Vec<&'static str>) = absent
        .into_iter()
        .filter(|field| covered.insert(groups.field_of(*field)))
        .partition(|field| groups.early.contains(field));

    early
        .into_iter()
        .chain(present)
        .chain(late)
        .map(str::to_string)
        .collect()
}

/// Record what a duplicate of `primary`, reported right after `stopped`,
/// says about the struct's fields.
///
/// Two present names colliding is a real duplicate in the input and teaches
/// nothing.
pub(crate) fn learn(
    name: &'static str,
    fields: &'static [&'static str],
    stopped: &str,
    primary: &'static str,
    is_present: impl Fn(&str) -> bool,
) {
    let Some(stopped) = fields.iter().copied().find(|field| *field == stopped) else {
        return;
    };
    if is_present(stopped) && is_present(primary) {
        return;
    }

    let mut table = learned().write().unwrap_or_else(PoisonError::into_inner);
    let groups = table.entry((name, fields)).or_default();
    let recorded = if stopped != primary {
        groups.fields.insert(stopped, primary).is_none()
    } else {
        // A present alias came first; offering `primary` ahead of it makes
        // the next attempt report that alias.
        groups.early.insert(primary)
    };
    if recorded {
        GENERATION.fetch_add(1, Ordering::AcqRel);
        debug!(struct_name = name, stopped, primary, "learned field alias");
    }
}
