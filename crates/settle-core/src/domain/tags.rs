//! Resource tags.
//!
//! `tags_all` is the provider's default tags overlaid with the resource's own
//! tags; on key collision the resource wins.

use std::collections::BTreeMap;

pub type Tags = BTreeMap<String, String>;

pub fn merge_tags(defaults: &Tags, resource: &Tags) -> Tags {
    let mut all = defaults.clone();
    for (k, v) in resource {
        all.insert(k.clone(), v.clone());
    }
    all
}
