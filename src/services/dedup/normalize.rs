//! Free-text region/city normalization

use std::collections::HashMap;

use crate::defaults::DEFAULT_REGION_ALIASES;
use crate::types::{GeoRecord, NormalizationEdit};

/// Lookup table from spelling variants to a canonical place name.
/// Keys are matched lower-cased and trimmed.
#[derive(Debug, Clone)]
pub struct AliasDictionary {
    aliases: HashMap<String, String>,
}

impl Default for AliasDictionary {
    fn default() -> Self {
        Self::new(DEFAULT_REGION_ALIASES.iter().copied())
    }
}

impl AliasDictionary {
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let aliases = entries
            .into_iter()
            .map(|(k, v)| (normalize_key(k.as_ref()), v.into()))
            .collect();
        Self { aliases }
    }

    pub fn empty() -> Self {
        Self {
            aliases: HashMap::new(),
        }
    }

    pub fn insert(&mut self, alias: &str, canonical: impl Into<String>) {
        self.aliases.insert(normalize_key(alias), canonical.into());
    }

    /// Canonical name for `raw`, if it is a known alias
    pub fn lookup(&self, raw: &str) -> Option<&str> {
        self.aliases.get(&normalize_key(raw)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Rewrite `value` to its canonical form, recording the change
fn normalize_field(
    record_id: &str,
    field: &str,
    value: &mut Option<String>,
    aliases: &AliasDictionary,
    edits: &mut Vec<NormalizationEdit>,
) -> bool {
    let Some(old) = value.as_deref() else {
        return false;
    };
    let Some(canonical) = aliases.lookup(old) else {
        return false;
    };
    if canonical == old {
        return false;
    }

    edits.push(NormalizationEdit {
        record_id: record_id.to_string(),
        field: field.to_string(),
        old_value: old.to_string(),
        new_value: canonical.to_string(),
    });
    *value = Some(canonical.to_string());
    true
}

/// Normalize region and city of every record in place.
///
/// Returns the edits and the number of records that changed.
pub fn normalize_records(records: &mut [GeoRecord], aliases: &AliasDictionary) -> (Vec<NormalizationEdit>, usize) {
    let mut edits = Vec::new();
    let mut normalized = 0;

    for record in records.iter_mut() {
        let region_changed = normalize_field(
            &record.id,
            "regionDescription",
            &mut record.region_description,
            aliases,
            &mut edits,
        );
        let city_changed = normalize_field(&record.id, "city", &mut record.city, aliases, &mut edits);
        if region_changed || city_changed {
            normalized += 1;
        }
    }

    (edits, normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_region(id: &str, region: &str) -> GeoRecord {
        GeoRecord::new(id, "Shop", 21.5, 39.2).with_region(region)
    }

    #[test]
    fn test_lookup_is_case_and_space_insensitive() {
        let aliases = AliasDictionary::default();
        assert_eq!(aliases.lookup("  JEDDA "), Some("Jeddah"));
        assert_eq!(aliases.lookup("Jeddah Consumer"), Some("Jeddah"));
        assert_eq!(aliases.lookup("Atlantis"), None);
    }

    #[test]
    fn test_region_alias_produces_one_edit() {
        let mut records = vec![with_region("r1", "jeddah consumer")];
        let (edits, normalized) = normalize_records(&mut records, &AliasDictionary::default());

        assert_eq!(normalized, 1);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].record_id, "r1");
        assert_eq!(edits[0].field, "regionDescription");
        assert_eq!(edits[0].old_value, "jeddah consumer");
        assert_eq!(edits[0].new_value, "Jeddah");
        assert_eq!(records[0].region_description.as_deref(), Some("Jeddah"));
    }

    #[test]
    fn test_canonical_value_is_not_an_edit() {
        let mut records = vec![with_region("r1", "Jeddah"), with_region("r2", "Unknown Town")];
        let (edits, normalized) = normalize_records(&mut records, &AliasDictionary::default());

        assert!(edits.is_empty());
        assert_eq!(normalized, 0);
    }

    #[test]
    fn test_region_and_city_count_record_once() {
        let mut record = with_region("r1", "riyad");
        record.city = Some("ar riyadh".into());
        let mut records = vec![record];

        let (edits, normalized) = normalize_records(&mut records, &AliasDictionary::default());
        assert_eq!(edits.len(), 2);
        assert_eq!(normalized, 1);
        assert_eq!(records[0].city.as_deref(), Some("Riyadh"));
    }

    #[test]
    fn test_custom_dictionary() {
        let mut aliases = AliasDictionary::empty();
        aliases.insert("Praha ", "Prague");
        assert_eq!(aliases.len(), 1);

        let mut records = vec![with_region("r1", "praha")];
        let (edits, _) = normalize_records(&mut records, &aliases);
        assert_eq!(edits[0].new_value, "Prague");
    }
}
