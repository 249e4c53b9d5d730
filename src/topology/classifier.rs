//! Pure classification of raw cloud zone identifiers.

use crate::error::TopologyError;
use crate::types::TopologyLabel;

/// Regions that were renamed after early clusters had already recorded
/// their datacenter labels. Clusters upgraded over time keep the old
/// canonical name so replica placement stays consistent. This is a fixed,
/// explicit lookup; nothing is inferred from the region string.
const LEGACY_REGION_NAMES: &[(&str, &str)] = &[
    ("ap-southeast-1", "ap-southeast"),
    ("ap-northeast-1", "ap-northeast"),
    ("eu-west-1", "eu-west"),
];

/// Classify a raw availability-zone string into a (datacenter, rack) label.
///
/// The zone is split into a region part and a trailing alphabetic sub-zone
/// suffix: `us-east-1a` yields datacenter `us-east-1` and rack `a`. Regions
/// on the legacy rename list map to their old canonical name instead.
///
/// Pure: no I/O, deterministic for a given input.
pub fn classify(raw_zone: &str) -> Result<TopologyLabel, TopologyError> {
    let zone = raw_zone.trim();

    let suffix_start = zone
        .rfind(|c: char| !c.is_ascii_lowercase())
        .map(|i| i + 1)
        .unwrap_or(0);
    let (region, rack) = zone.split_at(suffix_start);

    // A region always carries at least one dash and ends in its ordinal.
    if rack.is_empty()
        || region.is_empty()
        || !region.contains('-')
        || !region.ends_with(|c: char| c.is_ascii_digit())
    {
        return Err(TopologyError::MalformedZone(raw_zone.to_string()));
    }

    let datacenter = LEGACY_REGION_NAMES
        .iter()
        .find(|(new, _)| *new == region)
        .map(|(_, legacy)| *legacy)
        .unwrap_or(region);

    Ok(TopologyLabel::new(datacenter, rack))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_standard_zone() {
        let label = classify("us-east-1a").unwrap();
        assert_eq!(label, TopologyLabel::new("us-east-1", "a"));
    }

    #[test]
    fn test_classify_is_deterministic() {
        let a = classify("us-west-2b").unwrap();
        let b = classify("us-west-2b").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_region_different_racks() {
        let a = classify("us-east-1a").unwrap();
        let b = classify("us-east-1b").unwrap();
        assert_eq!(a.datacenter, b.datacenter);
        assert_eq!(a.rack, "a");
        assert_eq!(b.rack, "b");
    }

    #[test]
    fn test_legacy_region_maps_to_old_name() {
        let label = classify("ap-southeast-1a").unwrap();
        assert_eq!(label, TopologyLabel::new("ap-southeast", "a"));

        let label = classify("eu-west-1c").unwrap();
        assert_eq!(label, TopologyLabel::new("eu-west", "c"));
    }

    #[test]
    fn test_multi_letter_suffix_is_rack_verbatim() {
        let label = classify("us-west-2ab").unwrap();
        assert_eq!(label, TopologyLabel::new("us-west-2", "ab"));
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let label = classify("us-east-1a\n").unwrap();
        assert_eq!(label, TopologyLabel::new("us-east-1", "a"));
    }

    #[test]
    fn test_malformed_zones_rejected() {
        for zone in ["", "us-east-1", "useast1a", "a", "us-east-", "1a"] {
            assert!(
                matches!(classify(zone), Err(TopologyError::MalformedZone(_))),
                "expected {zone:?} to be rejected"
            );
        }
    }
}
