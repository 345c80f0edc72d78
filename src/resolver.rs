//! Location normalization resolver.
//!
//! Takes raw coordinates or a free-text address query and derives a single
//! canonical area name at the most specific stable granularity available,
//! so that inconsistent inputs ("Sangotedo", "Sangotedo, Ajah",
//! "sangotedo lagos") all land on the same bucket name.
//!
//! The granularity priority order is a fixed contract, not re-derived per
//! call site: neighborhood-level types first, locality-level types as
//! fallback, the formatted address as last resort.

use std::sync::Arc;

use crate::geocode::{AddressCandidate, GeocodeError, Geocoder};

/// Address-component types tried first, in strict priority order. The
/// first type here that matches any component of the top candidate wins.
const PRIMARY_TYPES: [&str; 3] = ["neighborhood", "sublocality_level_1", "sublocality"];

/// Coarser fallback types, tried only when no primary type matches.
const FALLBACK_TYPES: [&str; 2] = ["locality", "administrative_area_level_2"];

/// Input to a resolution: either a coordinate pair (create path) or a
/// free-text location query (search path).
#[derive(Debug, Clone)]
pub enum ResolveInput {
    Coordinates { lat: f64, lng: f64 },
    Text(String),
}

/// A successful resolution: the canonical display name and the oracle's
/// stable external id for the resolving candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArea {
    pub name: String,
    pub place_id: String,
}

/// Resolves locations to canonical area names via an injected oracle.
pub struct Resolver {
    geocoder: Arc<dyn Geocoder>,
}

impl Resolver {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Resolve an input to `(canonical_name, place_id)`.
    ///
    /// Returns `Ok(None)` when the oracle has no candidate for the input
    /// ("no match" — a valid outcome, distinct from oracle failure).
    ///
    /// For a fixed oracle response this is deterministic: the first
    /// candidate is taken (the oracle's own ranking is trusted) and name
    /// selection is a pure function of that candidate.
    pub async fn resolve(&self, input: ResolveInput) -> Result<Option<ResolvedArea>, GeocodeError> {
        let candidates = match input {
            ResolveInput::Coordinates { lat, lng } => {
                self.geocoder.reverse_geocode(lat, lng).await?
            }
            ResolveInput::Text(query) => self.geocoder.geocode(&query).await?,
        };

        let Some(candidate) = candidates.first() else {
            return Ok(None);
        };

        Ok(Some(ResolvedArea {
            name: canonical_name(candidate),
            place_id: candidate.place_id.clone(),
        }))
    }
}

/// Pick the canonical name for a candidate.
///
/// Scans the candidate's components against [`PRIMARY_TYPES`] in priority
/// order, then [`FALLBACK_TYPES`]; ties among components matching the same
/// type resolve to the first component in the candidate's sequence. When
/// nothing matches, the formatted address is returned verbatim. Case is
/// preserved as given by the oracle.
pub fn canonical_name(candidate: &AddressCandidate) -> String {
    for tier in [&PRIMARY_TYPES[..], &FALLBACK_TYPES[..]] {
        for wanted in tier.iter().copied() {
            if let Some(component) = candidate
                .components
                .iter()
                .find(|c| c.types.iter().any(|t| t.as_str() == wanted))
            {
                return component.long_name.clone();
            }
        }
    }

    candidate.formatted_address.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::AddressComponent;

    fn component(name: &str, types: &[&str]) -> AddressComponent {
        AddressComponent {
            long_name: name.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn candidate(components: Vec<AddressComponent>, formatted: &str) -> AddressCandidate {
        AddressCandidate {
            components,
            formatted_address: formatted.to_string(),
            place_id: "place-1".to_string(),
        }
    }

    #[test]
    fn neighborhood_beats_locality() {
        let c = candidate(
            vec![
                component("Lagos", &["locality", "political"]),
                component("Sangotedo", &["neighborhood", "political"]),
            ],
            "Sangotedo, Ajah, Lagos, Nigeria",
        );
        assert_eq!(canonical_name(&c), "Sangotedo");
    }

    #[test]
    fn sublocality_level_1_beats_plain_sublocality() {
        let c = candidate(
            vec![
                component("Eti-Osa", &["sublocality", "political"]),
                component("Ajah", &["sublocality_level_1", "political"]),
            ],
            "Ajah, Lagos, Nigeria",
        );
        assert_eq!(canonical_name(&c), "Ajah");
    }

    #[test]
    fn same_priority_tie_takes_first_component_in_sequence() {
        let c = candidate(
            vec![
                component("First", &["neighborhood"]),
                component("Second", &["neighborhood"]),
            ],
            "somewhere",
        );
        assert_eq!(canonical_name(&c), "First");
    }

    #[test]
    fn locality_fallback_when_no_neighborhood_granularity() {
        let c = candidate(
            vec![
                component("Nigeria", &["country", "political"]),
                component("Lagos", &["locality", "political"]),
            ],
            "Lagos, Nigeria",
        );
        assert_eq!(canonical_name(&c), "Lagos");
    }

    #[test]
    fn admin_area_fallback_after_locality() {
        let c = candidate(
            vec![
                component("Eti-Osa", &["administrative_area_level_2", "political"]),
                component("Lagos State", &["administrative_area_level_1", "political"]),
            ],
            "Eti-Osa, Nigeria",
        );
        assert_eq!(canonical_name(&c), "Eti-Osa");
    }

    #[test]
    fn formatted_address_when_nothing_matches() {
        let c = candidate(
            vec![component("Nigeria", &["country", "political"])],
            "6°28'11.3\"N 3°37'42.6\"E, Nigeria",
        );
        assert_eq!(canonical_name(&c), "6°28'11.3\"N 3°37'42.6\"E, Nigeria");
    }

    #[test]
    fn name_case_is_preserved() {
        let c = candidate(
            vec![component("SANGOTEDO", &["neighborhood"])],
            "formatted",
        );
        assert_eq!(canonical_name(&c), "SANGOTEDO");
    }

    #[test]
    fn selection_is_deterministic() {
        let c = candidate(
            vec![
                component("Lagos", &["locality"]),
                component("Sangotedo", &["neighborhood"]),
                component("Ajah", &["sublocality_level_1"]),
            ],
            "Sangotedo, Ajah, Lagos, Nigeria",
        );
        let first = canonical_name(&c);
        let second = canonical_name(&c);
        assert_eq!(first, second);
        assert_eq!(first, "Sangotedo");
    }
}
