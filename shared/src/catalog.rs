use std::collections::BTreeMap;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// One named collection of markers: icon identifier → entry.
/// The identifier doubles as the icon image name (`/icons/<identifier>.png`).
/// BTreeMap so draw order within a group is deterministic.
pub type IconGroup = BTreeMap<String, IconEntry>;

/// A single map's dataset. Immutable once parsed from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    /// Per-map scalar converting in-game coordinate units to texture pixels.
    #[serde(rename = "sizeFactor")]
    pub size_factor: f64,
    /// Background authored at half the standard pixel density.
    #[serde(rename = "isSmallMap", default)]
    pub is_small_map: bool,
    #[serde(default)]
    pub icons: Vec<IconGroup>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IconEntry {
    #[serde(default, deserialize_with = "lenient_locations")]
    pub locations: Vec<GameCoordinate>,
}

/// In-game map coordinate, 1-based: (1, 1) is the projection origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameCoordinate {
    pub x: f64,
    pub y: f64,
}

/// Hand-authored catalogs carry `locations` as anything from a proper array
/// to a bare object or nothing at all. Anything that is not an array of
/// coordinates collapses to "no markers" instead of failing the whole parse,
/// and malformed entries inside an otherwise valid array are dropped.
fn lenient_locations<'de, D>(deserializer: D) -> Result<Vec<GameCoordinate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// The full map catalog: map key → definition, read-only after load.
///
/// Key order matters (startup falls back to the first key when no valid
/// preference is stored), so entries live in a Vec in data-source order
/// rather than a hash map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapCatalog {
    entries: Vec<(String, MapDefinition)>,
}

impl MapCatalog {
    pub fn get(&self, key: &str) -> Option<&MapDefinition> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, def)| def)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn first_key(&self) -> Option<&str> {
        self.entries.first().map(|(k, _)| k.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MapDefinition)> {
        self.entries.iter().map(|(k, def)| (k.as_str(), def))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, MapDefinition)> for MapCatalog {
    fn from_iter<I: IntoIterator<Item = (String, MapDefinition)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'de> Deserialize<'de> for MapCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = MapCatalog;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of map keys to map definitions")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, def)) = access.next_entry::<String, MapDefinition>()? {
                    entries.push((key, def));
                }
                Ok(MapCatalog { entries })
            }
        }

        deserializer.deserialize_map(CatalogVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> MapCatalog {
        serde_json::from_str(json).expect("catalog should parse")
    }

    #[test]
    fn parses_catalog_and_preserves_key_order() {
        let catalog = parse(
            r#"{
                "Zone3": { "sizeFactor": 50 },
                "Zone1": { "sizeFactor": 100, "isSmallMap": false,
                           "icons": [{ "Chest": { "locations": [{"x": 1, "y": 1}] } }] },
                "Zone2": { "sizeFactor": 75, "isSmallMap": true }
            }"#,
        );

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.first_key(), Some("Zone3"));
        assert_eq!(
            catalog.keys().collect::<Vec<_>>(),
            vec!["Zone3", "Zone1", "Zone2"]
        );

        let zone1 = catalog.get("Zone1").expect("Zone1 present");
        assert_eq!(zone1.size_factor, 100.0);
        assert!(!zone1.is_small_map);
        assert_eq!(zone1.icons.len(), 1);
        let chest = &zone1.icons[0]["Chest"];
        assert_eq!(chest.locations, vec![GameCoordinate { x: 1.0, y: 1.0 }]);

        assert!(catalog.get("Zone2").expect("Zone2 present").is_small_map);
        assert!(catalog.get("Nowhere").is_none());
    }

    #[test]
    fn missing_optional_fields_default() {
        let catalog = parse(r#"{ "Bare": { "sizeFactor": 10 } }"#);
        let def = catalog.get("Bare").unwrap();
        assert!(!def.is_small_map);
        assert!(def.icons.is_empty());
    }

    #[test]
    fn non_array_locations_become_empty() {
        let catalog = parse(
            r#"{
                "Zone": {
                    "sizeFactor": 10,
                    "icons": [
                        { "Shrine": { "locations": { "x": 1, "y": 2 } } },
                        { "Camp": {} },
                        { "Well": { "locations": null } }
                    ]
                }
            }"#,
        );
        let def = catalog.get("Zone").unwrap();
        assert!(def.icons[0]["Shrine"].locations.is_empty());
        assert!(def.icons[1]["Camp"].locations.is_empty());
        assert!(def.icons[2]["Well"].locations.is_empty());
    }

    #[test]
    fn malformed_location_entries_are_dropped() {
        let catalog = parse(
            r#"{
                "Zone": {
                    "sizeFactor": 10,
                    "icons": [{
                        "Chest": { "locations": [{"x": 3, "y": 4}, "bogus", {"x": 5}] }
                    }]
                }
            }"#,
        );
        let chest = &catalog.get("Zone").unwrap().icons[0]["Chest"];
        assert_eq!(chest.locations, vec![GameCoordinate { x: 3.0, y: 4.0 }]);
    }

    #[test]
    fn empty_catalog_parses() {
        let catalog = parse("{}");
        assert!(catalog.is_empty());
        assert_eq!(catalog.first_key(), None);
    }
}
