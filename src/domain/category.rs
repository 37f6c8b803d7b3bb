use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Element;

/// The three domain classes elements are grouped into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TrainStations,
    AlpineHuts,
    OtherAccommodations,
}

impl Category {
    /// Snapshot key order
    pub const ALL: [Category; 3] = [
        Category::TrainStations,
        Category::AlpineHuts,
        Category::OtherAccommodations,
    ];

    /// Enrichment order: alpine huts are the priority class
    pub const PRIORITY_ORDER: [Category; 3] = [
        Category::AlpineHuts,
        Category::TrainStations,
        Category::OtherAccommodations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::TrainStations => "train_stations",
            Category::AlpineHuts => "alpine_huts",
            Category::OtherAccommodations => "other_accommodations",
        }
    }

    /// Human-readable label for summaries
    pub fn label(&self) -> &'static str {
        match self {
            Category::TrainStations => "Train stations",
            Category::AlpineHuts => "Alpine huts",
            Category::OtherAccommodations => "Other accommodations",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// A typed record holding one value per category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryMap<T> {
    #[serde(default)]
    pub train_stations: T,
    #[serde(default)]
    pub alpine_huts: T,
    #[serde(default)]
    pub other_accommodations: T,
}

impl<T> CategoryMap<T> {
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        Self {
            train_stations: f(Category::TrainStations),
            alpine_huts: f(Category::AlpineHuts),
            other_accommodations: f(Category::OtherAccommodations),
        }
    }

    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::TrainStations => &self.train_stations,
            Category::AlpineHuts => &self.alpine_huts,
            Category::OtherAccommodations => &self.other_accommodations,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        match category {
            Category::TrainStations => &mut self.train_stations,
            Category::AlpineHuts => &mut self.alpine_huts,
            Category::OtherAccommodations => &mut self.other_accommodations,
        }
    }

    /// Iterate in snapshot key order
    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Category, &T) -> U) -> CategoryMap<U> {
        CategoryMap::from_fn(|category| f(category, self.get(category)))
    }
}

impl CategoryMap<Vec<Element>> {
    pub fn total(&self) -> usize {
        self.iter().map(|(_, elements)| elements.len()).sum()
    }
}

/// Output of the extract stage, before category partitioning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawExtract {
    #[serde(default)]
    pub train_stations: Vec<Element>,
    #[serde(default)]
    pub accommodations: Vec<Element>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_keys_round_trip_through_from_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        assert!("accommodations".parse::<Category>().is_err());
    }

    #[test]
    fn test_priority_order_starts_with_alpine_huts() {
        assert_eq!(Category::PRIORITY_ORDER[0], Category::AlpineHuts);
    }

    #[test]
    fn test_missing_category_keys_default_to_empty() {
        let map: CategoryMap<Vec<Element>> =
            serde_json::from_value(json!({"alpine_huts": []})).unwrap();
        assert!(map.train_stations.is_empty());
        assert_eq!(map.total(), 0);
    }

    #[test]
    fn test_map_preserves_category_identity() {
        let labels = CategoryMap::from_fn(|c| c.as_str().len());
        let doubled = labels.map(|_, len| len * 2);
        assert_eq!(*doubled.get(Category::AlpineHuts), "alpine_huts".len() * 2);
    }
}
