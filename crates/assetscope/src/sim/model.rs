//! Backend data behind the simulated app: the asset class catalogue and the
//! asset records the screens create and edit.

use crate::screens::ConnectionKind;

/// Asset classes and their subtypes. A class with no subtypes hides the
/// subtype dropdown.
pub const CATALOGUE: &[(&str, &[&str])] = &[
    (
        "Disconnect Switch",
        &[
            "Bolted-Pressure Switch (BPS)",
            "Fused Disconnect Switch",
            "Non-Fused Disconnect Switch",
        ],
    ),
    ("Panelboard", &["Distribution Panelboard", "Lighting Panelboard"]),
    (
        "Transformer",
        &["Dry-Type Transformer", "Liquid-Filled Transformer"],
    ),
    ("Motor", &["Induction Motor", "Synchronous Motor"]),
    ("Busway", &[]),
    ("Switchgear", &[]),
];

/// Issue types offered by the New Issue form
pub const ISSUE_TYPES: &[&str] = &[
    "Thermal Anomaly",
    "Ultrasonic Anomaly",
    "Repair Needed",
    "Replacement Needed",
    "NEC Violation",
    "NFPA 70B Violation",
    "OSHA Violation",
];

/// Issue priorities
pub const PRIORITIES: &[&str] = &["Low", "Medium", "High", "Critical"];

/// Physical connection types
pub const CONNECTION_TYPES: &[&str] = &["Cable", "Busway", "Direct"];

/// Asset list grouping modes
pub const GROUPINGS: &[&str] = &["None", "Asset Class", "Subtype"];

/// Sites offered after sign-in
pub const SITES: &[&str] = &["North Yard Substation", "Riverside Plant"];

/// Subtypes of `class`; empty for unknown classes
#[must_use]
pub fn subtypes_of(class: &str) -> &'static [&'static str] {
    CATALOGUE
        .iter()
        .find(|(name, _)| *name == class)
        .map_or(&[], |(_, subtypes)| subtypes)
}

/// Class names in catalogue order
#[must_use]
pub fn class_names() -> Vec<&'static str> {
    CATALOGUE.iter().map(|(name, _)| *name).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub issue_type: String,
    pub title: String,
    pub priority: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub kind: ConnectionKind,
    pub source: String,
    pub connection_type: Option<String>,
}

impl Connection {
    /// Row label shown in the Connections section
    pub fn label(&self) -> String {
        format!("{}: {}", self.kind, self.source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: u32,
    pub name: String,
    pub class: String,
    pub subtype: Option<String>,
    pub parent: Option<u32>,
    pub tasks: Vec<Task>,
    pub issues: Vec<Issue>,
    pub connections: Vec<Connection>,
}

/// Persistent records; survives app resets.
#[derive(Debug, Clone)]
pub struct Backend {
    assets: Vec<Asset>,
    next_id: u32,
}

impl Backend {
    /// An empty backend
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            assets: Vec::new(),
            next_id: 1,
        }
    }

    /// A site with a handful of existing equipment
    #[must_use]
    pub fn seeded() -> Self {
        let mut backend = Self::empty();
        for (name, class, subtype) in [
            ("Main Switchboard MSB-1", "Switchgear", None),
            ("Transformer T-1", "Transformer", Some("Dry-Type Transformer")),
            ("Panel LP-1", "Panelboard", Some("Lighting Panelboard")),
            ("Panel LP-2", "Panelboard", None),
            ("Disconnect DS-4", "Disconnect Switch", None),
            ("Pump Motor M-7", "Motor", Some("Induction Motor")),
            ("Busway BW-2", "Busway", None),
        ] {
            let id = backend.insert(name, class, None);
            if let Some(asset) = backend.get_mut(id) {
                asset.subtype = subtype.map(str::to_string);
            }
        }
        backend
    }

    /// Add an asset and return its id
    pub fn insert(&mut self, name: &str, class: &str, parent: Option<u32>) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.assets.push(Asset {
            id,
            name: name.to_string(),
            class: class.to_string(),
            subtype: None,
            parent,
            tasks: Vec::new(),
            issues: Vec::new(),
            connections: Vec::new(),
        });
        id
    }

    /// Remove an asset; its children become top-level
    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.assets.len();
        self.assets.retain(|a| a.id != id);
        for asset in &mut self.assets {
            if asset.parent == Some(id) {
                asset.parent = None;
            }
        }
        self.assets.len() != before
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Asset> {
        self.assets.iter_mut().find(|a| a.id == id)
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.name == name)
    }

    /// All assets sorted by name
    #[must_use]
    pub fn sorted(&self) -> Vec<&Asset> {
        let mut all: Vec<&Asset> = self.assets.iter().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Direct children of `id`, sorted by name
    #[must_use]
    pub fn children_of(&self, id: u32) -> Vec<&Asset> {
        self.sorted()
            .into_iter()
            .filter(|a| a.parent == Some(id))
            .collect()
    }

    /// Whether `candidate` is `id` itself or one of its ancestors
    #[must_use]
    pub fn is_self_or_ancestor(&self, candidate: u32, id: u32) -> bool {
        let mut cursor = Some(id);
        let mut hops = 0;
        while let Some(current) = cursor {
            if current == candidate {
                return true;
            }
            hops += 1;
            if hops > self.assets.len() {
                return false;
            }
            cursor = self.get(current).and_then(|a| a.parent);
        }
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_lookup() {
        assert_eq!(subtypes_of("Disconnect Switch").len(), 3);
        assert!(subtypes_of("Busway").is_empty());
        assert!(subtypes_of("Spaceship").is_empty());
        assert_eq!(class_names()[0], "Disconnect Switch");
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let mut backend = Backend::empty();
        let a = backend.insert("A", "Busway", None);
        let b = backend.insert("B", "Busway", Some(a));
        assert!(b > a);
        assert_eq!(backend.children_of(a).len(), 1);
    }

    #[test]
    fn test_remove_orphans_children() {
        let mut backend = Backend::empty();
        let parent = backend.insert("P", "Switchgear", None);
        let child = backend.insert("C", "Busway", Some(parent));
        assert!(backend.remove(parent));
        assert_eq!(backend.get(child).unwrap().parent, None);
        assert!(!backend.remove(parent));
    }

    #[test]
    fn test_ancestor_chain() {
        let mut backend = Backend::empty();
        let root = backend.insert("Root", "Switchgear", None);
        let mid = backend.insert("Mid", "Panelboard", Some(root));
        let leaf = backend.insert("Leaf", "Busway", Some(mid));
        assert!(backend.is_self_or_ancestor(root, leaf));
        assert!(backend.is_self_or_ancestor(leaf, leaf));
        assert!(!backend.is_self_or_ancestor(leaf, root));
    }

    #[test]
    fn test_seeded_site_is_sorted() {
        let backend = Backend::seeded();
        let names: Vec<_> = backend.sorted().iter().map(|a| a.name.clone()).collect();
        let mut expected = names.clone();
        expected.sort();
        assert_eq!(names, expected);
        assert!(backend.find_by_name("Transformer T-1").is_some());
    }
}
