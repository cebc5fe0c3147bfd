//! Road classification shared by the graph loaders and the presentation layer.
//!
//! Values follow OSM `highway=*` tags.  `*_link` ramps fold into their parent
//! class; tags that are not drivable by car have no `RoadClass` at all.

/// Functional class of a drivable road.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum RoadClass {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    /// Default for edges with no tag.
    #[default]
    Residential,
    Unclassified,
    Service,
    /// A drivable tag we do not model specifically.
    Other,
}

impl RoadClass {
    /// Parse an OSM `highway` value.
    ///
    /// Returns `None` for ways a car cannot use (footways, cycleways, …).
    pub fn from_highway(tag: &str) -> Option<RoadClass> {
        let class = match tag.trim() {
            "motorway"  | "motorway_link"  => RoadClass::Motorway,
            "trunk"     | "trunk_link"     => RoadClass::Trunk,
            "primary"   | "primary_link"   => RoadClass::Primary,
            "secondary" | "secondary_link" => RoadClass::Secondary,
            "tertiary"  | "tertiary_link"  => RoadClass::Tertiary,
            "residential" | "living_street" => RoadClass::Residential,
            "unclassified"                 => RoadClass::Unclassified,
            "service"                      => RoadClass::Service,
            "footway" | "path" | "cycleway" | "pedestrian" | "steps" | "track"
            | "bridleway" | "corridor" | "proposed" | "construction" => return None,
            _ => RoadClass::Other,
        };
        Some(class)
    }

    /// Nominal stroke width for drawing this class.
    pub fn line_width(self) -> u32 {
        match self {
            RoadClass::Motorway     => 9,
            RoadClass::Trunk        => 8,
            RoadClass::Primary      => 7,
            RoadClass::Secondary    => 6,
            RoadClass::Tertiary     => 4,
            RoadClass::Residential
            | RoadClass::Unclassified => 3,
            RoadClass::Service
            | RoadClass::Other      => 2,
        }
    }

    /// Motorways are one-way by OSM convention unless tagged otherwise.
    #[inline]
    pub fn implies_oneway(self) -> bool {
        matches!(self, RoadClass::Motorway)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoadClass::Motorway     => "motorway",
            RoadClass::Trunk        => "trunk",
            RoadClass::Primary      => "primary",
            RoadClass::Secondary    => "secondary",
            RoadClass::Tertiary     => "tertiary",
            RoadClass::Residential  => "residential",
            RoadClass::Unclassified => "unclassified",
            RoadClass::Service      => "service",
            RoadClass::Other        => "other",
        }
    }
}

impl std::fmt::Display for RoadClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
