//! Spatial filtering against the serviced landmass
//!
//! A cheap bounding-box check short-circuits before the ray-casting
//! point-in-polygon test. Both the grid-refresh pipeline and any on-the-fly
//! filtering use this one polygon definition; the bounding box must always
//! enclose the polygon.

/// Rectangular bounding box in decimal degrees
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }
}

/// Bounding box enclosing the serviced region
pub const SERVICE_AREA_BOUNDS: BoundingBox = BoundingBox {
    lat_min: 35.00,
    lat_max: 35.70,
    lon_min: 32.20,
    lon_max: 34.65,
};

/// Coastline polygon of the serviced landmass (high fidelity v4),
/// ordered (lat, lon)
pub const SERVICE_AREA_POLYGON: [(f64, f64); 30] = [
    // West coast & Morphou Bay
    (35.08, 32.75), // Lefke inland
    (35.15, 32.85), // Morphou west coast
    (35.22, 32.94), // Morphou Bay deep
    (35.32, 32.93), // Morphou Bay north / Kormakitis west
    // Cape Kormakitis
    (35.40, 32.95),
    (35.36, 33.10), // Kormakitis east
    // Kyrenia coast
    (35.34, 33.25), // Lapta / Alsancak
    (35.33, 33.35), // Kyrenia harbor
    (35.34, 33.55), // Catalkoy / Esentepe west
    // Esentepe & Kantara
    (35.38, 33.75), // Esentepe coast
    (35.42, 33.95), // Tatlisu
    (35.47, 34.08), // Kaplica / Kantara north
    // Karpaz peninsula, north side
    (35.54, 34.22), // Yeni Erenkoy
    (35.60, 34.38), // Dipkarpaz north
    (35.67, 34.54), // Zafer Burnu
    (35.69, 34.58), // the absolute tip
    // Karpaz peninsula, south side
    (35.65, 34.58),
    (35.58, 34.50), // Dipkarpaz south
    (35.52, 34.35), // Kaleburnu
    (35.45, 34.20), // Balalan coast
    (35.38, 34.10), // Bogaz north
    // Famagusta Bay
    (35.28, 33.97), // Iskele / Long Beach
    (35.20, 33.92), // Glapsides
    (35.12, 33.94), // Famagusta port
    // The Green Line (border)
    (35.09, 33.92), // Varosha south limit
    (35.10, 33.70), // Mesaoria border east
    (35.12, 33.50), // Nicosia north border
    (35.16, 33.35), // Nicosia west buffer
    (35.14, 33.15), // Morphou plain border
    (35.10, 32.90), // back to Lefke area
];

/// Ray-casting point-in-polygon test: count crossings of a horizontal ray
/// against each polygon edge; an odd crossing count means inside.
pub fn point_in_polygon(lat: f64, lon: f64, polygon: &[(f64, f64)]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let (x, y) = (lat, lon);
    let mut inside = false;

    let (mut p1x, mut p1y) = polygon[0];
    for i in 1..=n {
        let (p2x, p2y) = polygon[i % n];
        if y > p1y.min(p2y) && y <= p1y.max(p2y) && x <= p1x.max(p2x) && p1y != p2y {
            let x_intersect = (y - p1y) * (p2x - p1x) / (p2y - p1y) + p1x;
            if p1x == p2x || x <= x_intersect {
                inside = !inside;
            }
        }
        (p1x, p1y) = (p2x, p2y);
    }

    inside
}

/// Whether a coordinate lies on the serviced landmass.
///
/// The bounding box rejects cheaply; the polygon is only evaluated for
/// points inside the box.
pub fn in_bounds(lat: f64, lon: f64) -> bool {
    SERVICE_AREA_BOUNDS.contains(lat, lon) && point_in_polygon(lat, lon, &SERVICE_AREA_POLYGON)
}
