//! DMC thread reference palette and nearest-color matching.
//!
//! The catalog is the fixed table every quantization pass matches against.
//! Lookups are memoized per pass through [`NearestColorCache`] since a full
//! grid revisits the same sampled colors many times.

use palette::Srgb;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// One reference thread color from the fixed DMC catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmcColor {
    pub floss: String,
    pub name: String,
    pub hex: String,
    pub rgb: [u8; 3],
}

/// Complete DMC thread catalog (official colors).
/// Each entry: (floss, name, hex)
const DMC_CATALOG: &[(&str, &str, &str)] = &[
    // Whites & Neutrals
    ("B5200", "Snow White", "#FFFFFF"),
    ("White", "White", "#FEFEFE"),
    ("Ecru", "Ecru", "#F0EBD5"),
    ("822", "Light Beige Gray", "#E7DECC"),
    ("644", "Medium Beige Gray", "#D9D3C3"),
    ("642", "Dark Beige Gray", "#C2B9A6"),
    ("640", "Very Dark Beige Gray", "#9B8F7E"),
    ("3072", "Very Light Beaver Gray", "#E1E5DE"),
    ("648", "Light Beaver Gray", "#BCC3BB"),
    ("647", "Medium Beaver Gray", "#A9B0A8"),
    ("646", "Dark Beaver Gray", "#8D9691"),
    ("645", "Very Dark Beaver Gray", "#6C7670"),
    // Blacks & Grays
    ("310", "Black", "#000000"),
    ("3799", "Very Dark Pewter Gray", "#5B5F5F"),
    ("413", "Dark Pewter Gray", "#656666"),
    ("3787", "Dark Brown Gray", "#6B675E"),
    ("762", "Very Light Pearl Gray", "#E6E6E6"),
    ("415", "Pearl Gray", "#D3D3D3"),
    ("318", "Light Steel Gray", "#ADB0AE"),
    ("414", "Dark Steel Gray", "#8A8A8A"),
    ("317", "Pewter Gray", "#6B6D6D"),
    ("535", "Very Light Ash Gray", "#696959"),
    ("3024", "Very Light Brown Gray", "#D0CCBE"),
    ("3023", "Light Brown Gray", "#B5A588"),
    // Reds
    ("666", "Bright Red", "#EC2130"),
    ("321", "Red", "#CE1938"),
    ("304", "Medium Red", "#B11731"),
    ("498", "Dark Red", "#A81428"),
    ("816", "Garnet", "#91182E"),
    ("815", "Medium Garnet", "#7C1D2B"),
    ("814", "Dark Garnet", "#6D1329"),
    ("760", "Salmon", "#F5BEC2"),
    ("3712", "Medium Salmon", "#EA9CA3"),
    ("3328", "Dark Salmon", "#E07681"),
    ("347", "Very Dark Salmon", "#BF1733"),
    ("353", "Peach", "#FECDCD"),
    ("352", "Light Coral", "#FBB9AA"),
    ("351", "Coral", "#EA8579"),
    ("350", "Medium Coral", "#E34948"),
    ("349", "Dark Coral", "#C81732"),
    ("817", "Very Dark Coral Red", "#BA1730"),
    // Pinks
    ("818", "Baby Pink", "#FFD9DB"),
    ("963", "Ultra Very Light Dusty Rose", "#FFCCD1"),
    ("3716", "Very Light Dusty Rose", "#FFBAC7"),
    ("962", "Medium Dusty Rose", "#E97D8B"),
    ("961", "Dark Dusty Rose", "#CE486E"),
    ("3833", "Light Raspberry", "#E95077"),
    ("3832", "Medium Raspberry", "#D13D6F"),
    ("3831", "Dark Raspberry", "#B0194B"),
    ("3350", "Ultra Dark Dusty Rose", "#B52D5C"),
    ("150", "Ultra Very Light Dusty Rose", "#F8D5D8"),
    ("151", "Very Light Dusty Rose", "#EFB1BA"),
    ("152", "Medium Light Shell Pink", "#DD88A0"),
    ("3354", "Light Dusty Rose", "#D887A6"),
    ("3733", "Dusty Rose", "#CD5E8D"),
    ("3731", "Very Dark Dusty Rose", "#C0476C"),
    // Oranges
    ("3824", "Light Apricot", "#FECABE"),
    ("3341", "Apricot", "#FFAB8A"),
    ("3340", "Medium Apricot", "#FF8262"),
    ("608", "Bright Orange", "#FF6F30"),
    ("606", "Bright Orange-Red", "#FA3F1B"),
    ("970", "Light Pumpkin", "#FF901F"),
    ("971", "Pumpkin", "#FF8600"),
    ("972", "Deep Canary", "#FFB900"),
    ("3853", "Dark Autumn Gold", "#F59B5A"),
    ("3854", "Medium Autumn Gold", "#F68A5C"),
    ("3855", "Light Autumn Gold", "#FBBF99"),
    ("722", "Light Orange Spice", "#F6A667"),
    ("720", "Dark Orange Spice", "#E94A07"),
    ("721", "Medium Orange Spice", "#F25D3D"),
    ("947", "Burnt Orange", "#FF5F01"),
    // Yellows
    ("445", "Light Lemon", "#FFFDDB"),
    ("307", "Lemon", "#FFE600"),
    ("973", "Bright Canary", "#FFE529"),
    ("444", "Dark Lemon", "#FFE00B"),
    ("3078", "Very Light Golden Yellow", "#FFF8DC"),
    ("727", "Very Light Topaz", "#FFF785"),
    ("726", "Light Topaz", "#FFD747"),
    ("725", "Topaz", "#FFC723"),
    ("3820", "Dark Straw", "#DDB900"),
    ("783", "Medium Topaz", "#D68700"),
    ("782", "Dark Topaz", "#CB7800"),
    ("781", "Very Dark Topaz", "#985F00"),
    ("780", "Ultra Very Dark Topaz", "#8C5400"),
    ("676", "Light Old Gold", "#ECBB5C"),
    ("729", "Medium Old Gold", "#D1A140"),
    ("680", "Dark Old Gold", "#B98C27"),
    ("3829", "Very Dark Old Gold", "#9F6F00"),
    ("3822", "Light Straw", "#F0DE9C"),
    ("3821", "Straw", "#E0C47A"),
    // Greens
    ("704", "Bright Chartreuse", "#CCF500"),
    ("703", "Chartreuse", "#A6D700"),
    ("702", "Kelly Green", "#86B500"),
    ("701", "Light Green", "#5D9F00"),
    ("700", "Bright Green", "#2E7D09"),
    ("699", "Green", "#136C00"),
    ("907", "Light Parrot Green", "#D0F200"),
    ("906", "Medium Parrot Green", "#9DB700"),
    ("905", "Dark Parrot Green", "#6F9800"),
    ("904", "Very Dark Parrot Green", "#4B7800"),
    ("164", "Light Forest Green", "#C7D9AD"),
    ("989", "Forest Green", "#88A84C"),
    ("988", "Medium Forest Green", "#77923C"),
    ("987", "Dark Forest Green", "#5F7D2D"),
    ("986", "Very Dark Forest Green", "#466B28"),
    ("3348", "Light Yellow Green", "#D8E79E"),
    ("3347", "Medium Yellow Green", "#A3C85E"),
    ("3346", "Hunter Green", "#77A058"),
    ("3345", "Dark Hunter Green", "#66834A"),
    ("772", "Very Light Yellow Green", "#E4F3CC"),
    ("3364", "Pine Green", "#546E4D"),
    ("320", "Medium Pistachio Green", "#8D9E57"),
    ("367", "Dark Pistachio Green", "#6B7B3C"),
    ("319", "Very Dark Pistachio Green", "#40502C"),
    // Teals & Aquas
    ("964", "Light Seagreen", "#C1E2DC"),
    ("959", "Medium Seagreen", "#89C9BC"),
    ("958", "Dark Seagreen", "#52B5A3"),
    ("3812", "Very Dark Seagreen", "#2E917F"),
    ("3811", "Very Light Turquoise", "#C2E3DF"),
    ("598", "Light Turquoise", "#9FCECE"),
    ("597", "Turquoise", "#6CB5BD"),
    ("3810", "Dark Turquoise", "#4D999A"),
    ("3809", "Very Dark Turquoise", "#328082"),
    ("928", "Very Light Gray Green", "#E7EDE7"),
    ("927", "Light Gray Green", "#BFCEC4"),
    ("926", "Medium Gray Green", "#98B3A6"),
    ("3768", "Dark Gray Green", "#5B7B6B"),
    // Blues
    ("3841", "Pale Baby Blue", "#CEDEED"),
    ("3840", "Light Baby Blue", "#A8C9E8"),
    ("3839", "Medium Baby Blue", "#6495C8"),
    ("3838", "Dark Baby Blue", "#3A75AE"),
    ("800", "Pale Delft Blue", "#C9E4F2"),
    ("809", "Delft Blue", "#94B7D5"),
    ("799", "Medium Delft Blue", "#7393B7"),
    ("798", "Dark Delft Blue", "#5174A0"),
    ("797", "Royal Blue", "#13438D"),
    ("796", "Dark Royal Blue", "#123071"),
    ("3325", "Light Baby Blue", "#BFD8EB"),
    ("3755", "Baby Blue", "#8DADD3"),
    ("334", "Medium Baby Blue", "#5D8AB8"),
    ("322", "Dark Baby Blue", "#2F5580"),
    ("312", "Very Dark Baby Blue", "#13416D"),
    ("311", "Medium Navy Blue", "#1C3A5C"),
    ("336", "Navy Blue", "#13294B"),
    ("823", "Dark Navy Blue", "#13294B"),
    ("939", "Very Dark Navy Blue", "#13213C"),
    // Purples
    ("3747", "Very Light Blue Violet", "#E3E5EC"),
    ("341", "Light Blue Violet", "#B5CAE6"),
    ("3746", "Dark Blue Violet", "#948FCC"),
    ("333", "Very Dark Blue Violet", "#6E5B9B"),
    ("3837", "Ultra Dark Lavender", "#6D417E"),
    ("211", "Light Lavender", "#E8D8EA"),
    ("210", "Medium Lavender", "#C68FB9"),
    ("209", "Dark Lavender", "#9C4E97"),
    ("208", "Very Dark Lavender", "#7F2A7B"),
    ("3836", "Light Grape", "#B78BC0"),
    ("3835", "Medium Grape", "#924C8F"),
    ("3834", "Dark Grape", "#742A6E"),
    ("154", "Very Dark Grape", "#551839"),
    ("153", "Very Light Violet", "#E8CCDF"),
    ("3743", "Very Light Antique Violet", "#E3D7E2"),
    ("3042", "Light Antique Violet", "#D7BFD4"),
    ("3041", "Medium Antique Violet", "#C6A9C1"),
    ("3740", "Dark Antique Violet", "#A17896"),
    // Browns
    ("3865", "Winter White", "#FAF9F4"),
    ("739", "Ultra Very Light Tan", "#F5EDD3"),
    ("738", "Very Light Tan", "#EBCBA1"),
    ("437", "Light Tan", "#D9A964"),
    ("436", "Tan", "#C68638"),
    ("435", "Very Light Brown", "#945B25"),
    ("434", "Light Brown", "#944B14"),
    ("433", "Medium Brown", "#85511F"),
    ("801", "Dark Coffee Brown", "#693F17"),
    ("898", "Very Dark Coffee Brown", "#5C3A1F"),
    ("938", "Ultra Dark Coffee Brown", "#4A2812"),
    ("3371", "Black Brown", "#301904"),
    ("543", "Ultra Very Light Beige Brown", "#F0DBC8"),
    ("3864", "Light Mocha Beige", "#C9A992"),
    ("3863", "Medium Mocha Beige", "#A4826A"),
    ("3862", "Dark Mocha Beige", "#856551"),
    ("3861", "Light Cocoa", "#A07959"),
    ("3860", "Cocoa", "#78503B"),
    ("3031", "Very Dark Mocha Brown", "#54372A"),
    ("3021", "Very Dark Brown Gray", "#5B4733"),
    // Terra Cottas & Specialty
    ("948", "Very Light Peach", "#FED9C7"),
    ("754", "Light Peach", "#F9CEB9"),
    ("945", "Tawny", "#F6C199"),
    ("3778", "Light Terra Cotta", "#DD967F"),
    ("356", "Medium Terra Cotta", "#C66F5C"),
    ("3830", "Terra Cotta", "#B85A41"),
    ("355", "Dark Terra Cotta", "#A44037"),
    ("3777", "Very Dark Terra Cotta", "#8E3031"),
];

/// Parsed catalog, loaded once per process.
pub struct DmcCatalog {
    colors: Vec<DmcColor>,
}

static CATALOG: OnceLock<DmcCatalog> = OnceLock::new();

impl DmcCatalog {
    pub fn global() -> &'static Self {
        CATALOG.get_or_init(Self::new)
    }

    fn new() -> Self {
        let colors = DMC_CATALOG
            .iter()
            .map(|(floss, name, hex)| DmcColor {
                floss: (*floss).to_string(),
                name: (*name).to_string(),
                hex: (*hex).to_string(),
                rgb: parse_hex_color(hex).unwrap_or([0, 0, 0]),
            })
            .collect();
        Self { colors }
    }

    pub fn colors(&self) -> &[DmcColor] {
        &self.colors
    }

    pub fn color(&self, index: usize) -> &DmcColor {
        &self.colors[index]
    }

    pub fn find_by_floss(&self, floss: &str) -> Option<&DmcColor> {
        self.colors.iter().find(|color| color.floss == floss)
    }

    /// Index of the catalog color minimizing squared RGB distance.
    /// Ties resolve to the earliest catalog entry, so lookups are
    /// deterministic for a fixed table.
    pub fn nearest_index(&self, rgb: [u8; 3]) -> usize {
        let mut best = 0;
        let mut best_distance = u32::MAX;
        for (i, color) in self.colors.iter().enumerate() {
            let distance = squared_distance(rgb, color.rgb);
            if distance < best_distance {
                best_distance = distance;
                best = i;
            }
        }
        best
    }

    pub fn nearest(&self, rgb: [u8; 3]) -> &DmcColor {
        &self.colors[self.nearest_index(rgb)]
    }

    /// Nearest catalog color skipping near-white entries. Used when white
    /// background stitches are disabled and a lookup must not land on a
    /// suppressed color.
    pub fn nearest_excluding_near_white(&self, rgb: [u8; 3]) -> Option<&DmcColor> {
        let mut best: Option<&DmcColor> = None;
        let mut best_distance = u32::MAX;
        for color in &self.colors {
            if is_near_white(color.rgb) {
                continue;
            }
            let distance = squared_distance(rgb, color.rgb);
            if distance < best_distance {
                best_distance = distance;
                best = Some(color);
            }
        }
        best
    }
}

/// Memoized RGB -> nearest-catalog-index lookups.
///
/// One instance lives for the duration of a single construction or reduction
/// pass; the mapping is pure, so invalidation is about memory, not
/// correctness.
pub struct NearestColorCache {
    hits: HashMap<[u8; 3], usize>,
}

impl NearestColorCache {
    pub fn new() -> Self {
        Self {
            hits: HashMap::new(),
        }
    }

    pub fn nearest(&mut self, rgb: [u8; 3]) -> usize {
        let catalog = DmcCatalog::global();
        *self
            .hits
            .entry(rgb)
            .or_insert_with(|| catalog.nearest_index(rgb))
    }

    /// Resolve a batch of distinct colors in parallel before the sequential
    /// per-cell walk consumes them.
    pub fn warm(&mut self, colors: &[[u8; 3]]) {
        let catalog = DmcCatalog::global();
        let missing: Vec<[u8; 3]> = colors
            .iter()
            .filter(|rgb| !self.hits.contains_key(*rgb))
            .copied()
            .collect();
        let resolved: Vec<([u8; 3], usize)> = missing
            .par_iter()
            .map(|rgb| (*rgb, catalog.nearest_index(*rgb)))
            .collect();
        self.hits.extend(resolved);
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

impl Default for NearestColorCache {
    fn default() -> Self {
        Self::new()
    }
}

pub fn squared_distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    let dr = a[0] as i32 - b[0] as i32;
    let dg = a[1] as i32 - b[1] as i32;
    let db = a[2] as i32 - b[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Colors this close to white are treated as bare fabric when white
/// background stitches are disabled.
pub fn is_near_white(rgb: [u8; 3]) -> bool {
    rgb[0] > 245 && rgb[1] > 245 && rgb[2] > 245
}

pub fn is_near_black(rgb: [u8; 3]) -> bool {
    rgb[0] <= 20 && rgb[1] <= 20 && rgb[2] <= 20
}

/// Stable working-palette key for an RGB triple.
pub fn color_key(rgb: [u8; 3]) -> String {
    format!("{},{},{}", rgb[0], rgb[1], rgb[2])
}

/// Parse `#rgb` / `#rrggbb` (leading `#` optional) into an RGB triple.
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    value
        .trim()
        .parse::<Srgb<u8>>()
        .ok()
        .map(|color| [color.red, color.green, color.blue])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_parses_every_entry() {
        let catalog = DmcCatalog::global();
        assert_eq!(catalog.colors().len(), DMC_CATALOG.len());
        let black = catalog.find_by_floss("310").unwrap();
        assert_eq!(black.rgb, [0, 0, 0]);
        let snow = catalog.find_by_floss("B5200").unwrap();
        assert_eq!(snow.rgb, [255, 255, 255]);
    }

    #[test]
    fn nearest_black_is_310() {
        let catalog = DmcCatalog::global();
        assert_eq!(catalog.nearest([0, 0, 0]).floss, "310");
        assert_eq!(catalog.nearest([5, 3, 8]).floss, "310");
    }

    #[test]
    fn nearest_exact_match_wins() {
        let catalog = DmcCatalog::global();
        let red = catalog.find_by_floss("321").unwrap().clone();
        assert_eq!(catalog.nearest(red.rgb).floss, "321");
    }

    #[test]
    fn nearest_excluding_near_white_never_returns_white() {
        let catalog = DmcCatalog::global();
        let near = catalog.nearest_excluding_near_white([255, 255, 255]).unwrap();
        assert!(!is_near_white(near.rgb));
    }

    #[test]
    fn cache_memoizes_and_matches_direct_lookup() {
        let catalog = DmcCatalog::global();
        let mut cache = NearestColorCache::new();
        let first = cache.nearest([120, 45, 200]);
        let second = cache.nearest([120, 45, 200]);
        assert_eq!(first, second);
        assert_eq!(first, catalog.nearest_index([120, 45, 200]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn warm_precomputes_distinct_colors() {
        let mut cache = NearestColorCache::new();
        let colors = [[0, 0, 0], [255, 255, 255], [200, 30, 50]];
        cache.warm(&colors);
        assert_eq!(cache.len(), 3);
        let catalog = DmcCatalog::global();
        for rgb in colors {
            assert_eq!(cache.nearest(rgb), catalog.nearest_index(rgb));
        }
    }

    #[test]
    fn near_white_threshold_is_exclusive() {
        assert!(is_near_white([246, 246, 246]));
        assert!(!is_near_white([245, 246, 246]));
        assert!(is_near_black([20, 20, 20]));
        assert!(!is_near_black([21, 0, 0]));
    }

    #[test]
    fn parse_hex_supports_short_and_long_forms() {
        assert_eq!(parse_hex_color("#FF8000"), Some([255, 128, 0]));
        assert_eq!(parse_hex_color("#abc"), Some([170, 187, 204]));
        assert_eq!(parse_hex_color("ffffff"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("not a color"), None);
    }
}
