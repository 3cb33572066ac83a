//! Clip sequence and hotspot regions
//!
//! A playlist is the ordered list of clips a walkthrough plays. Each clip may
//! carry a hotspot: a rectangle in percentage space (0-100 on both axes) that
//! a tap must land in to advance. Clips without a hotspot advance on any tap.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default hotspot edge length (percent) used when placing a hotspot by tap
pub const DEFAULT_HOTSPOT_SIZE: f64 = 20.0;

/// Slack for float sums such as `70.1 + 29.9`
const EDGE_TOLERANCE: f64 = 1e-9;

/// Rectangular tap target in percentage coordinates
///
/// Invariants: every field in `[0, 100]`, `x + width <= 100`,
/// `y + height <= 100`, non-zero size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRegion")]
pub struct Region {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[derive(Deserialize)]
struct RawRegion {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl TryFrom<RawRegion> for Region {
    type Error = Error;

    fn try_from(raw: RawRegion) -> Result<Self> {
        Region::new(raw.x, raw.y, raw.width, raw.height)
    }
}

impl Region {
    /// Create a validated region
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self> {
        for (name, value) in [("x", x), ("y", y), ("width", width), ("height", height)] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(Error::InvalidRegion(format!(
                    "{} = {} is outside [0, 100]",
                    name, value
                )));
            }
        }
        if width == 0.0 || height == 0.0 {
            return Err(Error::InvalidRegion(format!(
                "empty region {}x{}",
                width, height
            )));
        }
        if x + width > 100.0 + EDGE_TOLERANCE {
            return Err(Error::InvalidRegion(format!(
                "x + width = {} exceeds 100",
                x + width
            )));
        }
        if y + height > 100.0 + EDGE_TOLERANCE {
            return Err(Error::InvalidRegion(format!(
                "y + height = {} exceeds 100",
                y + height
            )));
        }
        Ok(Self { x, y, width, height })
    }

    /// Region of the given size centered on a tap, pushed back inside the viewport
    ///
    /// `center_x`/`center_y` are percentages; values outside `[0, 100]` are
    /// clamped along with the rectangle.
    pub fn centered_at(center_x: f64, center_y: f64, width: f64, height: f64) -> Result<Self> {
        if !center_x.is_finite() || !center_y.is_finite() {
            return Err(Error::InvalidRegion("non-finite center".to_string()));
        }
        if !(width > 0.0 && width <= 100.0) || !(height > 0.0 && height <= 100.0) {
            return Err(Error::InvalidRegion(format!(
                "size {}x{} must be within (0, 100]",
                width, height
            )));
        }
        let x = (center_x - width / 2.0).clamp(0.0, 100.0 - width);
        let y = (center_y - height / 2.0).clamp(0.0, 100.0 - height);
        Self::new(x, y, width, height)
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Half-open membership: `[x, x+width) × [y, y+height)`
    pub fn contains(&self, x_pct: f64, y_pct: f64) -> bool {
        x_pct >= self.x
            && x_pct < self.x + self.width
            && y_pct >= self.y
            && y_pct < self.y + self.height
    }
}

/// One step of a walkthrough
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Opaque reference to playable media (a local file path for stored clips)
    pub locator: String,

    /// Tap target gating the advance; `None` means any tap advances
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotspot: Option<Region>,
}

impl Clip {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            hotspot: None,
        }
    }

    pub fn with_hotspot(mut self, hotspot: Region) -> Self {
        self.hotspot = Some(hotspot);
        self
    }
}

/// Ordered clip sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    clips: Vec<Clip>,
}

impl Playlist {
    pub fn new(clips: Vec<Clip>) -> Self {
        Self { clips }
    }

    /// Playlist of hotspot-free clips
    pub fn from_locators<I, S>(locators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(locators.into_iter().map(Clip::new).collect())
    }

    /// Read a playlist manifest (JSON)
    pub async fn load_json(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("playlist manifest {}", path.display()))
            } else {
                Error::Io(e)
            }
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Clip> {
        self.clips.get(index)
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn push(&mut self, clip: Clip) {
        self.clips.push(clip);
    }

    /// Set or clear the hotspot of one clip
    pub fn set_hotspot(&mut self, index: usize, hotspot: Option<Region>) -> Result<()> {
        let clip = self
            .clips
            .get_mut(index)
            .ok_or_else(|| Error::NotFound(format!("clip {}", index)))?;
        clip.hotspot = hotspot;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_accepts_full_viewport() {
        let region = Region::new(0.0, 0.0, 100.0, 100.0).unwrap();
        assert!(region.contains(0.0, 0.0));
        assert!(region.contains(99.9, 99.9));
        assert!(!region.contains(100.0, 50.0));
    }

    #[test]
    fn test_region_rejects_overflow() {
        assert!(matches!(
            Region::new(90.0, 0.0, 20.0, 10.0),
            Err(Error::InvalidRegion(_))
        ));
        assert!(matches!(
            Region::new(0.0, 85.0, 10.0, 20.0),
            Err(Error::InvalidRegion(_))
        ));
        assert!(Region::new(-1.0, 0.0, 10.0, 10.0).is_err());
        assert!(Region::new(0.0, 0.0, 0.0, 10.0).is_err());
        assert!(Region::new(f64::NAN, 0.0, 10.0, 10.0).is_err());
    }

    #[test]
    fn test_region_tolerates_float_sums() {
        assert!(Region::new(70.1, 0.0, 29.9, 10.0).is_ok());
    }

    #[test]
    fn test_region_half_open_bounds() {
        let region = Region::new(10.0, 10.0, 20.0, 20.0).unwrap();
        assert!(region.contains(10.0, 10.0));
        assert!(region.contains(15.0, 15.0));
        assert!(region.contains(29.999, 29.999));
        assert!(!region.contains(30.0, 15.0));
        assert!(!region.contains(15.0, 30.0));
        assert!(!region.contains(9.999, 15.0));
    }

    #[test]
    fn test_centered_at_clamps_to_viewport() {
        let region = Region::centered_at(50.0, 50.0, 20.0, 20.0).unwrap();
        assert_eq!((region.x(), region.y()), (40.0, 40.0));

        let corner = Region::centered_at(95.0, 2.0, DEFAULT_HOTSPOT_SIZE, DEFAULT_HOTSPOT_SIZE)
            .unwrap();
        assert_eq!((corner.x(), corner.y()), (80.0, 0.0));

        assert!(Region::centered_at(50.0, 50.0, 0.0, 20.0).is_err());
    }

    #[test]
    fn test_region_deserialize_validates() {
        let ok: Region =
            serde_json::from_str(r#"{"x":10,"y":10,"width":20,"height":20}"#).unwrap();
        assert_eq!(ok, Region::new(10.0, 10.0, 20.0, 20.0).unwrap());

        let bad = serde_json::from_str::<Region>(r#"{"x":90,"y":10,"width":20,"height":20}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_playlist_manifest_shape() {
        let mut playlist = Playlist::from_locators(["a.mov", "b.mov"]);
        playlist
            .set_hotspot(1, Some(Region::new(5.0, 5.0, 10.0, 10.0).unwrap()))
            .unwrap();

        let json = serde_json::to_value(&playlist).unwrap();
        assert!(json["clips"][0].get("hotspot").is_none());
        assert_eq!(json["clips"][1]["hotspot"]["width"], 10.0);

        assert!(matches!(
            playlist.set_hotspot(5, None),
            Err(Error::NotFound(_))
        ));
    }
}
