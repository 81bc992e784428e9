use serde::Deserialize;

/// Anatomical slicing axis. The discriminants match the axis number of the
/// volume array: sagittal slices along X, coronal along Y, axial along Z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Sagittal = 0,
    Coronal = 1,
    #[default]
    Axial = 2,
}

impl Orientation {
    pub fn from_axis(axis: usize) -> Self {
        match axis {
            0 => Orientation::Sagittal,
            1 => Orientation::Coronal,
            _ => Orientation::Axial,
        }
    }

    pub fn axis(self) -> usize {
        self as usize
    }

    /// Display name used in panel titles, e.g. "Sagittal (X)".
    pub fn label(self) -> &'static str {
        match self {
            Orientation::Sagittal => "Sagittal (X)",
            Orientation::Coronal => "Coronal (Y)",
            Orientation::Axial => "Axial (Z)",
        }
    }
}

/// A slice index as supplied by the caller, before clamping. Negative,
/// out-of-range and unparsable values are tolerated and never error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SliceIndex(pub i64);

impl SliceIndex {
    /// Parse loosely typed input; anything non-numeric clamps to 0.
    pub fn parse(raw: &str) -> Self {
        SliceIndex(raw.trim().parse().unwrap_or(0))
    }

    /// Clamp into `[0, extent - 1]`. An empty extent clamps to 0.
    pub fn clamp(self, extent: usize) -> usize {
        let max_index = extent.saturating_sub(1) as i64;
        self.0.clamp(0, max_index) as usize
    }
}

impl From<i64> for SliceIndex {
    fn from(raw: i64) -> Self {
        SliceIndex(raw)
    }
}

/// Recognized colormap names. Unknown names fall back to gray.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Colormap {
    #[default]
    Gray,
    Bone,
    Viridis,
    Hot,
    Cool,
    Plasma,
}

impl Colormap {
    pub fn parse(name: &str) -> Self {
        match name {
            "bone" => Colormap::Bone,
            "viridis" => Colormap::Viridis,
            "hot" => Colormap::Hot,
            "cool" => Colormap::Cool,
            "plasma" => Colormap::Plasma,
            _ => Colormap::Gray,
        }
    }

    /// Colorscale name handed to the interactive scene. "cool" maps to the
    /// "blues" scale, every other name passes through.
    pub fn scale_name(self) -> &'static str {
        match self {
            Colormap::Gray => "gray",
            Colormap::Bone => "bone",
            Colormap::Viridis => "viridis",
            Colormap::Hot => "hot",
            Colormap::Cool => "blues",
            Colormap::Plasma => "plasma",
        }
    }
}

impl<'de> Deserialize<'de> for Colormap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Colormap::parse(&name))
    }
}

/// Named sigmoid opacity curve strengths for volumetric transparency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OpacityPreset {
    Sigmoid1,
    Sigmoid2,
    #[default]
    Sigmoid3,
    Sigmoid5,
    Sigmoid10,
}

impl OpacityPreset {
    pub fn parse(name: &str) -> Self {
        match name {
            "sigmoid_1" => OpacityPreset::Sigmoid1,
            "sigmoid_2" => OpacityPreset::Sigmoid2,
            "sigmoid_3" => OpacityPreset::Sigmoid3,
            "sigmoid_5" => OpacityPreset::Sigmoid5,
            "sigmoid_10" => OpacityPreset::Sigmoid10,
            _ => OpacityPreset::Sigmoid3,
        }
    }

    /// Numeric opacity scalar for the interactive 3D path.
    pub fn value(self) -> f64 {
        match self {
            OpacityPreset::Sigmoid1 => 0.05,
            OpacityPreset::Sigmoid2 => 0.1,
            OpacityPreset::Sigmoid3 => 0.15,
            OpacityPreset::Sigmoid5 => 0.2,
            OpacityPreset::Sigmoid10 => 0.3,
        }
    }
}

impl<'de> Deserialize<'de> for OpacityPreset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(OpacityPreset::parse(&name))
    }
}

/// Renderer3D strategy. Unknown names select the orthogonal-slices mode,
/// the lightest of the three.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RenderMode {
    Volume,
    Isosurface,
    #[default]
    Slices,
}

impl RenderMode {
    pub fn parse(name: &str) -> Self {
        match name {
            "volume" => RenderMode::Volume,
            "isosurface" => RenderMode::Isosurface,
            _ => RenderMode::Slices,
        }
    }
}

impl<'de> Deserialize<'de> for RenderMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(RenderMode::parse(&name))
    }
}

/// Rendering parameters as they cross the I/O boundary.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub axis: Orientation,
    #[serde(default)]
    pub slice_index: Option<i64>,
    #[serde(default)]
    pub colormap: Colormap,
    #[serde(default)]
    pub opacity: OpacityPreset,
    #[serde(default)]
    pub downsample_factor: Option<usize>,
    #[serde(default)]
    pub render_mode: RenderMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_index_clamps_into_range() {
        assert_eq!(SliceIndex(-5).clamp(10), 0);
        assert_eq!(SliceIndex(3).clamp(10), 3);
        assert_eq!(SliceIndex(99).clamp(10), 9);
        assert_eq!(SliceIndex(0).clamp(0), 0);
    }

    #[test]
    fn slice_index_parse_tolerates_garbage() {
        assert_eq!(SliceIndex::parse("42"), SliceIndex(42));
        assert_eq!(SliceIndex::parse(" -3 "), SliceIndex(-3));
        assert_eq!(SliceIndex::parse("mid"), SliceIndex(0));
        assert_eq!(SliceIndex::parse(""), SliceIndex(0));
    }

    #[test]
    fn unknown_colormap_falls_back_to_gray() {
        assert_eq!(Colormap::parse("viridis"), Colormap::Viridis);
        assert_eq!(Colormap::parse("jet"), Colormap::Gray);
        assert_eq!(Colormap::Cool.scale_name(), "blues");
    }

    #[test]
    fn unknown_opacity_preset_falls_back_to_sigmoid_3() {
        assert_eq!(OpacityPreset::parse("sigmoid_10").value(), 0.3);
        assert_eq!(OpacityPreset::parse("sigmoid_7").value(), 0.15);
        assert_eq!(OpacityPreset::parse("").value(), 0.15);
    }

    #[test]
    fn render_request_deserializes_with_defaults() {
        let req: RenderRequest = serde_json::from_str(
            r#"{"axis":"coronal","colormap":"nonsense","render_mode":"volume"}"#,
        )
        .unwrap();
        assert_eq!(req.axis, Orientation::Coronal);
        assert_eq!(req.colormap, Colormap::Gray);
        assert_eq!(req.render_mode, RenderMode::Volume);
        assert_eq!(req.slice_index, None);
        assert_eq!(req.opacity, OpacityPreset::Sigmoid3);
    }
}
