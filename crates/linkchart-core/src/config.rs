use crate::error::{LinkchartError, Result};
use serde::{Deserialize, Serialize};

/// Thresholds for the name matcher and the clustering guardrail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Both core names must be longer than this for containment to apply.
    /// Default: 3
    pub containment_min_len: usize,

    /// The shorter core name must be longer than this for containment to apply.
    /// Keeps "ai" from matching "sail corp".
    /// Default: 4
    pub containment_shorter_min_len: usize,

    /// Levenshtein distance / longer length must be below this to match.
    /// Default: 0.20
    pub edit_ratio_threshold: f64,

    /// Token-set Jaccard index must exceed this to match.
    /// Default: 0.60
    pub jaccard_threshold: f64,

    /// Largest universe of unique names clustered in one run. Larger
    /// universes skip clustering with a warning instead of pinning the
    /// thread on O(n²) comparisons. Default: 5000
    pub max_universe: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            containment_min_len: 3,
            containment_shorter_min_len: 4,
            edit_ratio_threshold: 0.20,
            jaccard_threshold: 0.60,
            max_universe: 5_000,
        }
    }
}

impl ResolutionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_edit_ratio_threshold(mut self, threshold: f64) -> Self {
        self.edit_ratio_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_jaccard_threshold(mut self, threshold: f64) -> Self {
        self.jaccard_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_universe(mut self, max: usize) -> Self {
        self.max_universe = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.edit_ratio_threshold) {
            return Err(LinkchartError::Validation(
                "edit_ratio_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.jaccard_threshold) {
            return Err(LinkchartError::Validation(
                "jaccard_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if self.max_universe < 2 {
            return Err(LinkchartError::Validation(
                "max_universe must be at least 2".into(),
            ));
        }

        Ok(())
    }
}

/// Force-layout tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,

    /// Many-body strength. Negative repels. Default: -300
    pub charge_strength: f64,

    /// Rest length of a link. Default: 100
    pub link_distance: f64,

    /// Pull toward the canvas center on each axis. Default: 0.05
    pub center_strength: f64,

    /// Extra space kept between node circles. Default: 4
    pub collision_padding: f64,

    /// Radius of every CASE node. Default: 18
    pub case_radius: f64,

    /// Radius of an ENTITY node with no connections. Default: 6
    pub entity_base_radius: f64,

    /// Radius added per connection. Default: 2
    pub entity_radius_per_connection: f64,

    /// ENTITY radius ceiling. Default: 24
    pub entity_max_radius: f64,

    /// Fraction of remaining energy lost per tick. Default: 0.0228 (~300 ticks)
    pub alpha_decay: f64,

    /// Simulation stops once alpha drops below this. Default: 0.001
    pub alpha_min: f64,

    /// Fraction of velocity lost per tick. Default: 0.4
    pub velocity_decay: f64,

    /// Energy the simulation is held at while a node is dragged. Default: 0.3
    pub drag_alpha_target: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            charge_strength: -300.0,
            link_distance: 100.0,
            center_strength: 0.05,
            collision_padding: 4.0,
            case_radius: 18.0,
            entity_base_radius: 6.0,
            entity_radius_per_connection: 2.0,
            entity_max_radius: 24.0,
            alpha_decay: 0.0228,
            alpha_min: 0.001,
            velocity_decay: 0.4,
            drag_alpha_target: 0.3,
        }
    }
}

impl LayoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_canvas(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_charge_strength(mut self, strength: f64) -> Self {
        self.charge_strength = strength;
        self
    }

    pub fn with_link_distance(mut self, distance: f64) -> Self {
        self.link_distance = distance.max(0.0);
        self
    }

    pub fn with_alpha_decay(mut self, decay: f64) -> Self {
        self.alpha_decay = decay.clamp(0.0, 1.0);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(LinkchartError::Validation(
                "canvas width and height must be > 0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.velocity_decay) {
            return Err(LinkchartError::Validation(
                "velocity_decay must be between 0.0 and 1.0".into(),
            ));
        }

        if !(0.0..1.0).contains(&self.alpha_decay) {
            return Err(LinkchartError::Validation(
                "alpha_decay must be in [0.0, 1.0)".into(),
            ));
        }

        if self.entity_max_radius < self.entity_base_radius {
            return Err(LinkchartError::Validation(
                "entity_max_radius must be >= entity_base_radius".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResolutionConfig::default();

        assert_eq!(config.containment_min_len, 3);
        assert_eq!(config.containment_shorter_min_len, 4);
        assert_eq!(config.edit_ratio_threshold, 0.20);
        assert_eq!(config.jaccard_threshold, 0.60);
        assert!(config.validate().is_ok());
        assert!(LayoutConfig::default().validate().is_ok());
    }

    #[test]
    fn test_clamping() {
        let config = ResolutionConfig::new()
            .with_edit_ratio_threshold(1.5)
            .with_jaccard_threshold(-0.5);

        assert_eq!(config.edit_ratio_threshold, 1.0);
        assert_eq!(config.jaccard_threshold, 0.0);
    }

    #[test]
    fn test_invalid_config() {
        assert!(ResolutionConfig::new().with_max_universe(1).validate().is_err());

        let layout = LayoutConfig {
            entity_max_radius: 2.0,
            ..LayoutConfig::default()
        };
        assert!(layout.validate().is_err());
        assert!(LayoutConfig::new().with_canvas(0.0, 10.0).validate().is_err());
    }
}
