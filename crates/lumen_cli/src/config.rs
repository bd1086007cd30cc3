//! Page configuration (lumen.toml)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "lumen.toml";

/// Contents of the `lumen.toml` written by `lumen init`
pub const STARTER: &str = r#"# Lumen page description

[viewport]
height = 800.0
frame_interval_ms = 16

[scroll]
throttle_ms = 16
reveal_fraction = 0.8
parallax_factor = 0.5

[[sections]]
name = "hero"
top = 0.0
height = 800.0

[[sections]]
name = "about"
top = 900.0
height = 600.0

[[sections]]
name = "skills"
top = 1600.0
height = 500.0

[[sections]]
name = "projects"
top = 2200.0
height = 700.0

[skills]
section = "skills"
threshold = 0.5
tick_ms = 15

[[skills.items]]
name = "rust"
level = 90

[[skills.items]]
name = "typescript"
level = 75

[tasks]
section = "projects"
threshold = 0.5
duration_ms = 1000

[[tasks.items]]
name = "portfolio"
progress = 80

[timeline]
nodes = 3
step_ms = 500

[cards]
names = ["alpha", "beta"]
hold_ms = 1000

[glitch]
period_ms = 1000
chance = 0.05
hold_ms = 100
seed = 7

[script]
run_ms = 6000

[[script.scroll]]
at_ms = 500
y = 400.0

[[script.scroll]]
at_ms = 1500
y = 1400.0

[[script.scroll]]
at_ms = 3000
y = 2000.0

[[script.clicks]]
at_ms = 4000
card = "alpha"
"#;

/// Description of a page and the scroll script to replay against it
#[derive(Debug, Default, Deserialize)]
pub struct PageConfig {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
    #[serde(default)]
    pub skills: Option<SkillsConfig>,
    #[serde(default)]
    pub tasks: Option<TasksConfig>,
    #[serde(default)]
    pub timeline: Option<TimelineConfig>,
    #[serde(default)]
    pub cards: Option<CardsConfig>,
    #[serde(default)]
    pub glitch: Option<GlitchSettings>,
    #[serde(default)]
    pub script: ScriptConfig,
}

#[derive(Debug, Deserialize)]
pub struct ViewportConfig {
    /// Visible height in pixels
    #[serde(default = "default_viewport_height")]
    pub height: f32,
    /// Display refresh interval used for frame-driven counters
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u32,
}

fn default_viewport_height() -> f32 {
    800.0
}

fn default_frame_interval() -> u32 {
    16
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            height: default_viewport_height(),
            frame_interval_ms: default_frame_interval(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScrollConfig {
    /// Minimum spacing between sampled scroll positions
    #[serde(default = "default_throttle")]
    pub throttle_ms: u32,
    #[serde(default = "default_reveal_fraction")]
    pub reveal_fraction: f32,
    #[serde(default = "default_parallax_factor")]
    pub parallax_factor: f32,
}

fn default_throttle() -> u32 {
    16
}

fn default_reveal_fraction() -> f32 {
    0.8
}

fn default_parallax_factor() -> f32 {
    0.5
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle(),
            reveal_fraction: default_reveal_fraction(),
            parallax_factor: default_parallax_factor(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionConfig {
    pub name: String,
    /// Document offset of the top edge
    pub top: f32,
    pub height: f32,
}

/// Skill bars: each counts up one percent per tick
#[derive(Debug, Deserialize)]
pub struct SkillsConfig {
    pub section: String,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_skill_tick")]
    pub tick_ms: u32,
    #[serde(default)]
    pub items: Vec<SkillItem>,
}

#[derive(Debug, Deserialize)]
pub struct SkillItem {
    pub name: String,
    /// Percent
    pub level: u32,
}

fn default_threshold() -> f32 {
    0.5
}

fn default_skill_tick() -> u32 {
    15
}

/// Task progress: frame-driven counters sharing one duration
#[derive(Debug, Deserialize)]
pub struct TasksConfig {
    pub section: String,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_task_duration")]
    pub duration_ms: u32,
    #[serde(default)]
    pub items: Vec<TaskItem>,
}

#[derive(Debug, Deserialize)]
pub struct TaskItem {
    pub name: String,
    pub progress: u32,
}

fn default_task_duration() -> u32 {
    1000
}

#[derive(Debug, Deserialize)]
pub struct TimelineConfig {
    pub nodes: usize,
    #[serde(default = "default_step")]
    pub step_ms: u32,
    #[serde(default = "default_animation")]
    pub animation: String,
}

fn default_step() -> u32 {
    500
}

fn default_animation() -> String {
    "pulse 2s infinite".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CardsConfig {
    pub names: Vec<String>,
    /// How long a clicked card stays spun
    #[serde(default = "default_card_hold")]
    pub hold_ms: u32,
}

fn default_card_hold() -> u32 {
    1000
}

#[derive(Debug, Deserialize)]
pub struct GlitchSettings {
    #[serde(default = "default_glitch_period")]
    pub period_ms: u32,
    #[serde(default = "default_glitch_chance")]
    pub chance: f32,
    #[serde(default = "default_glitch_hold")]
    pub hold_ms: u32,
    /// Fixed seed for reproducible runs; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_glitch_period() -> u32 {
    1000
}

fn default_glitch_chance() -> f32 {
    0.05
}

fn default_glitch_hold() -> u32 {
    100
}

impl Default for GlitchSettings {
    fn default() -> Self {
        Self {
            period_ms: default_glitch_period(),
            chance: default_glitch_chance(),
            hold_ms: default_glitch_hold(),
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScriptConfig {
    /// Total simulated time
    #[serde(default = "default_run")]
    pub run_ms: u64,
    #[serde(default)]
    pub scroll: Vec<ScrollStep>,
    #[serde(default)]
    pub clicks: Vec<ClickStep>,
}

fn default_run() -> u64 {
    5000
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            run_ms: default_run(),
            scroll: Vec::new(),
            clicks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrollStep {
    pub at_ms: u64,
    pub y: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClickStep {
    pub at_ms: u64,
    pub card: String,
}

impl PageConfig {
    /// Load `lumen.toml` from a directory
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = path.join(CONFIG_FILE);

        if !config_path.exists() {
            anyhow::bail!(
                "No {} found in {}. Run `lumen init` to create one.",
                CONFIG_FILE,
                path.display()
            );
        }

        Self::load(&config_path)
    }

    /// Load a page description from a file
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: PageConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(config)
    }

    /// Look up a section by name
    pub fn section(&self, name: &str) -> Option<&SectionConfig> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Collect every problem with this config
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.viewport.height.is_nan() || self.viewport.height <= 0.0 {
            problems.push(format!(
                "viewport.height must be positive, got {}",
                self.viewport.height
            ));
        }
        if self.viewport.frame_interval_ms == 0 {
            problems.push("viewport.frame_interval_ms must be at least 1".to_string());
        }
        if self.scroll.throttle_ms == 0 {
            problems.push("scroll.throttle_ms must be at least 1".to_string());
        }
        check_ratio(&mut problems, "scroll.reveal_fraction", self.scroll.reveal_fraction);
        if !self.scroll.parallax_factor.is_finite() {
            problems.push(format!(
                "scroll.parallax_factor must be a finite number, got {}",
                self.scroll.parallax_factor
            ));
        }

        let mut names = HashSet::new();
        for section in &self.sections {
            if !names.insert(section.name.as_str()) {
                problems.push(format!("section '{}' is defined twice", section.name));
            }
            if section.height < 0.0 {
                problems.push(format!("section '{}' has a negative height", section.name));
            }
        }

        if let Some(skills) = &self.skills {
            self.check_section(&mut problems, "skills", &skills.section);
            check_ratio(&mut problems, "skills.threshold", skills.threshold);
            if skills.tick_ms == 0 {
                problems.push("skills.tick_ms must be at least 1".to_string());
            }
            for item in &skills.items {
                if !(1..=100).contains(&item.level) {
                    problems.push(format!(
                        "skill '{}' has level {}, expected 1 to 100",
                        item.name, item.level
                    ));
                }
            }
        }

        if let Some(tasks) = &self.tasks {
            self.check_section(&mut problems, "tasks", &tasks.section);
            check_ratio(&mut problems, "tasks.threshold", tasks.threshold);
            if tasks.duration_ms < self.viewport.frame_interval_ms {
                problems.push(format!(
                    "tasks.duration_ms ({}) is shorter than one frame ({}ms)",
                    tasks.duration_ms, self.viewport.frame_interval_ms
                ));
            }
        }

        if let Some(glitch) = &self.glitch {
            check_ratio(&mut problems, "glitch.chance", glitch.chance);
            if glitch.period_ms == 0 {
                problems.push("glitch.period_ms must be at least 1".to_string());
            }
        }

        let cards: Vec<&str> = self
            .cards
            .iter()
            .flat_map(|c| c.names.iter().map(String::as_str))
            .collect();
        for click in &self.script.clicks {
            if !cards.contains(&click.card.as_str()) {
                problems.push(format!(
                    "click at {}ms targets unknown card '{}'",
                    click.at_ms, click.card
                ));
            }
        }

        problems
    }

    /// Fail with every problem listed
    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            return Ok(());
        }
        anyhow::bail!("Invalid page config:\n  {}", problems.join("\n  "));
    }

    fn check_section(&self, problems: &mut Vec<String>, table: &str, name: &str) {
        if self.section(name).is_none() {
            problems.push(format!("{}.section refers to unknown section '{}'", table, name));
        }
    }
}

fn check_ratio(problems: &mut Vec<String>, field: &str, value: f32) {
    if !(0.0..=1.0).contains(&value) {
        problems.push(format!("{} must be within [0, 1], got {}", field, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_tables() {
        let config: PageConfig = toml::from_str(
            r#"
            [[sections]]
            name = "hero"
            top = 0
            height = 600
            "#,
        )
        .unwrap();

        assert_eq!(config.viewport.height, 800.0);
        assert_eq!(config.scroll.reveal_fraction, 0.8);
        assert_eq!(config.scroll.parallax_factor, 0.5);
        assert_eq!(config.script.run_ms, 5000);
        assert!(config.skills.is_none());
        assert!(config.problems().is_empty());
    }

    #[test]
    fn test_parses_nested_items() {
        let config: PageConfig = toml::from_str(
            r#"
            [[sections]]
            name = "skills"
            top = 1200
            height = 400

            [skills]
            section = "skills"

            [[skills.items]]
            name = "rust"
            level = 90

            [tasks]
            section = "skills"
            duration_ms = 2000

            [[tasks.items]]
            name = "site"
            progress = 40

            [glitch]
            seed = 3

            [[script.scroll]]
            at_ms = 100
            y = 500
            "#,
        )
        .unwrap();

        let skills = config.skills.as_ref().unwrap();
        assert_eq!(skills.tick_ms, 15);
        assert_eq!(skills.threshold, 0.5);
        assert_eq!(skills.items[0].level, 90);
        assert_eq!(config.tasks.as_ref().unwrap().duration_ms, 2000);
        assert_eq!(config.glitch.as_ref().unwrap().chance, 0.05);
        assert_eq!(config.glitch.as_ref().unwrap().seed, Some(3));
        assert_eq!(config.script.scroll[0].y, 500.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_problems_reported() {
        let config: PageConfig = toml::from_str(
            r#"
            [scroll]
            reveal_fraction = 1.5

            [[sections]]
            name = "a"
            top = 0
            height = 100

            [[sections]]
            name = "a"
            top = 200
            height = 100

            [skills]
            section = "missing"

            [[script.clicks]]
            at_ms = 10
            card = "ghost"
            "#,
        )
        .unwrap();

        let problems = config.problems();
        assert_eq!(problems.len(), 4);
        assert!(problems.iter().any(|p| p.contains("reveal_fraction")));
        assert!(problems.iter().any(|p| p.contains("defined twice")));
        assert!(problems.iter().any(|p| p.contains("'missing'")));
        assert!(problems.iter().any(|p| p.contains("'ghost'")));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_parallax_rejected() {
        let mut config = PageConfig::default();
        config.scroll.parallax_factor = f32::NAN;
        assert!(config.problems()[0].contains("parallax_factor"));

        config.scroll.parallax_factor = f32::INFINITY;
        assert_eq!(config.problems().len(), 1);

        config.scroll.parallax_factor = -0.25;
        assert!(config.problems().is_empty());
    }

    #[test]
    fn test_starter_is_valid() {
        let starter: PageConfig = toml::from_str(STARTER).unwrap();
        assert!(starter.problems().is_empty());
        assert_eq!(starter.sections.len(), 4);
        assert_eq!(starter.timeline.as_ref().unwrap().animation, "pulse 2s infinite");
        assert_eq!(starter.script.clicks[0].card, "alpha");
    }

    #[test]
    fn test_missing_file_mentions_init() {
        let dir = std::env::temp_dir().join("lumen-config-missing-dir");
        let err = PageConfig::load_from_dir(&dir).unwrap_err();
        assert!(err.to_string().contains("lumen init"));
    }
}
