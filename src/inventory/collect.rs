use super::{Facts, InventorySource, MONITORS_KEY, normalize};
use crate::config::DetectionConfig;
use crate::error::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::process::Command;
use std::time::{Duration, Instant};

/// Runs the external inventory tool and turns its `key:value` output into
/// normalized facts.
#[derive(Debug, Clone)]
pub struct Collector<'a> {
    detection: &'a DetectionConfig,
}

impl<'a> Collector<'a> {
    pub fn new(detection: &'a DetectionConfig) -> Self {
        Self { detection }
    }

    /// Run the detection command and return its stdout.
    fn fetch(&self) -> Result<String> {
        let spinner = spinner(&self.detection.program);
        let started = Instant::now();

        let output = Command::new(&self.detection.program)
            .args(&self.detection.args)
            .output();

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        tracing::info!("fetching took {}ms", started.elapsed().as_millis());

        let output = output.map_err(|e| {
            Error::Detection(format!("failed to run {}: {}", self.detection.program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Detection(format!(
                "{} exited with {}: {}",
                self.detection.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Parse raw tool output into normalized facts, including the
    /// synthetic monitor count.
    pub fn parse(&self, output: &str) -> Facts {
        let mut raw: BTreeMap<String, String> = BTreeMap::new();
        let mut monitors = 0u32;

        for line in output.trim().lines() {
            if line.starts_with(&self.detection.display_marker) {
                match display_height(line) {
                    Some(h) if h >= self.detection.min_display_height => monitors += 1,
                    Some(h) => tracing::debug!(height = h, "skipping small display: {}", line),
                    None => tracing::debug!("skipping display without resolution: {}", line),
                }
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            raw.insert(key.to_lowercase(), value.trim().to_string());
        }

        raw.insert(MONITORS_KEY.to_string(), monitors.to_string());
        normalize(&raw)
    }
}

impl InventorySource for Collector<'_> {
    fn collect(&self) -> Result<Facts> {
        let output = self.fetch()?;
        Ok(self.parse(&output))
    }
}

/// Height of the first `WIDTHxHEIGHT` token on a display line.
/// At most four digits are read after the `x`.
fn display_height(line: &str) -> Option<u32> {
    line.split_whitespace().find_map(|token| {
        let (width, rest) = token.split_once('x')?;
        if width.is_empty() || !width.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let digits: String = rest
            .chars()
            .take(4)
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    })
}

fn spinner(program: &str) -> Option<ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Fetching hardware with {}...", program));
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}
