use std::process::Command;
use tracing::{debug, warn};

/// Fallback when every probe fails. Matches the most common desktop size.
pub const DEFAULT_RESOLUTION: (u32, u32) = (1920, 1080);

/// Capability interface for querying the primary monitor.
///
/// Tests substitute a fake implementation returning fixed dimensions.
pub trait DisplayInfo: Send + Sync {
    /// Physical pixel dimensions of the primary display. Never fails;
    /// detection problems degrade to [`DEFAULT_RESOLUTION`].
    fn primary_resolution(&self) -> (u32, u32);
}

/// Probes the running compositor via external tools: `swww query` first,
/// then `xrandr --current`, then the fixed default.
pub struct SystemDisplay;

impl DisplayInfo for SystemDisplay {
    fn primary_resolution(&self) -> (u32, u32) {
        if let Some(res) = query_swww() {
            debug!(width = res.0, height = res.1, "resolution from swww");
            return res;
        }
        if let Some(res) = query_xrandr() {
            debug!(width = res.0, height = res.1, "resolution from xrandr");
            return res;
        }
        warn!("display detection failed, assuming 1920x1080");
        DEFAULT_RESOLUTION
    }
}

fn query_swww() -> Option<(u32, u32)> {
    let output = Command::new("swww").arg("query").output().ok()?;
    if !output.status.success() {
        return None;
    }
    parse_swww_query(&String::from_utf8_lossy(&output.stdout))
}

fn query_xrandr() -> Option<(u32, u32)> {
    let output = Command::new("xrandr").arg("--current").output().ok()?;
    if !output.status.success() {
        return None;
    }
    parse_xrandr(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `swww query` output. One line per output, e.g.
/// `eDP-1: 1920x1080, scale: 1, currently displaying: image: ...`
/// The first output is treated as primary.
fn parse_swww_query(text: &str) -> Option<(u32, u32)> {
    for line in text.lines() {
        let Some((_, after_colon)) = line.split_once(": ") else {
            continue;
        };
        let mode = after_colon.split(',').next().unwrap_or("").trim();
        if let Some(res) = parse_mode(mode) {
            return Some(res);
        }
    }
    None
}

/// Parse `xrandr --current` output. The active mode line carries a `*`,
/// e.g. `   1920x1080     60.00*+  59.94`.
fn parse_xrandr(text: &str) -> Option<(u32, u32)> {
    for line in text.lines() {
        if !line.contains('*') {
            continue;
        }
        if let Some(mode) = line.split_whitespace().next() {
            if let Some(res) = parse_mode(mode) {
                return Some(res);
            }
        }
    }
    None
}

/// Parse a `WIDTHxHEIGHT` mode string.
fn parse_mode(mode: &str) -> Option<(u32, u32)> {
    let (w, h) = mode.split_once('x')?;
    let width = w.trim().parse().ok()?;
    let height = h.trim().parse().ok()?;
    Some((width, height))
}

/// Fixed-size display for tests.
#[cfg(test)]
pub struct FakeDisplay(pub u32, pub u32);

#[cfg(test)]
impl DisplayInfo for FakeDisplay {
    fn primary_resolution(&self) -> (u32, u32) {
        (self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_swww_query_output() {
        let text = "eDP-1: 1920x1080, scale: 1, currently displaying: image: /tmp/a.jpg\n\
                    HDMI-A-1: 3840x2160, scale: 1, currently displaying: color: 000000\n";
        assert_eq!(parse_swww_query(text), Some((1920, 1080)));
    }

    #[test]
    fn parses_xrandr_current_mode() {
        let text = "Screen 0: minimum 320 x 200, current 2560 x 1440, maximum 16384 x 16384\n\
                    DP-1 connected primary 2560x1440+0+0 (normal left inverted) 597mm x 336mm\n\
                    \x20  2560x1440     59.95*+\n\
                    \x20  1920x1080     60.00    59.94\n";
        assert_eq!(parse_xrandr(text), Some((2560, 1440)));
    }

    #[test]
    fn garbage_yields_none() {
        assert_eq!(parse_swww_query("no outputs"), None);
        assert_eq!(parse_xrandr(""), None);
        assert_eq!(parse_mode("axb"), None);
    }

    #[test]
    fn fake_display_reports_fixed_size() {
        let display = FakeDisplay(1366, 768);
        assert_eq!(display.primary_resolution(), (1366, 768));
    }
}
