use anyhow::Result;
use knowgraph_core::{Group, Viewport, VisibilityFilter};
use std::ffi::OsString;
use std::path::PathBuf;

/// How the frame clock advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// Every frame is exactly one tick interval apart; runs as fast as possible.
    Virtual,
    /// Frames follow the wall clock at the host refresh rate.
    Realtime,
}

impl ClockMode {
    pub fn parse(input: &str) -> Result<Self> {
        match input {
            "virtual" => Ok(Self::Virtual),
            "realtime" => Ok(Self::Realtime),
            _ => anyhow::bail!("invalid clock: {input} (expected virtual|realtime)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub dataset: Option<PathBuf>,
    pub groups: Vec<Group>,
    pub max_ticks: u64,
    pub seed: Option<u64>,
    pub clock: ClockMode,
    pub viewport: Viewport,
    pub out: Option<PathBuf>,
}

impl SimConfig {
    pub fn filter(&self) -> VisibilityFilter {
        if self.groups.is_empty() {
            VisibilityFilter::all()
        } else {
            VisibilityFilter::only(self.groups.iter().copied())
        }
    }
}

pub const DEFAULT_MAX_TICKS: u64 = 5_000;

pub fn parse_args() -> Result<SimConfig> {
    parse_args_from(std::env::args_os().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<SimConfig>
where
    I: IntoIterator<Item = OsString>,
{
    let mut dataset = None;
    let mut groups = Vec::new();
    let mut max_ticks = DEFAULT_MAX_TICKS;
    let mut seed = None;
    let mut clock = ClockMode::Virtual;
    let mut viewport = Viewport::new(1280.0, 720.0);
    let mut out = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if arg == "--dataset" {
            let Some(path) = args.next() else {
                anyhow::bail!("--dataset expects a path");
            };
            dataset = Some(PathBuf::from(path));
        } else if arg == "--group" {
            let Some(value) = args.next() else {
                anyhow::bail!("--group expects a group name");
            };
            groups.push(Group::parse(&value.to_string_lossy())?);
        } else if arg == "--max-ticks" {
            let Some(value) = args.next() else {
                anyhow::bail!("--max-ticks expects a number");
            };
            let value = value.to_string_lossy();
            max_ticks = value
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid --max-ticks: {value}"))?;
        } else if arg == "--seed" {
            let Some(value) = args.next() else {
                anyhow::bail!("--seed expects a number");
            };
            let value = value.to_string_lossy();
            seed = Some(
                value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("invalid --seed: {value}"))?,
            );
        } else if arg == "--clock" {
            let Some(value) = args.next() else {
                anyhow::bail!("--clock expects virtual|realtime");
            };
            clock = ClockMode::parse(&value.to_string_lossy())?;
        } else if arg == "--viewport" {
            let Some(value) = args.next() else {
                anyhow::bail!("--viewport expects WIDTHxHEIGHT");
            };
            viewport = parse_viewport(&value.to_string_lossy())?;
        } else if arg == "--out" {
            let Some(path) = args.next() else {
                anyhow::bail!("--out expects a path");
            };
            out = Some(PathBuf::from(path));
        } else {
            anyhow::bail!("unknown argument: {:?}", arg);
        }
    }

    Ok(SimConfig {
        dataset,
        groups,
        max_ticks,
        seed,
        clock,
        viewport,
        out,
    })
}

fn parse_viewport(input: &str) -> Result<Viewport> {
    let Some((w, h)) = input.split_once('x') else {
        anyhow::bail!("invalid viewport: {input} (expected WIDTHxHEIGHT)");
    };
    let (Ok(w), Ok(h)) = (w.parse::<f32>(), h.parse::<f32>()) else {
        anyhow::bail!("invalid viewport: {input} (expected WIDTHxHEIGHT)");
    };
    if !(w > 0.0 && h > 0.0) {
        anyhow::bail!("viewport must be positive: {input}");
    }
    Ok(Viewport::new(w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn defaults_show_every_group() {
        let config = parse_args_from(Vec::<OsString>::new()).expect("config parsed");
        assert_eq!(config.max_ticks, DEFAULT_MAX_TICKS);
        assert_eq!(config.clock, ClockMode::Virtual);
        assert_eq!(config.filter(), VisibilityFilter::all());
        assert!(config.dataset.is_none());
    }

    #[test]
    fn repeated_group_flags_build_filter() {
        let config = parse_args_from(args(&["--group", "crm", "--group", "erp", "--seed", "7"]))
            .expect("config parsed");
        assert_eq!(config.filter(), VisibilityFilter::only([Group::Crm, Group::Erp]));
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn viewport_and_clock_flags() {
        let config = parse_args_from(args(&["--viewport", "640x480", "--clock", "realtime"]))
            .expect("config parsed");
        assert_eq!(config.viewport, Viewport::new(640.0, 480.0));
        assert_eq!(config.clock, ClockMode::Realtime);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_args_from(args(&["--group", "marketing"])).is_err());
        assert!(parse_args_from(args(&["--max-ticks", "lots"])).is_err());
        assert!(parse_args_from(args(&["--viewport", "0x10"])).is_err());
        assert!(parse_args_from(args(&["--dataset"])).is_err());
        assert!(parse_args_from(args(&["--verbose"])).is_err());
    }
}
