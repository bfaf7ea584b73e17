//! Lumen replay driver.
//!
//! Reads one JSON `AudioFrame` per line (a file or `-` for stdin), runs each
//! through the conscious engine and prints one JSON `ConsciousnessOutput` per
//! line on stdout. Logs go to stderr and, if configured, a log file.
//!
//! ```text
//! lumen <frames.jsonl> [--config lumen.toml] [--dream] [--no-confirm]
//! ```

mod logging_setup;

use anyhow::{bail, Context, Result};
use lumen_control::{ConsciousEngine, EffectFiredEvent, ScenarioDreamSimulator};
use lumen_core::{AudioFrame, EngineConfig};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const USAGE: &str = "usage: lumen <frames.jsonl|-> [--config lumen.toml] [--dream] [--no-confirm]";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Options {
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    /// Attach the built-in scenario simulator
    dream: bool,
    /// Treat every emitted effect as fired by the fixture
    auto_confirm: bool,
}

impl Options {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Options {
            input: None,
            config: None,
            dream: false,
            auto_confirm: true,
        };
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().context("--config needs a path")?;
                    options.config = Some(PathBuf::from(path));
                }
                "--dream" => options.dream = true,
                "--no-confirm" => options.auto_confirm = false,
                "-h" | "--help" => bail!(USAGE),
                "-" => options.input = None,
                flag if flag.starts_with('-') => bail!("unknown flag {}\n{}", flag, USAGE),
                path => {
                    if options.input.is_some() {
                        bail!("more than one input file\n{}", USAGE);
                    }
                    options.input = Some(PathBuf::from(path));
                }
            }
        }
        Ok(options)
    }
}

/// Frame counters for the closing summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ReplaySummary {
    frames: u64,
    skipped: u64,
    effects: u64,
}

fn parse_frame(line: &str) -> Option<serde_json::Result<AudioFrame>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(serde_json::from_str(line))
}

async fn replay<R, W>(
    engine: &mut ConsciousEngine,
    reader: R,
    out: &mut W,
    auto_confirm: bool,
) -> Result<ReplaySummary>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let confirmations = engine.confirmation_sender();
    let mut summary = ReplaySummary::default();
    let mut lines = reader.lines();
    let mut line_no = 0u64;

    while let Some(line) = lines.next_line().await.context("Failed to read frame")? {
        line_no += 1;
        let frame = match parse_frame(&line) {
            None => continue,
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                warn!("Line {}: not a frame: {}", line_no, e);
                summary.skipped += 1;
                continue;
            }
        };

        let output = engine.process(&frame).await;
        summary.frames += 1;

        if let Some(decision) = &output.effect_decision {
            summary.effects += 1;
            if auto_confirm {
                // Picked up at the start of the next frame
                confirmations.confirm(EffectFiredEvent {
                    id: line_no,
                    effect: decision.effect,
                    timestamp_ms: frame.timestamp_ms,
                })?;
            }
        }

        serde_json::to_writer(&mut *out, &output).context("Failed to encode output")?;
        writeln!(out).context("Failed to write output")?;
    }
    out.flush().context("Failed to flush output")?;
    Ok(summary)
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = Options::parse(std::env::args().skip(1))?;

    let config = match &options.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => EngineConfig::default(),
    };
    let _log_guard = logging_setup::init(&config.log)?;

    info!(
        "Lumen session: vibe={} mood={} dream={}",
        config.session.vibe, config.session.mood, options.dream
    );

    let mut engine = ConsciousEngine::new(config)?;
    if options.dream {
        engine = engine.with_dream_simulator(Arc::new(ScenarioDreamSimulator::new()));
    }

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    let summary = match &options.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {:?}", path))?;
            replay(&mut engine, BufReader::new(file), &mut out, options.auto_confirm).await?
        }
        None => {
            replay(
                &mut engine,
                BufReader::new(tokio::io::stdin()),
                &mut out,
                options.auto_confirm,
            )
            .await?
        }
    };

    let stats = engine.stats();
    info!(
        "Replay done: {} frames ({} skipped), {} effects, {} blocked, {} overrides, {} dreams ({} timed out)",
        summary.frames,
        summary.skipped,
        summary.effects,
        stats.effects_blocked,
        stats.energy_overrides,
        stats.dreams_simulated,
        stats.dream_timeouts
    );
    if let Some(report) = engine.bias_report() {
        info!("Cognitive health {:.2}", report.cognitive_health);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_options() {
        let options = Options::parse(args(&["frames.jsonl", "--config", "lumen.toml", "--dream"])).unwrap();
        assert_eq!(options.input, Some(PathBuf::from("frames.jsonl")));
        assert_eq!(options.config, Some(PathBuf::from("lumen.toml")));
        assert!(options.dream);
        assert!(options.auto_confirm);

        let stdin = Options::parse(args(&["-", "--no-confirm"])).unwrap();
        assert_eq!(stdin.input, None);
        assert!(!stdin.auto_confirm);
    }

    #[test]
    fn test_parse_rejects_bad_args() {
        assert!(Options::parse(args(&["--config"])).is_err());
        assert!(Options::parse(args(&["--loud"])).is_err());
        assert!(Options::parse(args(&["a.jsonl", "b.jsonl"])).is_err());
    }

    #[test]
    fn test_parse_frame_skips_blank_and_comments() {
        assert!(parse_frame("").is_none());
        assert!(parse_frame("   # capture of set 2").is_none());
        assert!(matches!(parse_frame("{not json"), Some(Err(_))));
        let frame = parse_frame(r#"{"energy":0.4,"timestamp_ms":66}"#).unwrap().unwrap();
        assert_eq!(frame.timestamp_ms, 66);
    }

    #[tokio::test]
    async fn test_replay_writes_one_line_per_frame() {
        let input = concat!(
            "{\"energy\":0.2,\"raw_energy\":0.2,\"timestamp_ms\":0}\n",
            "\n",
            "garbage\n",
            "{\"energy\":0.95,\"raw_energy\":0.95,\"timestamp_ms\":33}\n",
        );
        let mut engine = ConsciousEngine::new(EngineConfig::default()).unwrap();
        let mut out = Vec::new();
        let summary = replay(&mut engine, BufReader::new(input.as_bytes()), &mut out, true)
            .await
            .unwrap();

        assert_eq!(summary.frames, 2);
        assert_eq!(summary.skipped, 1);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["source"], "energy_override");
        assert_eq!(lines[1]["timestamp_ms"], 33);
    }
}
