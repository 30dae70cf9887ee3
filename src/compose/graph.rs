//! Typed construction of the ffmpeg `-filter_complex` graph.
//!
//! Input 0 is the narration and input 1 the background track. The rendered
//! graph ends in the [`MIX_LABEL`] pad, which the engine maps to the output.

use crate::defaults;
use std::fmt;

/// Pad carrying the final mix.
pub const MIX_LABEL: &str = "mix";

/// One audio filter with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Change playback speed without changing pitch.
    Tempo(f64),
    /// Delay every channel (stereo) by the given milliseconds.
    Delay { millis: u64 },
    /// Append this many seconds of silence.
    PadBy { secs: u32 },
    /// Pad with silence until the stream is this long.
    PadTo { secs: u32 },
    /// Keep only `[start, end)` seconds.
    Trim { start: u32, end: u32 },
    ResetTimestamps,
    Volume(f64),
    FadeIn { start: u32, duration: u32 },
    Loop { count: u32, size: u64 },
    /// Join `segments` audio streams end to end.
    Concat { segments: usize },
    /// Mix `inputs` streams; the result is as long as the first input.
    Mix { inputs: usize },
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Tempo(factor) => write!(f, "atempo={factor}"),
            Filter::Delay { millis } => write!(f, "adelay={millis}|{millis}"),
            Filter::PadBy { secs } => write!(f, "apad=pad_dur={secs}"),
            Filter::PadTo { secs } => write!(f, "apad=whole_dur={secs}"),
            Filter::Trim { start, end } => write!(f, "atrim={start}:{end}"),
            Filter::ResetTimestamps => write!(f, "asetpts=PTS-STARTPTS"),
            Filter::Volume(level) => write!(f, "volume={level}"),
            Filter::FadeIn { start, duration } => {
                write!(f, "afade=t=in:st={start}:d={duration}")
            }
            Filter::Loop { count, size } => write!(f, "aloop=loop={count}:size={size}"),
            Filter::Concat { segments } => write!(f, "concat=n={segments}:v=0:a=1"),
            Filter::Mix { inputs } => {
                let weights = vec!["1"; *inputs].join(" ");
                write!(
                    f,
                    "amix=inputs={inputs}:duration=first:dropout_transition=0:weights='{weights}'"
                )
            }
        }
    }
}

/// A filter chain from labelled input pads to one labelled output pad.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub inputs: Vec<String>,
    pub filters: Vec<Filter>,
    pub output: String,
}

impl Stage {
    pub fn new(inputs: &[&str], filters: Vec<Filter>, output: &str) -> Self {
        Self {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            filters,
            output: output.to_string(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for input in &self.inputs {
            write!(f, "[{input}]")?;
        }
        let chain = self
            .filters
            .iter()
            .map(Filter::to_string)
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "{chain}[{}]", self.output)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterGraph {
    stages: Vec<Stage>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// The `-filter_complex` argument.
    pub fn render(&self) -> String {
        self.stages
            .iter()
            .map(Stage::to_string)
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// The fixed meditation mix.
///
/// Slowed narration starts after a background-only intro and is followed by
/// trailing silence. The background fades in during the intro, then loops
/// quietly underneath. Output length follows the narration branch.
pub fn meditation_graph() -> FilterGraph {
    let intro_millis = u64::from(defaults::INTRO_SECS) * 1000;

    FilterGraph::new()
        .stage(Stage::new(
            &["0:a"],
            vec![Filter::Tempo(defaults::NARRATION_TEMPO)],
            "speech_slow",
        ))
        .stage(Stage::new(
            &["speech_slow"],
            vec![
                Filter::Delay {
                    millis: intro_millis,
                },
                Filter::PadBy {
                    secs: defaults::OUTRO_PAD_SECS,
                },
            ],
            "speech_delayed",
        ))
        .stage(Stage::new(
            &["1:a"],
            vec![
                Filter::Trim {
                    start: 0,
                    end: defaults::INTRO_SECS,
                },
                Filter::ResetTimestamps,
                Filter::Volume(defaults::INTRO_VOLUME),
                Filter::FadeIn {
                    start: 0,
                    duration: defaults::INTRO_FADE_SECS,
                },
            ],
            "intro",
        ))
        .stage(Stage::new(
            &["1:a"],
            vec![
                Filter::Loop {
                    count: defaults::BACKGROUND_LOOPS,
                    size: defaults::BACKGROUND_LOOP_SIZE,
                },
                Filter::Volume(defaults::BED_VOLUME),
            ],
            "bg_looped",
        ))
        .stage(Stage::new(
            &["intro"],
            vec![Filter::PadTo {
                secs: defaults::INTRO_SECS,
            }],
            "intro_padded",
        ))
        .stage(Stage::new(
            &["intro_padded", "bg_looped"],
            vec![Filter::Concat { segments: 2 }],
            "bg_full",
        ))
        .stage(Stage::new(
            &["speech_delayed", "bg_full"],
            vec![Filter::Mix { inputs: 2 }],
            MIX_LABEL,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_renders_pads_and_chain() {
        let stage = Stage::new(
            &["a", "b"],
            vec![Filter::Volume(0.5), Filter::ResetTimestamps],
            "out",
        );
        assert_eq!(stage.to_string(), "[a][b]volume=0.5,asetpts=PTS-STARTPTS[out]");
    }

    #[test]
    fn meditation_graph_renders_expected_stages() {
        let graph = meditation_graph();
        let stages: Vec<String> = graph.stages().iter().map(Stage::to_string).collect();

        assert_eq!(
            stages,
            vec![
                "[0:a]atempo=0.85[speech_slow]",
                "[speech_slow]adelay=5000|5000,apad=pad_dur=10[speech_delayed]",
                "[1:a]atrim=0:5,asetpts=PTS-STARTPTS,volume=0.25,afade=t=in:st=0:d=3[intro]",
                "[1:a]aloop=loop=20:size=2147483647,volume=0.05[bg_looped]",
                "[intro]apad=whole_dur=5[intro_padded]",
                "[intro_padded][bg_looped]concat=n=2:v=0:a=1[bg_full]",
                "[speech_delayed][bg_full]amix=inputs=2:duration=first:dropout_transition=0:weights='1 1'[mix]",
            ]
        );
        assert_eq!(graph.render(), stages.join(";"));
    }

    #[test]
    fn every_consumed_pad_is_produced_or_an_input() {
        let graph = meditation_graph();
        let mut produced = vec!["0:a".to_string(), "1:a".to_string()];
        for stage in graph.stages() {
            for input in &stage.inputs {
                assert!(produced.contains(input), "pad {input} used before defined");
            }
            produced.push(stage.output.clone());
        }
        assert_eq!(produced.last().map(String::as_str), Some(MIX_LABEL));
    }
}
