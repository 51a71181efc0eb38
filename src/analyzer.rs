use std::path::Path;

use tracing::{debug, error};

use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::f0::{F0Extractor, F0Series, PyinExtractor};
use crate::report::AnalysisResult;
use crate::stats::{self, PitchSummary};
use crate::wav::AudioBuffer;

/// Runs the whole pipeline for one file: load, extract f0, summarize.
///
/// Every call owns its buffers and its result, so one analyzer can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct PitchAnalyzer {
    config: AnalyzerConfig,
}

impl PitchAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Loads `path` and returns its f0 contour.
    pub fn contour<P: AsRef<Path>>(&self, path: P) -> Result<F0Series> {
        let audio = AudioBuffer::load(path)?;
        PyinExtractor::new(self.config.clone()).extract(&audio)
    }

    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> Result<PitchSummary> {
        self.analyze_with(path, |_| ())
    }

    /// Like [`analyze()`](Self::analyze), handing the f0 contour to `inspect` before it is summarized.
    pub fn analyze_with<P, F>(&self, path: P, inspect: F) -> Result<PitchSummary>
    where
        P: AsRef<Path>,
        F: FnOnce(&F0Series),
    {
        let series = self.contour(path)?;
        inspect(&series);
        stats::summarize(series.f0().view())
    }

    /// Like [`analyze()`](Self::analyze), but failures are folded into the result.
    pub fn report<P: AsRef<Path>>(&self, path: P) -> AnalysisResult {
        self.report_with(path, |_| ())
    }

    pub fn report_with<P, F>(&self, path: P, inspect: F) -> AnalysisResult
    where
        P: AsRef<Path>,
        F: FnOnce(&F0Series),
    {
        let path = path.as_ref();
        match self.analyze_with(path, inspect) {
            Ok(summary) => {
                debug!(path = %path.display(), ?summary, "analysis done");
                AnalysisResult::success(summary)
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    status = e.status(),
                    detail = %e.detail(),
                    "{e}"
                );
                AnalysisResult::failure(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use hound::{SampleFormat, WavSpec, WavWriter};

    use super::*;

    fn write_sine(path: &Path, freq: f64, secs: f64) {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for i in 0..(16000. * secs) as usize {
            let x = 0.5 * (2. * PI * freq * i as f64 / 16000.).sin();
            writer.write_sample((x * i16::MAX as f64) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_report_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a3.wav");
        write_sine(&path, 220., 0.5);

        let result = PitchAnalyzer::default().report(&path);
        assert!(result.is_success(), "{result:?}");
        assert_eq!(result.comment, "success");
        let summary = result.summary().unwrap();
        assert!(summary.pitch1 > 0. && summary.pitch1 <= 230.);
        assert!(summary.pitch2 >= 0.);
    }

    #[test]
    fn test_inspect_sees_contour() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a3.wav");
        write_sine(&path, 220., 0.5);

        let mut n_frames = 0;
        let result = PitchAnalyzer::default().report_with(&path, |series| {
            n_frames = series.n_frames();
        });
        assert!(result.is_success());
        assert_eq!(n_frames, 101);
    }

    #[test]
    fn test_report_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = PitchAnalyzer::default().report(dir.path().join("missing.wav"));
        assert_eq!(result.status, 1000);
        assert_eq!(result.comment, "Error : file not found");
        assert_eq!(result.summary(), None);
    }

    #[test]
    fn test_report_too_short() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blip.wav");
        // 10 ms gives 3 frames, too few for pitch 4
        write_sine(&path, 220., 0.01);
        let result = PitchAnalyzer::default().report(&path);
        assert!(!result.is_success());
    }
}
