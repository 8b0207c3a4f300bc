use crate::compress::CompressionResult;
use crate::intake::SelectedFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Validating,
    Transforming,
    ReadyForDownload,
    Error,
}

impl PipelineState {
    /// A new file may only be taken in when no job is running.
    pub fn accepts_intake(self) -> bool {
        matches!(
            self,
            PipelineState::Idle | PipelineState::Error | PipelineState::ReadyForDownload
        )
    }
}

/// The one job a pipeline owns: the file being worked on and what came out of it.
#[derive(Debug, Default)]
pub struct Session {
    state: PipelineState,
    file: Option<SelectedFile>,
    result: Option<CompressionResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn result(&self) -> Option<&CompressionResult> {
        self.result.as_ref()
    }

    pub(crate) fn begin(&mut self, file: SelectedFile) {
        self.file = Some(file);
        self.result = None;
        self.state = PipelineState::Validating;
    }

    pub(crate) fn set_transforming(&mut self) {
        self.state = PipelineState::Transforming;
    }

    pub(crate) fn finish(&mut self, result: CompressionResult) {
        self.result = Some(result);
        self.state = PipelineState::ReadyForDownload;
    }

    pub(crate) fn fail(&mut self) {
        self.file = None;
        self.result = None;
        self.state = PipelineState::Error;
    }

    pub(crate) fn clear(&mut self) {
        self.file = None;
        self.result = None;
        self.state = PipelineState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::{validate, CandidateFile, DEFAULT_MAX_BYTES};
    use rstest::rstest;

    #[rstest]
    #[case(PipelineState::Idle, true)]
    #[case(PipelineState::Validating, false)]
    #[case(PipelineState::Transforming, false)]
    #[case(PipelineState::ReadyForDownload, true)]
    #[case(PipelineState::Error, true)]
    fn intake_gate(#[case] state: PipelineState, #[case] accepts: bool) {
        assert_eq!(state.accepts_intake(), accepts);
    }

    #[test]
    fn failure_drops_file_and_result() {
        let mut session = Session::new();
        let candidate =
            CandidateFile::from_bytes("a.pdf", "application/pdf", b"%PDF-1.4".to_vec());
        session.begin(validate(candidate, DEFAULT_MAX_BYTES).unwrap());
        session.set_transforming();
        session.fail();
        assert_eq!(session.state(), PipelineState::Error);
        assert!(session.file().is_none());
        assert!(session.result().is_none());
    }
}
