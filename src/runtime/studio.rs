//! The studio event loop
//!
//! Single-threaded and cooperative: the model is only touched from the
//! thread that owns the [`Studio`]. Renders and file reads run on worker
//! threads and re-enter as messages through an mpsc channel; the debounce
//! timer is a single deadline checked by [`Studio::pump`].

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crate::commands::Cmd;
use crate::config::{EditorEnvironment, StudioConfig};
use crate::error::Result;
use crate::messages::{BufferMsg, Msg, PaletteMsg, PipelineMsg, PreviewMsg};
use crate::model::{CanonicalSource, FileId, FileSummary, PreviewState, SourceFile, StudioModel};
use crate::palette::ColorToken;
use crate::preview::Renderer;
use crate::update::update;

use super::editor::{EditorSurface, HeadlessEditor};

/// The armed debounce timer
#[derive(Debug, Clone, Copy)]
struct PublishTimer {
    ticket: u64,
    deadline: Instant,
}

pub struct Studio {
    model: StudioModel,
    renderer: Renderer,
    editor: Box<dyn EditorSurface>,
    msg_tx: Sender<Msg>,
    msg_rx: Receiver<Msg>,
    timer: Option<PublishTimer>,
    /// Background jobs whose result message has not arrived yet
    outstanding: usize,
}

impl Studio {
    /// Start a session with the standard host scope
    ///
    /// The seeded default file is published right away, so a preview is on
    /// its way as soon as this returns.
    pub fn new(config: StudioConfig, editor: Box<dyn EditorSurface>) -> Self {
        Self::with_renderer(config, Renderer::standard(), editor)
    }

    pub fn with_renderer(
        config: StudioConfig,
        renderer: Renderer,
        editor: Box<dyn EditorSurface>,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();
        tracing::debug!(
            debounce_ms = config.debounce_ms,
            file = %config.default_file_name,
            "starting studio session"
        );
        let mut studio = Self {
            model: StudioModel::new(config),
            renderer,
            editor,
            msg_tx,
            msg_rx,
            timer: None,
            outstanding: 0,
        };
        let publish = crate::update::publish_active(&mut studio.model);
        let active = studio.model.buffers.active();
        let show = Cmd::SetEditorText {
            file_id: active.id,
            text: active.text(),
        };
        studio.process_cmd(Cmd::batch(vec![publish, show]));
        studio
    }

    /// Session backed by a [`HeadlessEditor`]; returns a handle to it
    pub fn headless(config: StudioConfig) -> (Self, HeadlessEditor) {
        let editor = HeadlessEditor::new();
        let studio = Self::new(config, Box::new(editor.clone()));
        (studio, editor)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Summaries of all files in insertion order
    pub fn list_files(&self) -> Vec<FileSummary> {
        self.model.buffers.list_files()
    }

    pub fn active(&self) -> &SourceFile {
        self.model.buffers.active()
    }

    /// Switch files; publishes the new file's source synchronously
    pub fn set_active(&mut self, id: FileId) -> Result<()> {
        self.dispatch(Msg::Buffer(BufferMsg::SetActive(id)))
    }

    /// Import `(name, text)` pairs; the last becomes active
    pub fn import_files<N, T>(&mut self, files: Vec<(N, T)>) -> Result<Vec<FileId>>
    where
        N: Into<String>,
        T: Into<String>,
    {
        let before = self.model.buffers.len();
        let files = files
            .into_iter()
            .map(|(name, text)| (name.into(), text.into()))
            .collect();
        self.dispatch(Msg::Buffer(BufferMsg::Import(files)))?;
        Ok(self.model.buffers.files()[before..]
            .iter()
            .map(|f| f.id)
            .collect())
    }

    /// Read files in the background and import them when all reads finish
    pub fn import_paths(&mut self, paths: Vec<PathBuf>) -> Result<()> {
        self.dispatch(Msg::Buffer(BufferMsg::ImportPaths(paths)))
    }

    /// A change to the active file, as reported by the editor widget
    pub fn edit(&mut self, text: impl Into<String>) -> Result<()> {
        self.dispatch(Msg::Buffer(BufferMsg::Edit(text.into())))
    }

    /// Replace every occurrence of `old` in a file; returns the count
    pub fn substitute(&mut self, id: FileId, old: &str, new: &str) -> Result<usize> {
        self.dispatch(Msg::Palette(PaletteMsg::Substitute {
            file_id: id,
            old: old.to_string(),
            new: new.to_string(),
        }))?;
        Ok(self.last_replaced())
    }

    /// Pick a detected token for editing; false if no such token exists
    pub fn select_token(&mut self, text: &str) -> Result<bool> {
        self.dispatch(Msg::Palette(PaletteMsg::Select(text.to_string())))?;
        Ok(self.model.palette.selected().is_some_and(|t| t.text == text))
    }

    /// Rewrite the selected token to `new` in the active file
    ///
    /// Returns the number of replaced occurrences, 0 without a selection.
    pub fn apply_color(&mut self, new: &str) -> Result<usize> {
        if self.model.palette.selected().is_none() {
            return Ok(0);
        }
        self.dispatch(Msg::Palette(PaletteMsg::ApplyColor(new.to_string())))?;
        Ok(self.last_replaced())
    }

    /// Color tokens of the current canonical source
    pub fn tokens(&self) -> &[ColorToken] {
        self.model.palette.tokens()
    }

    /// Replacement candidates for the selected token
    pub fn variants(&self) -> Vec<String> {
        self.model.palette.variants()
    }

    pub fn preview(&self) -> &PreviewState {
        &self.model.preview
    }

    pub fn canonical(&self) -> Option<&CanonicalSource> {
        self.model.pipeline.current()
    }

    pub fn model(&self) -> &StudioModel {
        &self.model
    }

    pub fn editor_environment(&self) -> &EditorEnvironment {
        &self.model.config.editor
    }

    fn last_replaced(&self) -> usize {
        self.model
            .palette
            .last_substitution()
            .map_or(0, |r| r.replaced)
    }

    // =========================================================================
    // Event loop
    // =========================================================================

    /// Run a message through `update` and execute the resulting command
    pub fn dispatch(&mut self, msg: Msg) -> Result<()> {
        if let Some(cmd) = update(&mut self.model, msg)? {
            self.process_cmd(cmd);
        }
        Ok(())
    }

    /// Handle everything that is ready now: arrived messages and an expired
    /// debounce timer. Never blocks. Returns the number of messages handled.
    pub fn pump(&mut self) -> Result<usize> {
        let mut handled = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.receive(msg)?;
            handled += 1;
        }
        if let Some(timer) = self.timer {
            if Instant::now() >= timer.deadline {
                self.fire_timer(timer)?;
                handled += 1;
            }
        }
        Ok(handled)
    }

    /// Fire the armed debounce timer now instead of waiting for it
    pub fn flush_pending(&mut self) -> Result<()> {
        match self.timer {
            Some(timer) => self.fire_timer(timer),
            None => Ok(()),
        }
    }

    /// No armed timer and no background job outstanding
    pub fn is_idle(&self) -> bool {
        self.timer.is_none() && self.outstanding == 0
    }

    /// Drive the loop until idle or until `timeout` passes
    ///
    /// Returns whether the studio went idle.
    pub fn run_until_idle(&mut self, timeout: Duration) -> Result<bool> {
        let give_up = Instant::now() + timeout;
        loop {
            self.pump()?;
            if self.is_idle() {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= give_up {
                tracing::warn!(
                    outstanding = self.outstanding,
                    timer = self.timer.is_some(),
                    "studio did not go idle in time"
                );
                return Ok(false);
            }
            let wake = match self.timer {
                Some(timer) => timer.deadline.min(give_up),
                None => give_up,
            };
            match self.msg_rx.recv_timeout(wake.saturating_duration_since(now)) {
                Ok(msg) => self.receive(msg)?,
                Err(RecvTimeoutError::Timeout) => {}
                // We hold a sender, so the channel cannot disconnect
                Err(RecvTimeoutError::Disconnected) => return Ok(self.is_idle()),
            }
        }
    }

    /// [`Self::run_until_idle`] with the configured render timeout
    pub fn settle(&mut self) -> Result<bool> {
        let timeout = Duration::from_millis(
            self.model.config.render_timeout_ms + self.model.config.debounce_ms,
        );
        self.run_until_idle(timeout)
    }

    fn fire_timer(&mut self, timer: PublishTimer) -> Result<()> {
        self.timer = None;
        self.dispatch(Msg::Pipeline(PipelineMsg::QuietPeriodElapsed {
            ticket: timer.ticket,
        }))
    }

    fn receive(&mut self, msg: Msg) -> Result<()> {
        if matches!(
            msg,
            Msg::Preview(PreviewMsg::Rendered(_)) | Msg::Buffer(BufferMsg::FilesRead(_))
        ) {
            self.outstanding = self.outstanding.saturating_sub(1);
        }
        self.dispatch(msg)
    }

    fn process_cmd(&mut self, cmd: Cmd) {
        match cmd {
            Cmd::None => {}
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    self.process_cmd(cmd);
                }
            }
            Cmd::SchedulePublish { ticket, delay_ms } => {
                self.timer = Some(PublishTimer {
                    ticket,
                    deadline: Instant::now() + Duration::from_millis(delay_ms),
                });
            }
            Cmd::CancelPublish => {
                self.timer = None;
            }
            Cmd::RunRender { version, code } => {
                let tx = self.msg_tx.clone();
                let renderer = self.renderer.clone();
                self.outstanding += 1;
                std::thread::spawn(move || {
                    let outcome = renderer.render(version, &code);
                    let _ = tx.send(Msg::Preview(PreviewMsg::Rendered(outcome)));
                });
            }
            Cmd::SetEditorText { file_id, text } => {
                let mode = self
                    .model
                    .buffers
                    .get(file_id)
                    .map(|f| f.mode)
                    .unwrap_or_default();
                self.editor.set_text(file_id, mode, &text);
            }
            Cmd::ReadFiles { paths } => {
                let tx = self.msg_tx.clone();
                self.outstanding += 1;
                std::thread::spawn(move || {
                    let results = paths
                        .into_iter()
                        .map(|path| {
                            let result = std::fs::read_to_string(&path).map_err(|e| e.to_string());
                            (path, result)
                        })
                        .collect();
                    let _ = tx.send(Msg::Buffer(BufferMsg::FilesRead(results)));
                });
            }
        }
    }
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("model", &self.model)
            .field("timer", &self.timer)
            .field("outstanding", &self.outstanding)
            .finish_non_exhaustive()
    }
}
