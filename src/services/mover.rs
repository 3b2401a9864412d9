use crate::models::{ModLayout, ModState};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::fs;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Characters that may not appear in a mod folder name.
const RESERVED_NAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Errors from relocating or renaming a mod folder
#[derive(Error, Debug)]
pub enum MoveError {
    #[error("Source folder not found: {0}")]
    NotFound(Utf8PathBuf),

    #[error("A folder named '{name}' already exists in {root}")]
    AlreadyExists { name: String, root: Utf8PathBuf },

    #[error("Invalid folder name '{0}'")]
    InvalidName(String),

    #[error("New name is the same as the current name: {0}")]
    Unchanged(String),

    #[error("Failed to move {from} to {to}: {source}")]
    Io {
        from: Utf8PathBuf,
        to: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single relocation between two roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub name: String,
    pub from: ModState,
    pub to: ModState,
}

impl MoveRequest {
    pub fn new(name: impl Into<String>, from: ModState, to: ModState) -> Self {
        Self {
            name: name.into(),
            from,
            to,
        }
    }

    pub fn enable(name: impl Into<String>) -> Self {
        Self::new(name, ModState::Disabled, ModState::Enabled)
    }

    pub fn disable(name: impl Into<String>) -> Self {
        Self::new(name, ModState::Enabled, ModState::Disabled)
    }

    pub fn mark_broken(name: impl Into<String>, from: ModState) -> Self {
        Self::new(name, from, ModState::Broken)
    }

    /// Short verb for logs and notifications
    pub fn action(&self) -> &'static str {
        match self.to {
            ModState::Enabled => "Enable",
            ModState::Disabled => "Disable",
            ModState::Broken => "Mark broken",
        }
    }

    /// Label for a finished move, e.g. "Disabled"
    pub fn past_tense(&self) -> &'static str {
        match self.to {
            ModState::Enabled => "Enabled",
            ModState::Disabled => "Disabled",
            ModState::Broken => "Marked broken",
        }
    }
}

/// Terminal status of a move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Success,
    NotFound(Utf8PathBuf),
    IoFailure(String),
}

impl MoveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, MoveOutcome::Success)
    }
}

impl From<MoveError> for MoveOutcome {
    fn from(err: MoveError) -> Self {
        match err {
            MoveError::NotFound(path) => MoveOutcome::NotFound(path),
            other => MoveOutcome::IoFailure(other.to_string()),
        }
    }
}

impl fmt::Display for MoveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveOutcome::Success => f.write_str("Success"),
            MoveOutcome::NotFound(path) => write!(f, "Error: Source folder not found: {}", path),
            MoveOutcome::IoFailure(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Report delivered back to the controller once a move terminates
#[derive(Debug, Clone)]
pub struct MoveReport {
    pub request: MoveRequest,
    pub outcome: MoveOutcome,
    pub duration: Duration,
}

impl MoveReport {
    pub fn name(&self) -> &str {
        &self.request.name
    }
}

/// Check that `name` can be used as a single folder name.
pub fn validate_folder_name(name: &str) -> Result<(), MoveError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed != name
        || name == "."
        || name == ".."
        || name.contains(RESERVED_NAME_CHARS)
    {
        return Err(MoveError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Move a mod folder between roots, blocking the calling thread.
///
/// The destination root is created on demand. An existing folder with the
/// same name at the destination is never overwritten.
pub fn move_folder(layout: &ModLayout, request: &MoveRequest) -> Result<Utf8PathBuf, MoveError> {
    let source = layout.path_of(&request.name, request.from);
    let dest_root = layout.root_for(request.to);
    let target = dest_root.join(&request.name);

    if !source.is_dir() {
        return Err(MoveError::NotFound(source));
    }

    if !dest_root.exists() {
        fs::create_dir_all(dest_root).map_err(|source_err| MoveError::Io {
            from: source.clone(),
            to: target.clone(),
            source: source_err,
        })?;
        tracing::debug!("Created destination root: {}", dest_root);
    }

    if target.exists() {
        return Err(MoveError::AlreadyExists {
            name: request.name.clone(),
            root: dest_root.to_path_buf(),
        });
    }

    fs::rename(&source, &target).map_err(|source_err| MoveError::Io {
        from: source.clone(),
        to: target.clone(),
        source: source_err,
    })?;

    tracing::info!("{}: {} -> {}", request.action(), source, target);
    Ok(target)
}

/// Rename a mod folder inside the root that holds it.
pub fn rename_folder(
    root: &Utf8Path,
    old_name: &str,
    new_name: &str,
) -> Result<Utf8PathBuf, MoveError> {
    validate_folder_name(new_name)?;
    if old_name == new_name {
        return Err(MoveError::Unchanged(new_name.to_string()));
    }

    let source = root.join(old_name);
    if !source.is_dir() {
        return Err(MoveError::NotFound(source));
    }

    let target = root.join(new_name);
    if target.exists() {
        return Err(MoveError::AlreadyExists {
            name: new_name.to_string(),
            root: root.to_path_buf(),
        });
    }

    fs::rename(&source, &target).map_err(|source_err| MoveError::Io {
        from: source.clone(),
        to: target.clone(),
        source: source_err,
    })?;

    tracing::info!("Renamed '{}' -> '{}' in {}", old_name, new_name, root);
    Ok(target)
}

/// Run a move on the blocking pool and turn any failure into a terminal outcome.
pub async fn run_move(layout: ModLayout, request: MoveRequest) -> MoveReport {
    let start = Instant::now();
    let task_request = request.clone();

    let outcome = match tokio::task::spawn_blocking(move || move_folder(&layout, &task_request))
        .await
    {
        Ok(Ok(_)) => MoveOutcome::Success,
        Ok(Err(e)) => {
            tracing::warn!("{} '{}' failed: {}", request.action(), request.name, e);
            MoveOutcome::from(e)
        }
        Err(join_err) => {
            tracing::error!("Move task for '{}' panicked: {}", request.name, join_err);
            MoveOutcome::IoFailure(join_err.to_string())
        }
    };

    MoveReport {
        request,
        outcome,
        duration: start.elapsed(),
    }
}

/// Dispatches moves as independent tokio tasks.
///
/// Every task sends exactly one [`MoveReport`] on the report channel when it
/// terminates. Reports for different folders may arrive in any order.
#[derive(Clone)]
pub struct MoveService {
    tokio_handle: tokio::runtime::Handle,
    report_tx: mpsc::UnboundedSender<MoveReport>,
}

impl MoveService {
    /// Create a service and the receiving end of its report channel.
    pub fn new(tokio_handle: tokio::runtime::Handle) -> (Self, mpsc::UnboundedReceiver<MoveReport>) {
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        (
            Self {
                tokio_handle,
                report_tx,
            },
            report_rx,
        )
    }

    /// Spawn a move. Returns immediately.
    pub fn dispatch(&self, layout: ModLayout, request: MoveRequest) -> JoinHandle<()> {
        let report_tx = self.report_tx.clone();
        tracing::debug!(
            "Dispatching {} for '{}'",
            request.action().to_lowercase(),
            request.name
        );

        self.tokio_handle.spawn(async move {
            let report = run_move(layout, request).await;
            if report_tx.send(report).is_err() {
                tracing::warn!("Move report dropped: receiver closed");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ModLayout) {
        let temp = TempDir::new().unwrap();
        let base = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let layout = ModLayout::from_enabled_root(base.join("Mods")).unwrap();
        fs::create_dir_all(layout.enabled_root()).unwrap();
        (temp, layout)
    }

    #[test]
    fn test_disable_creates_destination_root() {
        let (_temp, layout) = setup();
        fs::create_dir(layout.path_of("Alpha", ModState::Enabled)).unwrap();
        fs::write(layout.path_of("Alpha", ModState::Enabled).join("mod.ini"), "key = F").unwrap();

        let target = move_folder(&layout, &MoveRequest::disable("Alpha")).unwrap();

        assert_eq!(target, layout.path_of("Alpha", ModState::Disabled));
        assert!(!layout.path_of("Alpha", ModState::Enabled).exists());
        assert!(target.join("mod.ini").exists());
    }

    #[test]
    fn test_second_move_reports_not_found() {
        let (_temp, layout) = setup();
        fs::create_dir(layout.path_of("Alpha", ModState::Enabled)).unwrap();

        move_folder(&layout, &MoveRequest::disable("Alpha")).unwrap();
        let err = move_folder(&layout, &MoveRequest::disable("Alpha")).unwrap_err();

        match err {
            MoveError::NotFound(path) => {
                assert_eq!(path, layout.path_of("Alpha", ModState::Enabled))
            }
            other => panic!("Expected NotFound, got: {:?}", other),
        }
    }

    #[test]
    fn test_collision_is_not_overwritten() {
        let (_temp, layout) = setup();
        fs::create_dir(layout.path_of("Alpha", ModState::Enabled)).unwrap();
        fs::create_dir_all(layout.path_of("Alpha", ModState::Disabled)).unwrap();

        let err = move_folder(&layout, &MoveRequest::disable("Alpha")).unwrap_err();

        assert!(matches!(err, MoveError::AlreadyExists { .. }));
        assert!(layout.path_of("Alpha", ModState::Enabled).exists());
        assert_eq!(
            MoveOutcome::from(err).to_string(),
            format!(
                "Error: A folder named 'Alpha' already exists in {}",
                layout.disabled_root()
            )
        );
    }

    #[test]
    fn test_rename_validation() {
        let (_temp, layout) = setup();
        let root = layout.enabled_root();
        fs::create_dir(root.join("Alpha")).unwrap();
        fs::create_dir(root.join("Beta")).unwrap();

        assert!(matches!(
            rename_folder(root, "Alpha", ""),
            Err(MoveError::InvalidName(_))
        ));
        assert!(matches!(
            rename_folder(root, "Alpha", "a/b"),
            Err(MoveError::InvalidName(_))
        ));
        assert!(matches!(
            rename_folder(root, "Alpha", "Alpha"),
            Err(MoveError::Unchanged(_))
        ));
        assert!(matches!(
            rename_folder(root, "Alpha", "Beta"),
            Err(MoveError::AlreadyExists { .. })
        ));
        assert!(matches!(
            rename_folder(root, "Gone", "Gamma"),
            Err(MoveError::NotFound(_))
        ));

        let target = rename_folder(root, "Alpha", "Gamma").unwrap();
        assert!(target.is_dir());
        assert!(!root.join("Alpha").exists());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(MoveOutcome::Success.to_string(), "Success");
        assert_eq!(
            MoveOutcome::NotFound(Utf8PathBuf::from("/m/Alpha")).to_string(),
            "Error: Source folder not found: /m/Alpha"
        );
    }

    #[test]
    fn test_request_labels() {
        let broken = MoveRequest::mark_broken("Alpha", ModState::Disabled);
        assert_eq!(broken.action(), "Mark broken");
        assert_eq!(broken.past_tense(), "Marked broken");
        assert_eq!(MoveRequest::enable("Alpha").past_tense(), "Enabled");
        assert_eq!(MoveRequest::disable("Alpha").past_tense(), "Disabled");
    }

    #[tokio::test]
    async fn test_run_move_reports_outcome() {
        let (_temp, layout) = setup();
        fs::create_dir_all(layout.path_of("Beta", ModState::Disabled)).unwrap();

        let report = run_move(layout.clone(), MoveRequest::enable("Beta")).await;
        assert_eq!(report.outcome, MoveOutcome::Success);
        assert_eq!(report.name(), "Beta");
        assert!(layout.path_of("Beta", ModState::Enabled).is_dir());

        let report = run_move(layout.clone(), MoveRequest::enable("Beta")).await;
        assert!(matches!(report.outcome, MoveOutcome::NotFound(_)));
    }

    #[tokio::test]
    async fn test_dispatch_sends_report() {
        let (_temp, layout) = setup();
        fs::create_dir(layout.path_of("Alpha", ModState::Enabled)).unwrap();

        let (service, mut rx) = MoveService::new(tokio::runtime::Handle::current());
        service
            .dispatch(layout.clone(), MoveRequest::mark_broken("Alpha", ModState::Enabled))
            .await
            .unwrap();

        let report = rx.recv().await.unwrap();
        assert!(report.outcome.is_success());
        assert!(layout.path_of("Alpha", ModState::Broken).is_dir());
    }
}
