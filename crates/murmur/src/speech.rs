use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use murmur_model::{SpeechEngine, SpeechError, SpeechErrorKind, StartSignal};
use tokio::process::Command;

#[cfg(target_os = "macos")]
const CANDIDATES: &[(&str, &[&str])] = &[("say", &[])];
#[cfg(not(target_os = "macos"))]
const CANDIDATES: &[(&str, &[&str])] =
    &[("espeak", &[]), ("spd-say", &["--wait"])];

/// A speech engine that speaks by running a text-to-speech program.
///
/// The text is passed as the last argument. Audio is considered started
/// once the program is spawned, and finished when it exits. Cancelling an
/// utterance kills the program.
#[derive(Clone, Debug)]
pub struct CommandSpeechEngine {
    program: Option<PathBuf>,
    args: Vec<String>,
}

impl CommandSpeechEngine {
    /// Picks the text-to-speech program of the host.
    ///
    /// That is `say` on macOS, and `espeak` or `spd-say` elsewhere. The
    /// engine is unavailable if none of them can be found.
    pub fn detect() -> Self {
        for (name, args) in CANDIDATES {
            if let Some(program) = find_program(name) {
                debug!("using {} for speech", program.display());
                return Self {
                    program: Some(program),
                    args: args.iter().map(|arg| (*arg).to_owned()).collect(),
                };
            }
        }
        debug!("no speech program found");
        Self {
            program: None,
            args: vec![],
        }
    }

    /// Uses a custom command line, like `espeak -v en-us`.
    ///
    /// The command line is split on whitespace, no quoting is supported.
    /// The engine is unavailable if the program can't be found.
    pub fn from_command_line(cmdline: &str) -> Self {
        let mut words = cmdline.split_whitespace();
        let program = words.next().and_then(find_program);
        if program.is_none() {
            warn!("speech program of {cmdline:?} is not found");
        }
        Self {
            program,
            args: words.map(str::to_owned).collect(),
        }
    }

    /// Returns the resolved path of the speech program, if any.
    #[inline]
    pub fn program(&self) -> Option<&Path> {
        self.program.as_deref()
    }
}

impl SpeechEngine for CommandSpeechEngine {
    #[inline]
    fn is_available(&self) -> bool {
        self.program.is_some()
    }

    fn utter(
        &self,
        text: &str,
        on_start: StartSignal,
    ) -> impl Future<Output = Result<(), SpeechError>> + Send + 'static {
        let program = self.program.clone();
        let args = self.args.clone();
        let text = text.to_owned();
        async move {
            let Some(program) = program else {
                return Err(SpeechError::new(
                    SpeechErrorKind::Unavailable,
                    "no speech program",
                ));
            };

            let mut child = Command::new(&program)
                .args(&args)
                .arg(&text)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .map_err(|err| {
                    SpeechError::new(
                        SpeechErrorKind::Failed,
                        format!("failed to run {}: {err}", program.display()),
                    )
                })?;
            on_start();

            let status = child.wait().await.map_err(|err| {
                SpeechError::new(SpeechErrorKind::Failed, err.to_string())
            })?;
            if !status.success() {
                return Err(SpeechError::new(
                    SpeechErrorKind::Failed,
                    format!("{} exited with {status}", program.display()),
                ));
            }
            Ok(())
        }
    }
}

fn find_program(name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    if path.components().count() > 1 {
        return is_executable(path).then(|| path.to_owned());
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .is_ok_and(|meta| meta.permissions().mode() & 0o111 != 0)
    }
    #[cfg(not(unix))]
    {
        true
    }
}
