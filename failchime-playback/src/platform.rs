//! Platform families and their candidate audio players.
//!
//! Each family maps to an ordered, compile-time fixed list of external
//! players. [`candidates_for`] is a pure function so the chain can be
//! inspected and tested without spawning anything.

use std::path::Path;

/// The desktop OS family the current build targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    /// macOS: a single `afplay` invocation
    MacOs,
    /// Linux and the BSDs: `paplay`, then `aplay`, then `ffplay`
    FreeDesktop,
    /// Windows: PowerShell `SoundPlayer` for WAV, the WPF `MediaPlayer` otherwise
    Windows,
    /// No known player; playback is a no-op
    Unsupported,
}

impl PlatformFamily {
    /// Detect the family of the running platform.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            PlatformFamily::MacOs
        } else if cfg!(target_os = "windows") {
            PlatformFamily::Windows
        } else if cfg!(any(
            target_os = "linux",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        )) {
            PlatformFamily::FreeDesktop
        } else {
            PlatformFamily::Unsupported
        }
    }

    /// Display name for logs
    pub fn display_name(&self) -> &'static str {
        match self {
            PlatformFamily::MacOs => "macOS",
            PlatformFamily::FreeDesktop => "Linux/BSD",
            PlatformFamily::Windows => "Windows",
            PlatformFamily::Unsupported => "unsupported",
        }
    }
}

/// How a candidate player interprets the 0-100 volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeControl {
    /// Linear 0.0-2.0 float (`afplay -v`)
    Float0To2,
    /// Linear 0-65536 integer (`paplay --volume`)
    Int0To65536,
    /// 0-100 passed through unchanged (`ffplay -volume`)
    Percent,
    /// Linear 0.0-1.0 float (WPF `MediaPlayer.Volume`)
    Float0To1,
    /// The player has no volume argument
    Uncontrolled,
}

/// One entry in a platform's ordered list of players.
#[derive(Clone, Copy)]
pub struct PlayerCandidate {
    /// Executable looked up on `PATH`
    pub executable: &'static str,
    pub volume_control: VolumeControl,
    build_args: fn(&Path, u8) -> Vec<String>,
}

impl PlayerCandidate {
    /// Build the argument list for playing `file_path` at `volume` (clamped to 100).
    pub fn args(&self, file_path: &Path, volume: u8) -> Vec<String> {
        (self.build_args)(file_path, volume.min(100))
    }
}

impl std::fmt::Debug for PlayerCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerCandidate")
            .field("executable", &self.executable)
            .field("volume_control", &self.volume_control)
            .finish_non_exhaustive()
    }
}

/// Map 0-100 onto afplay's 0.0-2.0 scale.
pub fn afplay_volume(volume: u8) -> f32 {
    f32::from(volume.min(100)) / 50.0
}

/// Map 0-100 onto `MediaPlayer.Volume`'s 0.0-1.0 scale.
pub fn media_player_volume(volume: u8) -> f32 {
    f32::from(volume.min(100)) / 100.0
}

/// Map 0-100 onto paplay's 0-65536 scale.
pub fn paplay_volume(volume: u8) -> u32 {
    u32::from(volume.min(100)) * 65536 / 100
}

fn path_arg(file_path: &Path) -> String {
    file_path.to_string_lossy().into_owned()
}

/// Quote a string as a PowerShell single-quoted literal.
fn powershell_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

const AFPLAY: PlayerCandidate = PlayerCandidate {
    executable: "afplay",
    volume_control: VolumeControl::Float0To2,
    build_args: |path, volume| {
        vec![
            "-v".to_string(),
            format!("{:.2}", afplay_volume(volume)),
            path_arg(path),
        ]
    },
};

const PAPLAY: PlayerCandidate = PlayerCandidate {
    executable: "paplay",
    volume_control: VolumeControl::Int0To65536,
    build_args: |path, volume| {
        vec![
            format!("--volume={}", paplay_volume(volume)),
            path_arg(path),
        ]
    },
};

const APLAY: PlayerCandidate = PlayerCandidate {
    executable: "aplay",
    volume_control: VolumeControl::Uncontrolled,
    build_args: |path, _volume| vec!["-q".to_string(), path_arg(path)],
};

const FFPLAY: PlayerCandidate = PlayerCandidate {
    executable: "ffplay",
    volume_control: VolumeControl::Percent,
    build_args: |path, volume| {
        vec![
            "-nodisp".to_string(),
            "-autoexit".to_string(),
            "-loglevel".to_string(),
            "quiet".to_string(),
            "-volume".to_string(),
            volume.to_string(),
            path_arg(path),
        ]
    },
};

// Volume cannot be set through System.Media.SoundPlayer.
const POWERSHELL_SOUND_PLAYER: PlayerCandidate = PlayerCandidate {
    executable: "powershell",
    volume_control: VolumeControl::Uncontrolled,
    build_args: |path, _volume| {
        vec![
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-Command".to_string(),
            format!(
                "(New-Object Media.SoundPlayer {}).PlaySync()",
                powershell_literal(&path_arg(path))
            ),
        ]
    },
};

// Plays inside the PowerShell process itself, so killing it at the ceiling
// stops the sound; gives up after 5 s if the file never opens.
const POWERSHELL_MEDIA_PLAYER: PlayerCandidate = PlayerCandidate {
    executable: "powershell",
    volume_control: VolumeControl::Float0To1,
    build_args: |path, volume| {
        vec![
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-Command".to_string(),
            format!(
                "Add-Type -AssemblyName PresentationCore; \
                 $p = New-Object System.Windows.Media.MediaPlayer; \
                 $p.Volume = {:.2}; \
                 $p.Open((New-Object System.Uri({}))); \
                 $n = 0; \
                 while (-not $p.NaturalDuration.HasTimeSpan) {{ \
                 if ($n -ge 100) {{ $p.Close(); exit 1 }}; \
                 Start-Sleep -Milliseconds 50; $n++ }}; \
                 $p.Play(); \
                 Start-Sleep -Milliseconds ([int]$p.NaturalDuration.TimeSpan.TotalMilliseconds + 200); \
                 $p.Close()",
                media_player_volume(volume),
                powershell_literal(&path_arg(path))
            ),
        ]
    },
};

/// Ordered fallback chain for Linux/BSD desktops.
pub const FREEDESKTOP_CHAIN: [PlayerCandidate; 3] = [PAPLAY, APLAY, FFPLAY];

/// Ordered list of players to try for `file_path` on `family`.
///
/// Unsupported platforms yield an empty list.
pub fn candidates_for(family: PlatformFamily, file_path: &Path) -> Vec<PlayerCandidate> {
    match family {
        PlatformFamily::MacOs => vec![AFPLAY],
        PlatformFamily::FreeDesktop => FREEDESKTOP_CHAIN.to_vec(),
        PlatformFamily::Windows => {
            let is_wav = file_path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
            if is_wav {
                vec![POWERSHELL_SOUND_PLAYER]
            } else {
                vec![POWERSHELL_MEDIA_PLAYER]
            }
        }
        PlatformFamily::Unsupported => Vec::new(),
    }
}
