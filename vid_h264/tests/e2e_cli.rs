//! Drives the compiled binary against shell stand-ins for ffprobe and ffmpeg.
#![cfg(unix)]

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

#[allow(deprecated)]
fn vid_h264_cmd() -> Command {
    Command::cargo_bin("vid-h264").unwrap()
}

/// `*b.mp4` reports h264, everything else hevc.
const FAKE_FFPROBE: &str = r#"#!/bin/sh
for last; do :; done
case "$last" in
  *b.mp4) codec=h264 ;;
  *) codec=hevc ;;
esac
case "$*" in
  *codec_name,width,height*) echo "$codec,1920,1080" ;;
  *) echo "$codec" ;;
esac
"#;

/// Writes a small file to the output argument; inputs containing "bad" fail.
const FAKE_FFMPEG: &str = r#"#!/bin/sh
prev=""
for a; do
  if [ "$prev" = "-i" ]; then in="$a"; fi
  prev="$a"
  out="$a"
done
case "$in" in
  *bad*) echo "Invalid data found when processing input" >&2; exit 1 ;;
esac
printf 'converted' > "$out"
"#;

fn write_script(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let ws = Self { temp };
        fs::create_dir_all(ws.path("tools")).unwrap();
        write_script(&ws.path("tools/ffprobe"), FAKE_FFPROBE);
        write_script(&ws.path("tools/ffmpeg"), FAKE_FFMPEG);
        ws
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.temp.path().join(rel)
    }

    fn seed(&self, rel: &str, len: usize) {
        let path = self.path("src").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![7u8; len]).unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = vid_h264_cmd();
        cmd.current_dir(self.temp.path())
            .arg("--source")
            .arg(self.path("src"))
            .arg("-d")
            .arg(self.path("dest"))
            .arg("-a")
            .arg(self.path("archive"))
            .arg("--log")
            .arg(self.path("conversion.log"))
            .arg("--progress")
            .arg(self.path("progress.json"))
            .arg("--ffprobe")
            .arg(self.path("tools/ffprobe"))
            .arg("--ffmpeg")
            .arg(self.path("tools/ffmpeg"));
        cmd
    }

    fn progress(&self) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(self.path("progress.json")).unwrap()).unwrap()
    }

    fn log_messages(&self) -> Vec<String> {
        fs::read_to_string(self.path("conversion.log"))
            .unwrap()
            .lines()
            .map(|l| l[22..].to_string())
            .collect()
    }

    fn key(&self, rel: &str) -> String {
        self.path("src").join(rel).to_string_lossy().into_owned()
    }
}

#[test]
fn test_convert_then_resume() {
    let ws = Workspace::new();
    ws.seed("a.mkv", 1000);
    ws.seed("b.mp4", 500);
    ws.seed("bad.avi", 300);

    ws.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("] Conversion complete!"))
        .stdout(predicate::str::contains("Found 3 video files in"));

    assert_eq!(fs::read(ws.path("dest/a.mp4")).unwrap(), b"converted");
    assert!(ws.path("archive/a.mkv").is_file());
    assert!(!ws.path("src/a.mkv").exists());
    assert!(ws.path("src/b.mp4").is_file());
    assert!(ws.path("src/bad.avi").is_file());
    assert!(!ws.path("dest/bad.mp4").exists());
    assert!(!ws.path("dest/.bad.mp4.part").exists());

    let progress = ws.progress();
    assert_eq!(
        progress["completed"],
        serde_json::json!([ws.key("a.mkv"), ws.key("b.mp4")])
    );
    assert_eq!(progress["failed"], serde_json::json!([ws.key("bad.avi")]));

    let log = ws.log_messages();
    assert!(log.contains(&"  Size difference: 991 B (-99.1%)".to_string()));
    assert!(log.contains(&"  Conversion failed!".to_string()));
    assert_eq!(log.last().unwrap(), "Conversion complete!");

    let first_len = log.len();
    ws.cmd().assert().success();
    assert_eq!(ws.progress(), progress);

    let log = ws.log_messages();
    assert_eq!(
        &log[first_len..],
        &[
            format!("Found 2 video files in {}", ws.path("src").display()),
            "[1/2] Already processed, skipping: b.mp4".to_string(),
            "[2/2] Already processed, skipping: bad.avi".to_string(),
            "Conversion complete!".to_string(),
        ]
    );
}

#[test]
fn test_closed_stdout_does_not_abort_run() {
    let ws = Workspace::new();
    ws.seed("a.mkv", 1000);
    let slow = FAKE_FFMPEG.replacen("#!/bin/sh\n", "#!/bin/sh\nsleep 1\n", 1);
    write_script(&ws.path("tools/ffmpeg"), &slow);

    let mut child = ws.cmd().stdout(Stdio::piped()).stderr(Stdio::null()).spawn().unwrap();
    // reader goes away while the encoder is still running
    drop(child.stdout.take());
    let status = child.wait().unwrap();

    assert!(status.success(), "exit status: {:?}", status);
    assert!(ws.path("dest/a.mp4").is_file());
    assert!(ws.path("archive/a.mkv").is_file());
    assert!(!ws.path("src/a.mkv").exists());
    assert_eq!(ws.progress()["completed"], serde_json::json!([ws.key("a.mkv")]));
    assert_eq!(ws.log_messages().last().unwrap(), "Conversion complete!");
}

#[test]
fn test_missing_required_flags_fail() {
    let temp = TempDir::new().unwrap();
    vid_h264_cmd()
        .current_dir(temp.path())
        .arg("--source")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--destination"))
        .stderr(predicate::str::contains("Usage"));

    assert!(!temp.path().join("conversion_progress.json").exists());
}
