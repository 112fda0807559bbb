//! `anchorkeep session`: drive the anchor controller from a script.
//!
//! Runs against the simulated platform, whose device storage persists between
//! sessions, and the real preference file. A script is one operation per line:
//!
//! ```text
//! # comments and blank lines are ignored
//! restore
//! place cube 0 1 -2 90      # kind, x y z, optional yaw in degrees
//! place 0 0 1               # kind taken from the config
//! toggle @1                 # @n is the n-th anchor seen in this session
//! delete 67e55044-10b1-426f-9247-bb680e5fe0c8
//! fault erase on            # make the platform fail erases
//! unsave-all
//! list
//! ```

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use glam::Vec3;
use tracing::debug;

use anchorkeep_lib::anchor::{LoadOptions, PlatformOp, SimulatedPlatform};
use anchorkeep_lib::config::AnchorConfig;
use anchorkeep_lib::controller::AnchorController;
use anchorkeep_lib::lock::{LockMode, PrefsLock};
use anchorkeep_lib::prefs::FilePrefs;
use anchorkeep_lib::scene::RecordingScene;
use anchorkeep_lib::status::{AnchorStatus, StatusSink};
use anchorkeep_lib::types::{AnchorUuid, ObjectKind, Pose};

use crate::output::{
  OutputFormat, format_duration, print_info, print_json, print_stat, print_status, print_success, print_warning,
  short_uuid, symbols,
};

type SessionController = AnchorController<SimulatedPlatform, RecordingScene, FilePrefs>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnchorRef {
  /// 1-based position among anchors seen this session.
  Index(usize),
  Uuid(AnchorUuid),
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
  Place { kind: Option<ObjectKind>, pose: Pose },
  Toggle(AnchorRef),
  Delete(AnchorRef),
  UnsaveAll,
  Restore,
  List,
  Fault { op: PlatformOp, on: bool },
}

fn parse_ref(token: &str) -> Result<AnchorRef> {
  match token.strip_prefix('@') {
    Some(index) => {
      let index: usize = index.parse().with_context(|| format!("invalid anchor reference '{token}'"))?;
      if index == 0 {
        bail!("anchor references start at @1");
      }
      Ok(AnchorRef::Index(index))
    }
    None => Ok(AnchorRef::Uuid(token.parse()?)),
  }
}

fn parse_place(args: &[&str]) -> Result<Step> {
  let (kind, coords) = match args.first().map(|a| a.parse::<ObjectKind>()) {
    Some(Ok(kind)) => (Some(kind), &args[1..]),
    _ => (None, args),
  };
  if !(3..=4).contains(&coords.len()) {
    bail!("usage: place [kind] <x> <y> <z> [yaw]");
  }

  let numbers = coords
    .iter()
    .map(|c| c.parse::<f32>().with_context(|| format!("invalid number '{c}'")))
    .collect::<Result<Vec<_>>>()?;
  let position = Vec3::new(numbers[0], numbers[1], numbers[2]);
  let pose = match numbers.get(3) {
    Some(yaw) => Pose::at_yaw(position, *yaw),
    None => Pose::at(position),
  };
  Ok(Step::Place { kind, pose })
}

fn parse_fault(args: &[&str]) -> Result<Step> {
  let [op, state] = args else {
    bail!("usage: fault <create|save|erase|load> <on|off>");
  };
  let op = match *op {
    "create" => PlatformOp::Create,
    "save" => PlatformOp::Save,
    "erase" => PlatformOp::Erase,
    "load" => PlatformOp::Load,
    other => bail!("unknown platform operation '{other}'"),
  };
  let on = match *state {
    "on" => true,
    "off" => false,
    other => bail!("expected 'on' or 'off', got '{other}'"),
  };
  Ok(Step::Fault { op, on })
}

/// Parse one script line. Blank and comment-only lines yield `None`.
fn parse_line(line: &str) -> Result<Option<Step>> {
  let line = line.split('#').next().unwrap_or_default();
  let mut words = line.split_whitespace();
  let Some(command) = words.next() else {
    return Ok(None);
  };
  let args: Vec<&str> = words.collect();

  let one_ref = |args: &[&str]| match args {
    [token] => parse_ref(token),
    _ => Err(anyhow!("usage: {command} <uuid|@n>")),
  };
  let no_args = |step: Step| {
    if args.is_empty() {
      Ok(step)
    } else {
      Err(anyhow!("'{command}' takes no arguments"))
    }
  };

  let step = match command {
    "place" => parse_place(&args)?,
    "toggle" => Step::Toggle(one_ref(args.as_slice())?),
    "delete" => Step::Delete(one_ref(args.as_slice())?),
    "unsave-all" => no_args(Step::UnsaveAll)?,
    "restore" => no_args(Step::Restore)?,
    "list" => no_args(Step::List)?,
    "fault" => parse_fault(&args)?,
    other => bail!("unknown command '{other}'"),
  };
  Ok(Some(step))
}

fn parse_script(source: &str) -> Result<Vec<(usize, Step)>> {
  let mut steps = Vec::new();
  for (index, line) in source.lines().enumerate() {
    let number = index + 1;
    if let Some(step) = parse_line(line).with_context(|| format!("line {number}: {}", line.trim()))? {
      steps.push((number, step));
    }
  }
  Ok(steps)
}

/// Prints status events as they happen and keeps them for the JSON summary.
struct SessionStatus {
  quiet: bool,
  events: RefCell<Vec<(Option<AnchorUuid>, AnchorStatus)>>,
}

impl StatusSink for SessionStatus {
  fn report(&self, uuid: Option<AnchorUuid>, status: AnchorStatus) {
    if !self.quiet {
      print_status(uuid.as_ref(), status);
    }
    self.events.borrow_mut().push((uuid, status));
  }
}

struct Session<'a> {
  controller: &'a SessionController,
  default_kind: ObjectKind,
  options: LoadOptions,
  quiet: bool,
  seen: Vec<AnchorUuid>,
}

impl Session<'_> {
  fn resolve(&self, target: AnchorRef) -> Result<AnchorUuid> {
    match target {
      AnchorRef::Uuid(uuid) => Ok(uuid),
      AnchorRef::Index(index) => self
        .seen
        .get(index - 1)
        .copied()
        .ok_or_else(|| anyhow!("@{index} does not name an anchor yet ({} seen)", self.seen.len())),
    }
  }

  fn note(&self, message: &str) {
    if !self.quiet {
      print_info(message);
    }
  }

  fn failed(&self, line: usize, err: &dyn std::error::Error) {
    if !self.quiet {
      print_warning(&format!("line {line}: {err}"));
    }
  }

  async fn run(&mut self, line: usize, step: Step) -> Result<()> {
    debug!(line, ?step, "running session step");
    match step {
      Step::Place { kind, pose } => {
        let kind = kind.unwrap_or(self.default_kind);
        match self.controller.place(kind, pose).await {
          Ok(uuid) => {
            self.seen.push(uuid);
            self.note(&format!("@{} {kind} {uuid} at {pose}", self.seen.len()));
          }
          Err(err) => self.failed(line, &err),
        }
      }
      Step::Toggle(target) => {
        let uuid = self.resolve(target).with_context(|| format!("line {line}"))?;
        if let Err(err) = self.controller.toggle_save(uuid).await {
          self.failed(line, &err);
        }
      }
      Step::Delete(target) => {
        let uuid = self.resolve(target).with_context(|| format!("line {line}"))?;
        if let Err(err) = self.controller.delete(uuid).await {
          self.failed(line, &err);
        }
      }
      Step::UnsaveAll => {
        let result = self.controller.unsave_all().await;
        let mut summary = format!("unsaved {}, failed {}", result.unsaved.len(), result.failed.len());
        if !result.dropped.is_empty() {
          summary.push_str(&format!(", dropped {} not loaded in this session", result.dropped.len()));
        }
        self.note(&summary);
      }
      Step::Restore => match self.controller.restore(&self.options).await {
        Ok(report) => {
          for (uuid, _) in &report.restored {
            if !self.seen.contains(uuid) {
              self.seen.push(*uuid);
            }
          }
          self.note(&format!(
            "restored {} of {} saved anchor(s)",
            report.restored_count(),
            report.listed_count()
          ));
        }
        Err(err) => self.failed(line, &err),
      },
      Step::List => {
        if !self.quiet {
          self.print_anchors();
        }
      }
      Step::Fault { op, on } => {
        let platform = self.controller.platform();
        let mut faults = platform.faults_mut();
        match op {
          PlatformOp::Create => faults.fail_create = on,
          PlatformOp::Save => faults.fail_save = on,
          PlatformOp::Erase => faults.fail_erase = on,
          PlatformOp::Load => faults.fail_load = on,
        }
      }
    }
    Ok(())
  }

  fn print_anchors(&self) {
    let records = self.controller.records();
    if records.is_empty() {
      print_info("No anchors in this session.");
      return;
    }
    for record in records {
      let index = self
        .seen
        .iter()
        .position(|u| *u == record.uuid)
        .map(|i| format!("@{}", i + 1))
        .unwrap_or_default();
      let state = if record.saved { "saved" } else { "unsaved" };
      println!(
        "  {} {:<4} {} {} ({})",
        symbols::INFO,
        index,
        short_uuid(&record.uuid),
        record.kind,
        state
      );
    }
  }
}

pub fn cmd_session(
  script: &Path,
  prefs: &Path,
  device: &Path,
  timeout: Option<Duration>,
  output: OutputFormat,
) -> Result<()> {
  let source = fs::read_to_string(script).with_context(|| format!("Failed to read script {}", script.display()))?;
  let steps = parse_script(&source)?;
  debug!(script = %script.display(), steps = steps.len(), "parsed session script");

  let lock = PrefsLock::acquire(prefs, LockMode::Exclusive, &format!("session {}", script.display()))
    .context("Failed to lock preferences")?;
  debug!(lock = %lock.lock_path().display(), "holding preferences lock");

  let config = AnchorConfig::load();
  let mut options = config.load_options();
  if timeout.is_some() {
    options.timeout = timeout;
  }

  let store = FilePrefs::open(prefs).with_context(|| format!("Failed to open preferences at {}", prefs.display()))?;
  let platform = SimulatedPlatform::open(device)
    .with_context(|| format!("Failed to open device storage at {}", device.display()))?;
  debug!(
    prefs = %prefs.display(),
    device = %device.display(),
    stored = platform.stored().len(),
    location = ?options.location,
    "opened session stores"
  );
  let quiet = output.is_json();
  let status = Rc::new(SessionStatus {
    quiet,
    events: RefCell::new(Vec::new()),
  });
  let controller = AnchorController::builder(platform, RecordingScene::new(), store)
    .status(Rc::clone(&status))
    .palette(config.palette)
    .build();

  let runtime = tokio::runtime::Builder::new_current_thread()
    .enable_time()
    .build()
    .context("Failed to create async runtime")?;

  let start = Instant::now();
  let mut session = Session {
    controller: &controller,
    default_kind: config.default_kind,
    options,
    quiet,
    seen: Vec::new(),
  };
  runtime.block_on(async {
    for (line, step) in steps {
      session.run(line, step).await?;
    }
    Ok::<_, anyhow::Error>(())
  })?;

  let saved = controller.registry().list_saved();
  if output.is_json() {
    let events: Vec<_> = status
      .events
      .borrow()
      .iter()
      .map(|(uuid, status)| {
        serde_json::json!({
          "uuid": uuid,
          "status": status.label(),
          "failure": status.is_failure(),
        })
      })
      .collect();
    print_json(&serde_json::json!({
      "events": events,
      "anchors": controller.records(),
      "saved": saved,
    }))?;
  } else {
    println!();
    print_success(&format!("Session finished in {}", format_duration(start.elapsed())));
    print_stat("Anchors", &controller.records().len().to_string());
    print_stat("Saved", &saved.len().to_string());
  }

  Ok(())
}
