use std::fs;

use tempfile::{TempDir, tempdir};

use palimpsest_cli::{Args, Mode, run};

const DIAGRAM: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 300 100">
  <g data-cell-id="SALES">
    <rect x="0" y="0" width="100" height="60"/>
    <g class="inner"><rect x="10" y="10" width="80" height="40"/></g>
  </g>
  <g data-cell-id="HR">
    <rect x="120" y="0" width="100" height="60"/>
    <g class="inner"><rect x="130" y="10" width="80" height="40"/></g>
  </g>
</svg>"#;

const OVERLAY: &str = r#"<div>
  <div class="overlay-cell" data-cell-id="SALES">
    <svg class="content"><text class="label">12 apps</text></svg>
  </div>
  <div class="overlay-cell" data-cell-id="FINANCE">
    <svg class="content"><text class="label">3 apps</text></svg>
  </div>
</div>"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempdir().expect("Failed to create temp directory");
        fs::write(dir.path().join("diagram.svg"), DIAGRAM).expect("Failed to write diagram");
        fs::write(dir.path().join("cells.svg"), OVERLAY).expect("Failed to write overlay");
        Self { dir }
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().to_string()
    }

    fn args(&self, mount: &str) -> Args {
        Args {
            diagram: self.path("diagram.svg"),
            overlay: self.path("cells.svg"),
            mount: mount.to_string(),
            mode: Mode::Fresh,
            strict: false,
            output: self.path("out.svg"),
            config: None,
            log_level: "off".to_string(),
        }
    }
}

#[test]
fn e2e_composites_overlay_onto_diagram() {
    let workspace = Workspace::new();
    let args = workspace.args(".inner");

    run(&args).expect("Compositing should succeed");

    let output = fs::read_to_string(&args.output).expect("Output should be written");
    assert!(output.contains("12 apps"));
    assert!(!output.contains("3 apps"));
    assert!(output.contains(r#"class="content""#));
}

#[test]
fn e2e_strict_mode_fails_without_writing() {
    let workspace = Workspace::new();
    let mut args = workspace.args(".inner");
    args.strict = true;

    let err = run(&args).expect_err("Unplaced FINANCE cell should fail in strict mode");

    assert!(err.to_string().contains("could not be placed"));
    assert!(!workspace.dir.path().join("out.svg").exists());
}

#[test]
fn e2e_config_file_is_applied() {
    let workspace = Workspace::new();
    let config_path = workspace.path("config.toml");
    fs::write(&config_path, "[compositor]\npadding = 5.0\n").expect("Failed to write config");

    let mut args = workspace.args(".inner");
    args.config = Some(config_path);
    args.mode = Mode::Incremental;

    run(&args).expect("Compositing should succeed");

    let output = fs::read_to_string(&args.output).expect("Output should be written");
    assert!(output.contains(r#"x="15""#));
    assert!(output.contains(r#"width="70""#));
}

#[test]
fn e2e_invalid_selector_is_an_error() {
    let workspace = Workspace::new();
    let args = workspace.args("g > .inner");

    assert!(run(&args).is_err());
}

#[test]
fn e2e_missing_input_is_an_error() {
    let workspace = Workspace::new();
    let mut args = workspace.args(".inner");
    args.diagram = workspace.path("missing.svg");

    assert!(run(&args).is_err());
}
