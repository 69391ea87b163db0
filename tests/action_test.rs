use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use serde_json::json;
use stencil::action::FetchTemplateAction;
use stencil::config::{FetchTemplateInput, TemplateFileExtension};
use stencil::error::{Error, Result};
use stencil::fetch::{ContentFetcher, FetchRequest};
use stencil::walker::Action;
use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn input(url: &str, values: serde_json::Value) -> FetchTemplateInput {
    FetchTemplateInput {
        values: serde_json::from_value(values).unwrap(),
        ..FetchTemplateInput::new(url)
    }
}

#[test]
fn test_renders_local_skeleton_into_workspace() {
    let templates = TempDir::new().unwrap();
    let skeleton = templates.path().join("service/skeleton");
    write(&skeleton.join("${{ values.name }}/README.md"), "# ${{ values.name }}\n");
    write(&skeleton.join("${{ values.name }}/catalog-info.yaml"), "tags: ${{ values.tags | dump }}\n");
    write(&skeleton.join("${{ 'docs' if values.docs }}/index.md"), "docs\n");
    write(&skeleton.join(".github/workflows/ci.yml"), "run: ${{ github.sha }}\n");

    let expected = TempDir::new().unwrap();
    write(&expected.path().join("demo/README.md"), "# demo\n");
    write(&expected.path().join("demo/catalog-info.yaml"), "tags: [\"a\",\"b\"]\n");
    write(&expected.path().join(".github/workflows/ci.yml"), "run: ${{ github.sha }}\n");

    let workspace = TempDir::new().unwrap();
    let action = FetchTemplateAction::new(workspace.path())
        .with_base_url(templates.path().join("service").display().to_string());
    let report = action
        .run(FetchTemplateInput {
            target_path: "out".into(),
            copy_without_render: Some(vec![".github".into()]),
            ..input("./skeleton", json!({"name": "demo", "tags": ["a", "b"], "docs": false}))
        })
        .unwrap();

    let output = workspace.path().join("out");
    assert!(!dir_diff::is_different(&output, expected.path()).unwrap());
    assert_eq!(report.count(Action::Rendered), 2);
    assert_eq!(report.count(Action::Copied), 1);
}

#[test]
fn test_template_file_extension() {
    let skeleton = TempDir::new().unwrap();
    write(&skeleton.path().join("a.njk"), "${{ values.name }}");
    write(&skeleton.path().join("b.txt.jinja2"), "${{ values.name }}");

    let workspace = TempDir::new().unwrap();
    FetchTemplateAction::new(workspace.path())
        .run(FetchTemplateInput {
            template_file_extension: Some(TemplateFileExtension::Suffix(".jinja2".into())),
            ..input(&skeleton.path().display().to_string(), json!({"name": "demo"}))
        })
        .unwrap();

    assert_eq!(fs::read_to_string(workspace.path().join("a.njk")).unwrap(), "${{ values.name }}");
    assert_eq!(fs::read_to_string(workspace.path().join("b.txt")).unwrap(), "demo");
    assert!(!workspace.path().join("b.txt.jinja2").exists());
}

#[test]
fn test_cookiecutter_compat() {
    let skeleton = TempDir::new().unwrap();
    write(&skeleton.path().join("{{ cookiecutter.name }}.json"), "{{ cookiecutter.meta | jsonify }}");

    let workspace = TempDir::new().unwrap();
    FetchTemplateAction::new(workspace.path())
        .run(FetchTemplateInput {
            cookiecutter_compat: true,
            ..input(&skeleton.path().display().to_string(), json!({"name": "demo", "meta": {"a": 1}}))
        })
        .unwrap();

    assert_eq!(fs::read_to_string(workspace.path().join("demo.json")).unwrap(), r#"{"a":1}"#);
}

#[test]
fn test_configuration_error_writes_nothing() {
    let skeleton = TempDir::new().unwrap();
    write(&skeleton.path().join("a.txt"), "a");

    let workspace = TempDir::new().unwrap();
    let err = FetchTemplateAction::new(workspace.path())
        .run(FetchTemplateInput {
            target_path: "out".into(),
            copy_without_render: Some(vec!["a.txt".into()]),
            copy_without_templating: Some(vec!["b.txt".into()]),
            ..input(&skeleton.path().display().to_string(), json!({}))
        })
        .unwrap_err();

    assert!(matches!(err, Error::ConfigurationError(_)));
    assert!(!workspace.path().join("out").exists());
}

#[test]
fn test_target_outside_workspace_is_rejected() {
    let skeleton = TempDir::new().unwrap();
    write(&skeleton.path().join("a.txt"), "a");

    let workspace = TempDir::new().unwrap();
    let err = FetchTemplateAction::new(workspace.path().join("inner"))
        .run(FetchTemplateInput {
            target_path: "../escape".into(),
            ..input(&skeleton.path().display().to_string(), json!({}))
        })
        .unwrap_err();

    assert!(matches!(err, Error::ContainmentError { .. }));
    assert!(!workspace.path().join("escape").exists());
}

#[test]
fn test_missing_skeleton_is_a_fetch_error() {
    let workspace = TempDir::new().unwrap();
    let missing = workspace.path().join("missing");
    let err = FetchTemplateAction::new(workspace.path())
        .run(FetchTemplateInput {
            target_path: "out".into(),
            ..input(&missing.display().to_string(), json!({}))
        })
        .unwrap_err();

    assert!(matches!(err, Error::FetchError { .. }));
}

struct StubFetcher {
    requests: Rc<RefCell<Vec<FetchRequest>>>,
}

impl ContentFetcher for StubFetcher {
    fn fetch_contents(&self, request: &FetchRequest) -> Result<()> {
        self.requests.borrow_mut().push(request.clone());
        fs::create_dir_all(&request.output_path)?;
        fs::write(request.output_path.join("${{ values.name }}.txt"), "static content")?;
        Ok(())
    }
}

#[test]
fn test_custom_fetcher_receives_request() {
    let requests = Rc::new(RefCell::new(Vec::new()));
    let workspace = TempDir::new().unwrap();

    FetchTemplateAction::new(workspace.path())
        .with_base_url("https://example.com/templates/service/template.yaml")
        .with_fetcher(Box::new(StubFetcher { requests: requests.clone() }))
        .run(input("./skeleton", json!({"name": "test-project"})))
        .unwrap();

    let requests = requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].fetch_url, "./skeleton");
    assert_eq!(
        requests[0].base_url.as_deref(),
        Some("https://example.com/templates/service/template.yaml")
    );
    assert!(!requests[0].output_path.exists());
    assert_eq!(
        fs::read_to_string(workspace.path().join("test-project.txt")).unwrap(),
        "static content"
    );
}

#[cfg(unix)]
#[test]
fn test_symlinks_and_modes_on_disk() {
    use std::os::unix::fs::{symlink, PermissionsExt};

    let skeleton = TempDir::new().unwrap();
    write(&skeleton.path().join("bin/run-${{ values.name }}.sh"), "#!/bin/sh\n");
    fs::set_permissions(
        skeleton.path().join("bin/run-${{ values.name }}.sh"),
        fs::Permissions::from_mode(0o755),
    )
    .unwrap();
    symlink("../does/not/exist-${{ values.name }}", skeleton.path().join("dangling")).unwrap();

    let workspace = TempDir::new().unwrap();
    FetchTemplateAction::new(workspace.path())
        .run(input(&skeleton.path().display().to_string(), json!({"name": "app"})))
        .unwrap();

    let script = workspace.path().join("bin/run-app.sh");
    assert_eq!(fs::metadata(&script).unwrap().permissions().mode() & 0o7777, 0o755);
    assert_eq!(
        fs::read_link(workspace.path().join("dangling")).unwrap(),
        Path::new("../does/not/exist-${{ values.name }}")
    );
}

#[cfg(unix)]
#[test]
fn test_entries_are_not_written_through_skeleton_symlinks() {
    use std::os::unix::fs::symlink;

    let outside = TempDir::new().unwrap();
    let skeleton = TempDir::new().unwrap();
    symlink(outside.path(), skeleton.path().join("link")).unwrap();
    write(&skeleton.path().join("{# z #}${{ values.path }}"), "pwned");

    let workspace = TempDir::new().unwrap();
    let err = FetchTemplateAction::new(workspace.path())
        .run(input(&skeleton.path().display().to_string(), json!({"path": "link/pwned.txt"})))
        .unwrap_err();

    assert!(matches!(err, Error::ContainmentError { .. }));
    assert!(!outside.path().join("pwned.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_directory_is_not_merged_into_skeleton_symlink() {
    use std::os::unix::fs::symlink;

    let outside = TempDir::new().unwrap();
    let skeleton = TempDir::new().unwrap();
    symlink(outside.path(), skeleton.path().join("app")).unwrap();
    write(&skeleton.path().join("{# z #}app/main.rs"), "fn main() {}\n");

    let workspace = TempDir::new().unwrap();
    let err = FetchTemplateAction::new(workspace.path())
        .run(input(&skeleton.path().display().to_string(), json!({})))
        .unwrap_err();

    assert!(matches!(err, Error::ContainmentError { .. }));
    assert!(!outside.path().join("main.rs").exists());
}
