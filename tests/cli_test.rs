use clap::error::ErrorKind;
use clap::Parser;
use serde_json::json;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use stencil::cli::Args;
use stencil::config::TemplateFileExtension;
use stencil::error::Error;
use tempfile::NamedTempFile;

fn make_args(args: &[&str]) -> Vec<OsString> {
    let mut res = vec![OsString::from("stencil")];
    res.extend(args.iter().map(OsString::from));
    res
}

#[test]
fn test_basic_args() {
    let args = make_args(&["./skeleton", "./output"]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert_eq!(parsed.url.as_deref(), Some("./skeleton"));
    assert_eq!(parsed.target_path.as_deref(), Some("./output"));
    assert_eq!(parsed.workspace, PathBuf::from("."));
    assert!(!parsed.replace);
    assert!(!parsed.verbose);
    assert!(!parsed.cookiecutter_compat);
}

#[test]
fn test_all_flags() {
    let args = make_args(&[
        "--replace",
        "--verbose",
        "--cookiecutter-compat",
        "--workspace",
        "/work",
        "--set",
        "name=demo",
        "--set",
        "count=2",
        "--copy-without-render",
        ".github",
        "./skeleton",
    ]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert!(parsed.replace);
    assert!(parsed.verbose);
    assert!(parsed.cookiecutter_compat);
    assert_eq!(parsed.workspace, PathBuf::from("/work"));
    assert_eq!(parsed.set, vec!["name=demo", "count=2"]);

    let input = parsed.to_input().unwrap();
    assert_eq!(input.target_path, "./");
    assert_eq!(input.values.get("count"), Some(&json!(2)));
    assert_eq!(input.copy_without_render, Some(vec![".github".to_string()]));
    assert_eq!(input.copy_without_templating, None);
}

#[test]
fn test_short_flags() {
    let args = make_args(&["-r", "-v", "./skeleton"]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert!(parsed.replace);
    assert!(parsed.verbose);
}

#[test]
fn test_template_file_extension_flag() {
    let parsed =
        Args::try_parse_from(make_args(&["./skeleton", "--template-file-extension"])).unwrap();
    assert_eq!(
        parsed.to_input().unwrap().template_file_extension,
        Some(TemplateFileExtension::Enabled(true))
    );

    let parsed =
        Args::try_parse_from(make_args(&["--template-file-extension=.jinja2", "./skeleton"]))
            .unwrap();
    assert_eq!(
        parsed.to_input().unwrap().template_file_extension,
        Some(TemplateFileExtension::Suffix(".jinja2".into()))
    );
}

#[test]
fn test_git_url_skeleton() {
    let args = make_args(&["https://github.com/user/skeleton.git", "./output"]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert_eq!(parsed.url.as_deref(), Some("https://github.com/user/skeleton.git"));
}

#[test]
fn test_missing_url() {
    let err = Args::try_parse_from(make_args(&[])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
}

#[test]
fn test_input_file_without_url() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "targetPath: out").unwrap();

    let path = file.path().display().to_string();
    let parsed = Args::try_parse_from(make_args(&["--input", &path])).unwrap();
    assert!(parsed.url.is_none());
    assert!(matches!(parsed.to_input(), Err(Error::ConfigurationError(_))));
}

#[test]
fn test_too_many_args() {
    let args = make_args(&["./skeleton", "./output", "extra"]);
    assert!(Args::try_parse_from(args).is_err());
}

#[test]
fn test_input_file_is_overridden_by_flags() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "url: ./from-file\ntargetPath: out\nvalues:\n  name: from-file\n  owner: team\n"
    )
    .unwrap();

    let path = file.path().display().to_string();
    let parsed =
        Args::try_parse_from(make_args(&["-i", &path, "--set", "name=from-flag"])).unwrap();
    let input = parsed.to_input().unwrap();

    assert_eq!(input.url, "./from-file");
    assert_eq!(input.target_path, "out");
    assert_eq!(input.values.get("name"), Some(&json!("from-flag")));
    assert_eq!(input.values.get("owner"), Some(&json!("team")));
}
