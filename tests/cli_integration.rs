//! CLI integration tests for plugdesc.
//!
//! These tests run the binary against descriptor trees in temporary
//! directories.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const PDFVIEW_MANIFEST: &str = r#"// swift-tools-version: 5.9
// The swift-tools-version declares the minimum version of Swift required to build this package.

import PackageDescription

let package = Package(
    name: "flutter_pdfview",
    platforms: [
        .iOS("12.0"),
    ],
    products: [
        .library(name: "flutter-pdfview", targets: ["flutter_pdfview"])
    ],
    dependencies: [],
    targets: [
        .target(
            name: "flutter_pdfview",
            dependencies: [],
            resources: [],
            cSettings: [
                .headerSearchPath("include/flutter_pdfview")
            ]
        )
    ]
)
"#;

/// Get the plugdesc binary command, isolated from the user's config.
fn plugdesc(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("plugdesc").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .arg("--no-color");
    cmd
}

/// Create a temporary directory for test packages.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn write(dir: &Path, file: &str, content: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(file), content).unwrap();
}

/// A `Plugin.toml` package with one product and target named after it.
fn toml_package(dir: &Path, name: &str, deps: &str) {
    write(
        dir,
        "Plugin.toml",
        &format!(
            "[package]\nname = \"{name}\"\n\n[platforms]\nios = \"12.0\"\n\n[products.{name}]\ntargets = [\"{name}\"]\n\n[dependencies]\n{deps}\n[targets.{name}]\n"
        ),
    );
}

// ============================================================================
// plugdesc check
// ============================================================================

#[test]
fn test_check_plugin_without_dependencies() {
    let tmp = temp_dir();
    let plugin = tmp.path().join("flutter_pdfview");
    write(&plugin, "Package.swift", PDFVIEW_MANIFEST);

    plugdesc(tmp.path())
        .arg("check")
        .current_dir(&plugin)
        .assert()
        .success()
        .stdout(predicate::str::contains("`flutter_pdfview` is valid"));
}

#[test]
fn test_check_verbose_lists_build_order() {
    let tmp = temp_dir();
    toml_package(&tmp.path().join("app"), "app", "core = { path = \"../core\" }\n");
    toml_package(&tmp.path().join("core"), "core", "");

    plugdesc(tmp.path())
        .args(["check", "app", "--verbose"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 package(s) checked"))
        .stdout(predicate::str::is_match(r"(?m)^  core\n  app$").unwrap());
}

#[test]
fn test_check_missing_path_dependency() {
    let tmp = temp_dir();
    toml_package(&tmp.path().join("app"), "app", "ghost = { path = \"../ghost\" }\n");

    plugdesc(tmp.path())
        .args(["check", "app"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find package `ghost`"))
        .stderr(predicate::str::contains("required by `app`"));
}

#[test]
fn test_check_finds_descriptor_upward() {
    let tmp = temp_dir();
    let plugin = tmp.path().join("flutter_pdfview");
    write(&plugin, "Package.swift", PDFVIEW_MANIFEST);
    fs::create_dir_all(plugin.join("Sources").join("flutter_pdfview")).unwrap();

    plugdesc(tmp.path())
        .arg("check")
        .current_dir(plugin.join("Sources").join("flutter_pdfview"))
        .assert()
        .success();
}

#[test]
fn test_check_missing_required_field() {
    let tmp = temp_dir();
    write(
        tmp.path(),
        "Package.swift",
        "import PackageDescription\n\nlet package = Package(\n    name: \"broken\",\n    platforms: [],\n    products: []\n)\n",
    );

    plugdesc(tmp.path())
        .arg("check")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed"))
        .stderr(predicate::str::contains("targets"));
}

#[test]
fn test_check_missing_product_in_dependency() {
    let tmp = temp_dir();
    write(&tmp.path().join("flutter_pdfview"), "Package.swift", PDFVIEW_MANIFEST);
    write(
        &tmp.path().join("app"),
        "Package.swift",
        r#"import PackageDescription

let package = Package(
    name: "app",
    platforms: [.iOS("12.0")],
    products: [.library(name: "app", targets: ["app"])],
    dependencies: [.package(name: "flutter_pdfview", path: "../flutter_pdfview")],
    targets: [
        .target(name: "app", dependencies: [.product(name: "pdf-kit", package: "flutter_pdfview")])
    ]
)
"#,
    );

    plugdesc(tmp.path())
        .args(["check", "app"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid descriptor for `app`"))
        .stderr(predicate::str::contains("pdf-kit"))
        .stderr(predicate::str::contains("flutter-pdfview"));
}

#[test]
fn test_check_without_descriptor() {
    let tmp = temp_dir();

    plugdesc(tmp.path())
        .arg("check")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find Package.swift or Plugin.toml"));
}

// ============================================================================
// plugdesc resolve / tree
// ============================================================================

#[test]
fn test_resolve_build_order() {
    let tmp = temp_dir();
    toml_package(
        &tmp.path().join("app"),
        "app",
        "pdfview = { path = \"../pdfview\" }\ncore = { path = \"../core\" }\n",
    );
    toml_package(&tmp.path().join("pdfview"), "pdfview", "core = { path = \"../core\" }\n");
    toml_package(&tmp.path().join("core"), "core", "");

    plugdesc(tmp.path())
        .args(["resolve", "app"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)core.*pdfview.*app v0\.0\.0 \(root\)").unwrap());
}

#[test]
fn test_resolve_json_with_units() {
    let tmp = temp_dir();
    toml_package(&tmp.path().join("app"), "app", "core = { path = \"../core\" }\n");
    toml_package(&tmp.path().join("core"), "core", "");

    let output = plugdesc(tmp.path())
        .args(["resolve", "app", "--json", "--units"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["root"], "app");
    assert_eq!(plan["packages"][0]["name"], "core");
    assert_eq!(plan["units"][1]["target"], "app");
}

#[test]
fn test_resolve_cycle() {
    let tmp = temp_dir();
    toml_package(&tmp.path().join("a"), "a", "b = { path = \"../b\" }\n");
    toml_package(&tmp.path().join("b"), "b", "a = { path = \"../a\" }\n");

    plugdesc(tmp.path())
        .args(["resolve", "a"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cycle: a -> b -> a"));
}

#[test]
fn test_resolve_conflicting_locations() {
    let tmp = temp_dir();
    toml_package(
        &tmp.path().join("app"),
        "app",
        "pdfview = { path = \"../pdfview\" }\ncore = { path = \"../core\" }\n",
    );
    toml_package(
        &tmp.path().join("pdfview"),
        "pdfview",
        "core = { path = \"../vendor/core\" }\n",
    );
    toml_package(&tmp.path().join("core"), "core", "");
    toml_package(&tmp.path().join("vendor").join("core"), "core", "");

    plugdesc(tmp.path())
        .args(["resolve", "app"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("version conflict for `core`"));
}

#[test]
fn test_resolve_from_index() {
    let tmp = temp_dir();
    toml_package(
        &tmp.path().join("app"),
        "app",
        "core = { id = \"acme.core\", from = \"1.0.0\" }\n",
    );
    for version in ["1.0.0", "1.3.0", "2.0.0"] {
        toml_package(&tmp.path().join("index").join("core").join(version), "core", "");
    }

    plugdesc(tmp.path())
        .args(["resolve", "app", "--index", "index"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("core v1.3.0"));
}

#[test]
fn test_tree() {
    let tmp = temp_dir();
    toml_package(&tmp.path().join("app"), "app", "core = { path = \"../core\" }\n");
    toml_package(&tmp.path().join("core"), "core", "");

    plugdesc(tmp.path())
        .args(["tree", "app"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout("app v0.0.0\n├── core v0.0.0\n");
}

// ============================================================================
// plugdesc show
// ============================================================================

#[test]
fn test_show_as_toml() {
    let tmp = temp_dir();
    write(tmp.path(), "Package.swift", PDFVIEW_MANIFEST);

    plugdesc(tmp.path())
        .args(["show", "--format", "toml"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("name = \"flutter_pdfview\""))
        .stdout(predicate::str::contains("[targets.flutter_pdfview]"));
}

#[test]
fn test_show_round_trips_swift() {
    let tmp = temp_dir();
    write(tmp.path(), "Package.swift", PDFVIEW_MANIFEST);

    plugdesc(tmp.path())
        .arg("show")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(".headerSearchPath(\"include/flutter_pdfview\")"));
}

// ============================================================================
// plugdesc generate
// ============================================================================

#[test]
fn test_generate_aggregate_package() {
    let tmp = temp_dir();
    let plugin = tmp.path().join("flutter_pdfview");
    write(&plugin, "Package.swift", PDFVIEW_MANIFEST);

    plugdesc(tmp.path())
        .args(["generate", "--plugin", "flutter_pdfview", "--output", "Packages"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote"));

    let generated = tmp
        .path()
        .join("Packages")
        .join("FlutterGeneratedPluginSwiftPackage")
        .join("Package.swift");
    let text = fs::read_to_string(&generated).unwrap();
    assert!(text.contains("//  Generated file. Do not edit."));
    assert!(text.contains(".product(name: \"flutter-pdfview\", package: \"flutter_pdfview\")"));

    // Unchanged input leaves the file alone
    plugdesc(tmp.path())
        .args(["generate", "--plugin", "flutter_pdfview", "--output", "Packages"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));

    // The generated package is itself a valid package
    plugdesc(tmp.path())
        .arg("check")
        .current_dir(generated.parent().unwrap())
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "warning: `FlutterGeneratedPluginSwiftPackage` is a generated package",
        ))
        .stderr(predicate::str::contains("--> "));
}

#[test]
fn test_generate_name_and_platform_override() {
    let tmp = temp_dir();
    write(&tmp.path().join("flutter_pdfview"), "Package.swift", PDFVIEW_MANIFEST);

    plugdesc(tmp.path())
        .args([
            "generate",
            "--plugin",
            "flutter_pdfview",
            "--output",
            "out",
            "--name",
            "AppPlugins",
            "--platform",
            "ios=14.0",
        ])
        .current_dir(tmp.path())
        .assert()
        .success();

    let text = fs::read_to_string(tmp.path().join("out/AppPlugins/Package.swift")).unwrap();
    assert!(text.contains("name: \"AppPlugins\""));
    assert!(text.contains(".iOS(\"14.0\")"));
}

#[test]
fn test_generate_with_broken_plugin_writes_nothing() {
    let tmp = temp_dir();
    write(
        &tmp.path().join("broken"),
        "Package.swift",
        "import PackageDescription\nlet package = Package(name: \"broken\")\n",
    );

    plugdesc(tmp.path())
        .args(["generate", "--plugin", "broken", "--output", "out"])
        .current_dir(tmp.path())
        .assert()
        .failure();

    assert!(!tmp.path().join("out").exists());
}

// ============================================================================
// plugdesc completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = temp_dir();

    plugdesc(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("plugdesc"));
}
